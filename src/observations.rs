//! Observations
//!
//! The read-only table of outcome-role vectors attached to a forest. Each
//! role (outcome, treatment, instrument) maps to a `num_samples x d` matrix;
//! forest kinds that do not use a role simply never store it.
use crate::data::RowMajorMatrix;
use serde::{Deserialize, Serialize};

/// Index of the outcome role.
pub const OUTCOME: usize = 0;
/// Index of the treatment role.
pub const TREATMENT: usize = 1;
/// Index of the instrument role.
pub const INSTRUMENT: usize = 2;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Observations {
    observations_by_type: Vec<RowMajorMatrix<f64>>,
    num_samples: usize,
}

impl Observations {
    /// Build an observation table from per-role matrices. Every present
    /// role matrix must have `num_samples` rows; trailing roles may be
    /// omitted entirely.
    pub fn new(observations_by_type: Vec<RowMajorMatrix<f64>>, num_samples: usize) -> Self {
        for matrix in observations_by_type.iter() {
            assert_eq!(matrix.rows, num_samples);
        }
        Observations {
            observations_by_type,
            num_samples,
        }
    }

    /// An outcome-only table, the common case for regression and quantile
    /// forests.
    pub fn from_outcomes(outcomes: Vec<f64>) -> Self {
        let num_samples = outcomes.len();
        Observations::new(vec![RowMajorMatrix::new(outcomes, num_samples, 1)], num_samples)
    }

    /// Get the observation vector of one role for one sample.
    ///
    /// Asking for a role that was never stored is a caller bug.
    pub fn get(&self, role: usize, sample: usize) -> &[f64] {
        assert!(
            self.has(role),
            "observation role {} requested but not present in this table",
            role
        );
        self.observations_by_type[role].get_row(sample)
    }

    /// Whether a role is present in this table.
    pub fn has(&self, role: usize) -> bool {
        role < self.observations_by_type.len() && self.observations_by_type[role].rows > 0
    }

    pub fn get_num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn get_observations_by_type(&self) -> &[RowMajorMatrix<f64>] {
        &self.observations_by_type
    }
}
