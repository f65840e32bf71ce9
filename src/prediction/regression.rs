//! Regression prediction strategy
//!
//! Each leaf stores a single 1x1 matrix holding the mean outcome of its
//! samples; a prediction is the average of those means over the leaves a
//! query row landed in.
use crate::data::RowMajorMatrix;
use crate::observations::{Observations, OUTCOME};
use crate::prediction::debias::{debiased_group_variance, BayesDebiaser};
use crate::prediction::strategy::OptimizedPredictionStrategy;
use crate::prediction::values::PredictionValues;

// Index of the mean-outcome matrix among the stored summary types.
const OUTCOME_TYPE: usize = 0;

#[derive(Debug, Default)]
pub struct RegressionPredictionStrategy {
    bayes_debiaser: BayesDebiaser,
}

impl RegressionPredictionStrategy {
    pub fn new() -> Self {
        RegressionPredictionStrategy::default()
    }
}

impl OptimizedPredictionStrategy for RegressionPredictionStrategy {
    fn prediction_length(&self) -> usize {
        1
    }

    fn prediction_value_length(&self) -> usize {
        1
    }

    fn precompute_prediction_values(
        &self,
        leaf_samples: &[Vec<usize>],
        observations: &Observations,
    ) -> PredictionValues {
        let num_leaves = leaf_samples.len();
        let mut values: Vec<Vec<RowMajorMatrix<f64>>> = vec![Vec::new(); num_leaves];

        for (node, leaf_node) in leaf_samples.iter().enumerate() {
            if leaf_node.is_empty() {
                continue;
            }
            let mut average = 0.0;
            for &sample in leaf_node {
                average += observations.get(OUTCOME, sample)[0];
            }
            average /= leaf_node.len() as f64;
            values[node] = vec![RowMajorMatrix::new(vec![average], 1, 1)];
        }

        PredictionValues::new(values, num_leaves, 1)
    }

    fn predict(&self, average_values: &[RowMajorMatrix<f64>]) -> Vec<f64> {
        vec![*average_values[OUTCOME_TYPE].get(0, 0)]
    }

    fn compute_variance(
        &self,
        average_values: &[RowMajorMatrix<f64>],
        leaf_values: &PredictionValues,
        ci_group_size: usize,
    ) -> Vec<f64> {
        let average_outcome = *average_values[OUTCOME_TYPE].get(0, 0);
        vec![debiased_group_variance(
            leaf_values,
            OUTCOME_TYPE,
            0,
            average_outcome,
            ci_group_size,
            &self.bayes_debiaser,
        )]
    }
}
