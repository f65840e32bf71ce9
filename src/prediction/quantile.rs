//! Quantile prediction strategy
//!
//! Each leaf stores one 1 x k matrix holding the empirical outcome quantiles
//! of its samples at the k requested levels; predictions average these
//! across the leaves a query row landed in, and variance is estimated per
//! quantile dimension.
use crate::data::RowMajorMatrix;
use crate::observations::{Observations, OUTCOME};
use crate::prediction::debias::{debiased_group_variance, BayesDebiaser};
use crate::prediction::strategy::OptimizedPredictionStrategy;
use crate::prediction::values::PredictionValues;

const QUANTILE_TYPE: usize = 0;

#[derive(Debug)]
pub struct QuantilePredictionStrategy {
    quantiles: Vec<f64>,
    bayes_debiaser: BayesDebiaser,
}

impl QuantilePredictionStrategy {
    pub fn new(quantiles: Vec<f64>) -> Self {
        assert!(!quantiles.is_empty());
        QuantilePredictionStrategy {
            quantiles,
            bayes_debiaser: BayesDebiaser,
        }
    }
}

/// Lower empirical quantile of a sorted sample: the value at rank
/// `ceil(q * n)`.
fn empirical_quantile(sorted: &[f64], quantile: f64) -> f64 {
    let index = ((sorted.len() as f64 * quantile).ceil() as usize)
        .saturating_sub(1)
        .min(sorted.len() - 1);
    sorted[index]
}

impl OptimizedPredictionStrategy for QuantilePredictionStrategy {
    fn prediction_length(&self) -> usize {
        self.quantiles.len()
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
            let mut outcomes: Vec<f64> = leaf_node
                .iter()
                .map(|&sample| observations.get(OUTCOME, sample)[0])
                .collect();
            outcomes.sort_by(|a, b| a.total_cmp(b));

            let leaf_quantiles: Vec<f64> = self
                .quantiles
                .iter()
                .map(|&quantile| empirical_quantile(&outcomes, quantile))
                .collect();
            values[node] = vec![RowMajorMatrix::new(leaf_quantiles, 1, self.quantiles.len())];
        }

        PredictionValues::new(values, num_leaves, 1)
    }

    fn predict(&self, average_values: &[RowMajorMatrix<f64>]) -> Vec<f64> {
        average_values[QUANTILE_TYPE].get_row(0).to_vec()
    }

    fn compute_variance(
        &self,
        average_values: &[RowMajorMatrix<f64>],
        leaf_values: &PredictionValues,
        ci_group_size: usize,
    ) -> Vec<f64> {
        (0..self.quantiles.len())
            .map(|dim| {
                let average = *average_values[QUANTILE_TYPE].get(0, dim);
                debiased_group_variance(
                    leaf_values,
                    QUANTILE_TYPE,
                    dim,
                    average,
                    ci_group_size,
                    &self.bayes_debiaser,
                )
            })
            .collect()
    }
}
