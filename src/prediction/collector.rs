//! Optimized prediction collector
//!
//! Aggregates the per-leaf summaries of every tree a query row reached into
//! one averaged summary, then hands that to the prediction strategy for the
//! point estimate and, when the forest was trained in confidence-interval
//! groups, the variance estimate.
use crate::data::{Matrix, RowMajorMatrix};
use crate::forest::forest::Forest;
use crate::prediction::strategy::OptimizedPredictionStrategy;
use crate::prediction::values::{Prediction, PredictionValues};
use rayon::prelude::*;
use std::sync::Arc;

pub struct OptimizedPredictionCollector {
    strategy: Arc<dyn OptimizedPredictionStrategy>,
    ci_group_size: usize,
}

impl OptimizedPredictionCollector {
    pub fn new(strategy: Arc<dyn OptimizedPredictionStrategy>, ci_group_size: usize) -> Self {
        OptimizedPredictionCollector {
            strategy,
            ci_group_size,
        }
    }

    /// Collect one prediction per query row, in query-row order.
    ///
    /// * `leaf_nodes_by_tree` - for each tree, the leaf node reached by each
    ///   query row.
    /// * `trees_by_sample` - optional inclusion mask `[row][tree]`; an empty
    ///   mask includes every tree. Out-of-bag prediction passes the OOB mask
    ///   here.
    pub fn collect_predictions(
        &self,
        forest: &Forest,
        prediction_data: &Matrix<f64>,
        leaf_nodes_by_tree: &[Vec<usize>],
        trees_by_sample: &[Vec<bool>],
    ) -> Vec<Prediction> {
        prediction_data
            .index
            .par_iter()
            .map(|&sample| self.collect_prediction(forest, sample, leaf_nodes_by_tree, trees_by_sample))
            .collect()
    }

    fn collect_prediction(
        &self,
        forest: &Forest,
        sample: usize,
        leaf_nodes_by_tree: &[Vec<usize>],
        trees_by_sample: &[Vec<bool>],
    ) -> Prediction {
        let num_trees = forest.get_trees().len();

        let mut combined_average: Vec<RowMajorMatrix<f64>> = Vec::new();
        let mut leaf_values: Vec<Vec<RowMajorMatrix<f64>>> = if self.ci_group_size > 1 {
            vec![Vec::new(); num_trees]
        } else {
            Vec::new()
        };

        let mut num_leaves = 0_usize;
        for (tree_index, tree) in forest.get_trees().iter().enumerate() {
            if !trees_by_sample.is_empty() && !trees_by_sample[sample][tree_index] {
                continue;
            }
            let node = leaf_nodes_by_tree[tree_index][sample];
            let prediction_values = tree.get_prediction_values();
            if prediction_values.empty(node) {
                continue;
            }

            num_leaves += 1;
            add_prediction_values(node, prediction_values, &mut combined_average);
            if self.ci_group_size > 1 {
                leaf_values[tree_index] = prediction_values.get_values(node).to_vec();
            }
        }

        // A row that hit no populated leaf gets placeholder predictions.
        // This can only occur when honesty empties leaves or a mask excludes
        // every tree, and is expected to be rare.
        if num_leaves == 0 {
            return Prediction::new(vec![f64::NAN; self.strategy.prediction_length()]);
        }

        normalize_prediction_values(num_leaves, &mut combined_average);

        let point_prediction = self.strategy.predict(&combined_average);
        assert_eq!(
            point_prediction.len(),
            self.strategy.prediction_length(),
            "prediction for sample {} did not have the expected length",
            sample
        );

        if self.ci_group_size > 1 {
            let leaf_values =
                PredictionValues::new(leaf_values, num_trees, self.strategy.prediction_value_length());
            let variance_estimate =
                self.strategy
                    .compute_variance(&combined_average, &leaf_values, self.ci_group_size);
            Prediction::with_variance(point_prediction, variance_estimate)
        } else {
            Prediction::new(point_prediction)
        }
    }
}

fn add_prediction_values(
    node: usize,
    prediction_values: &PredictionValues,
    combined_average: &mut Vec<RowMajorMatrix<f64>>,
) {
    // Size the accumulators off the first contributing leaf.
    if combined_average.is_empty() {
        for value_type in 0..prediction_values.get_num_types() {
            let prototype = prediction_values.get(node, value_type);
            combined_average.push(RowMajorMatrix::zeros(prototype.rows, prototype.cols));
        }
    }
    for value_type in 0..prediction_values.get_num_types() {
        combined_average[value_type].add_assign(prediction_values.get(node, value_type));
    }
}

fn normalize_prediction_values(num_leaves: usize, combined_average: &mut [RowMajorMatrix<f64>]) {
    for value in combined_average.iter_mut() {
        value.divide(num_leaves as f64);
    }
}
