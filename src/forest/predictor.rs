//! Forest predictor
//!
//! Orchestrates leaf routing and prediction collection. `predict` runs every
//! query row through every tree; `predict_oob` restricts each training row
//! to the trees that never saw it.
use crate::data::Matrix;
use crate::forest::forest::Forest;
use crate::prediction::collector::OptimizedPredictionCollector;
use crate::prediction::quantile::QuantilePredictionStrategy;
use crate::prediction::regression::RegressionPredictionStrategy;
use crate::prediction::strategy::OptimizedPredictionStrategy;
use crate::prediction::values::Prediction;
use rayon::prelude::*;
use std::sync::Arc;

pub struct ForestPredictor {
    strategy: Arc<dyn OptimizedPredictionStrategy>,
}

impl ForestPredictor {
    pub fn new(strategy: Arc<dyn OptimizedPredictionStrategy>) -> Self {
        ForestPredictor { strategy }
    }

    pub fn regression() -> Self {
        ForestPredictor::new(Arc::new(RegressionPredictionStrategy::new()))
    }

    pub fn quantile(quantiles: Vec<f64>) -> Self {
        ForestPredictor::new(Arc::new(QuantilePredictionStrategy::new(quantiles)))
    }

    /// Predict every row of `data`, in row order.
    pub fn predict(&self, forest: &Forest, data: &Matrix<f64>) -> Vec<Prediction> {
        let leaf_nodes_by_tree: Vec<Vec<usize>> = forest
            .get_trees()
            .par_iter()
            .map(|tree| tree.find_leaf_nodes(data, &data.index))
            .collect();

        let collector = OptimizedPredictionCollector::new(self.strategy.clone(), forest.get_ci_group_size());
        collector.collect_predictions(forest, data, &leaf_nodes_by_tree, &[])
    }

    /// Out-of-bag prediction over the training data: each row only consults
    /// the trees whose subsample excluded it.
    pub fn predict_oob(&self, forest: &Forest, data: &Matrix<f64>) -> Vec<Prediction> {
        let leaf_nodes_by_tree: Vec<Vec<usize>> = forest
            .get_trees()
            .par_iter()
            .map(|tree| tree.find_leaf_nodes(data, tree.get_oob_samples()))
            .collect();

        let num_trees = forest.get_trees().len();
        let mut trees_by_sample = vec![vec![false; num_trees]; data.rows];
        for (tree_index, tree) in forest.get_trees().iter().enumerate() {
            for &sample in tree.get_oob_samples() {
                trees_by_sample[sample][tree_index] = true;
            }
        }

        let collector = OptimizedPredictionCollector::new(self.strategy.clone(), forest.get_ci_group_size());
        collector.collect_predictions(forest, data, &leaf_nodes_by_tree, &trees_by_sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::config::ForestConfig;
    use crate::forest::trainer::ForestTrainer;
    use crate::observations::Observations;

    fn train_regression(num_trees: usize, ci_group_size: usize, x: &[f64], rows: usize) -> Forest {
        let data = Matrix::new(x, rows, 1);
        let outcomes: Vec<f64> = (0..rows).map(|i| if x[i] <= 5.0 { 1.0 } else { 10.0 }).collect();
        let observations = Observations::from_outcomes(outcomes);
        let config = ForestConfig {
            num_trees,
            ci_group_size,
            mtry: 1,
            min_node_size: 1,
            sample_fraction: 0.5,
            seed: 7,
            ..Default::default()
        };
        ForestTrainer::regression(config)
            .unwrap()
            .train(&data, &observations)
            .unwrap()
    }

    #[test]
    fn test_prediction_shape_and_order() {
        let x: Vec<f64> = (0..30).map(|i| i as f64 / 3.0).collect();
        let forest = train_regression(4, 2, &x, 30);
        let data = Matrix::new(&x, 30, 1);
        let predictions = ForestPredictor::regression().predict(&forest, &data);
        assert_eq!(predictions.len(), 30);
        for prediction in &predictions {
            assert_eq!(prediction.size(), 1);
        }
    }

    #[test]
    fn test_predictions_track_step_function() {
        let x: Vec<f64> = (0..30).map(|i| i as f64 / 3.0).collect();
        let forest = train_regression(10, 2, &x, 30);
        let data = Matrix::new(&x, 30, 1);
        let predictions = ForestPredictor::regression().predict(&forest, &data);
        // Rows deep inside each plateau should predict close to its level.
        let low = predictions[0].get_predictions()[0];
        let high = predictions[29].get_predictions()[0];
        assert!(low.is_nan() || low < 5.5);
        assert!(high.is_nan() || high > 5.5);
    }

    #[test]
    fn test_variance_present_and_non_negative_with_groups() {
        let x: Vec<f64> = (0..40).map(|i| i as f64 / 4.0).collect();
        let forest = train_regression(20, 2, &x, 40);
        let data = Matrix::new(&x, 40, 1);
        let predictions = ForestPredictor::regression().predict(&forest, &data);
        for prediction in &predictions {
            if prediction.get_predictions()[0].is_nan() {
                continue;
            }
            let variance = prediction.get_variance_estimates().unwrap();
            assert_eq!(variance.len(), 1);
            assert!(variance[0].is_nan() || variance[0] >= 0.0);
        }
    }

    #[test]
    fn test_no_variance_without_groups() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 / 2.0).collect();
        let forest = train_regression(5, 1, &x, 20);
        let data = Matrix::new(&x, 20, 1);
        let predictions = ForestPredictor::regression().predict(&forest, &data);
        for prediction in &predictions {
            assert!(prediction.get_variance_estimates().is_none());
        }
    }

    #[test]
    fn test_oob_prediction_covers_every_row() {
        let x: Vec<f64> = (0..24).map(|i| i as f64 / 2.0).collect();
        let forest = train_regression(8, 2, &x, 24);
        let data = Matrix::new(&x, 24, 1);
        let predictions = ForestPredictor::regression().predict_oob(&forest, &data);
        assert_eq!(predictions.len(), 24);
        // A row in no tree's OOB set gets the NaN placeholder; any other row
        // gets a real scalar. Both have the strategy's length.
        for prediction in &predictions {
            assert_eq!(prediction.size(), 1);
        }
    }

    #[test]
    fn test_fully_masked_row_yields_nan() {
        let x: Vec<f64> = (0..24).map(|i| i as f64 / 2.0).collect();
        let forest = train_regression(4, 2, &x, 24);
        // Rebuild the forest with cleared OOB lists, so the OOB mask
        // excludes every tree for every row.
        let mut trees = forest.get_trees().to_vec();
        for tree in trees.iter_mut() {
            tree.set_oob_samples(Vec::new());
        }
        let forest = Forest::new(trees, forest.get_observations().clone(), forest.get_ci_group_size());

        let data = Matrix::new(&x, 24, 1);
        let predictions = ForestPredictor::regression().predict_oob(&forest, &data);
        for prediction in &predictions {
            assert_eq!(prediction.size(), 1);
            assert!(prediction.get_predictions()[0].is_nan());
            assert!(prediction.get_variance_estimates().is_none());
        }
    }

    #[test]
    fn test_quantile_prediction_shape() {
        let x: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let data = Matrix::new(&x, 30, 1);
        let outcomes: Vec<f64> = (0..30).map(|i| i as f64 * 0.5).collect();
        let observations = Observations::from_outcomes(outcomes);
        let quantiles = vec![0.25, 0.5, 0.75];
        let config = ForestConfig {
            num_trees: 6,
            ci_group_size: 2,
            mtry: 1,
            min_node_size: 2,
            sample_fraction: 0.5,
            seed: 3,
            ..Default::default()
        };
        let forest = ForestTrainer::quantile(config, quantiles.clone())
            .unwrap()
            .train(&data, &observations)
            .unwrap();
        let predictions = ForestPredictor::quantile(quantiles).predict(&forest, &data);
        for prediction in &predictions {
            assert_eq!(prediction.size(), 3);
            let p = prediction.get_predictions();
            if !p[0].is_nan() {
                // Averaged leaf quantiles stay ordered.
                assert!(p[0] <= p[1] && p[1] <= p[2]);
            }
        }
    }
}
