//! Forest trainer
//!
//! Trains `num_trees` trees in confidence-interval groups. Trees inside a
//! group share one outer subsample, which is what makes the
//! bootstrap-of-little-bags variance estimate work; groups are independent
//! and train in parallel. Data and observations are shared read-only across
//! workers, and every group gets its own deterministically seeded sampler.
use crate::data::Matrix;
use crate::errors::GroveError;
use crate::forest::config::ForestConfig;
use crate::forest::forest::Forest;
use crate::observations::Observations;
use crate::prediction::quantile::QuantilePredictionStrategy;
use crate::prediction::regression::RegressionPredictionStrategy;
use crate::prediction::strategy::OptimizedPredictionStrategy;
use crate::relabeling::{
    InstrumentalRelabelingStrategy, NoopRelabelingStrategy, QuantileRelabelingStrategy, RelabelingStrategy,
};
use crate::sampler::RandomSampler;
use crate::splitting::{RegressionSplittingRule, SplittingRule};
use crate::tree::trainer::{TreeOptions, TreeTrainer};
use crate::tree::tree::Tree;
use log::info;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

pub struct ForestTrainer {
    relabeling_strategy: Arc<dyn RelabelingStrategy>,
    splitting_rule: Arc<dyn SplittingRule>,
    prediction_strategy: Option<Arc<dyn OptimizedPredictionStrategy>>,
    config: ForestConfig,
}

impl ForestTrainer {
    /// Assemble a trainer from explicit strategy objects. The configuration
    /// is validated here, once.
    pub fn new(
        relabeling_strategy: Arc<dyn RelabelingStrategy>,
        splitting_rule: Arc<dyn SplittingRule>,
        prediction_strategy: Option<Arc<dyn OptimizedPredictionStrategy>>,
        config: ForestConfig,
    ) -> Result<Self, GroveError> {
        config.validate()?;
        Ok(ForestTrainer {
            relabeling_strategy,
            splitting_rule,
            prediction_strategy,
            config,
        })
    }

    /// A regression forest: outcomes drive the splits directly and each
    /// leaf summarizes its mean outcome.
    pub fn regression(config: ForestConfig) -> Result<Self, GroveError> {
        let alpha = config.alpha;
        Self::new(
            Arc::new(NoopRelabelingStrategy),
            Arc::new(RegressionSplittingRule::new(alpha)),
            Some(Arc::new(RegressionPredictionStrategy::new())),
            config,
        )
    }

    /// A quantile forest: splits are driven by quantile-bin labels and each
    /// leaf summarizes its empirical outcome quantiles.
    pub fn quantile(config: ForestConfig, quantiles: Vec<f64>) -> Result<Self, GroveError> {
        let alpha = config.alpha;
        Self::new(
            Arc::new(QuantileRelabelingStrategy::new(quantiles.clone())),
            Arc::new(RegressionSplittingRule::new(alpha)),
            Some(Arc::new(QuantilePredictionStrategy::new(quantiles))),
            config,
        )
    }

    /// An instrumental forest: splits are driven by residualized
    /// pseudo-outcomes. No leaf summaries are attached; prediction for
    /// instrumental targets needs a treatment-effect prediction strategy
    /// supplied through [`ForestTrainer::new`].
    pub fn instrumental(config: ForestConfig) -> Result<Self, GroveError> {
        let alpha = config.alpha;
        let split_regularization = config.split_regularization;
        Self::new(
            Arc::new(InstrumentalRelabelingStrategy::new(split_regularization)),
            Arc::new(RegressionSplittingRule::new(alpha)),
            None,
            config,
        )
    }

    pub fn train(&self, data: &Matrix<f64>, observations: &Observations) -> Result<Forest, GroveError> {
        let config = &self.config;
        let num_groups = config.num_trees / config.ci_group_size;
        let num_samples = data.rows;

        info!(
            "Training {} trees in {} groups of {}",
            config.num_trees, num_groups, config.ci_group_size
        );
        let start = Instant::now();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads.unwrap_or(0))
            .build()
            .map_err(|e| GroveError::ThreadPool(e.to_string()))?;

        let tree_trainer = TreeTrainer::new(
            self.relabeling_strategy.clone(),
            self.splitting_rule.clone(),
            self.prediction_strategy.clone(),
            TreeOptions {
                mtry: config.mtry,
                min_node_size: config.min_node_size,
                honesty: config.honesty,
                honesty_fraction: config.honesty_fraction,
                deterministic_vars: config.deterministic_vars.clone(),
                no_split_variables: config.no_split_variables.clone(),
                split_select_vars: config.split_select_vars.clone(),
                split_select_weights: config.split_select_weights.clone(),
            },
        );

        // Collected in group-index order, so tree order matches tree index
        // regardless of which worker finishes first.
        let trees: Vec<Tree> = pool
            .install(|| {
                (0..num_groups)
                    .into_par_iter()
                    .map(|group| {
                        let group_seed = config.seed.wrapping_add((group * config.ci_group_size) as u64);
                        let mut sampler = RandomSampler::new(group_seed);
                        self.train_ci_group(&tree_trainer, data, observations, &mut sampler, num_samples)
                    })
                    .collect::<Vec<Vec<Tree>>>()
            })
            .into_iter()
            .flatten()
            .collect();

        info!("Trained {} trees in {:.2?}", trees.len(), start.elapsed());

        Ok(Forest::new(trees, observations.clone(), config.ci_group_size))
    }

    fn train_ci_group(
        &self,
        tree_trainer: &TreeTrainer,
        data: &Matrix<f64>,
        observations: &Observations,
        sampler: &mut RandomSampler,
        num_samples: usize,
    ) -> Vec<Tree> {
        let config = &self.config;
        let mut trees = Vec::with_capacity(config.ci_group_size);

        if config.ci_group_size == 1 {
            let (subsample, _) = sampler.sample(num_samples, config.sample_fraction);
            let mut tree = tree_trainer.train(data, observations, sampler, &subsample);
            tree.set_oob_samples(complement(num_samples, &subsample));
            trees.push(tree);
        } else {
            // The trees of one group bootstrap from a shared outer
            // half-sample; the doubled fraction keeps each tree's effective
            // subsample at sample_fraction of the data.
            let (outer_sample, _) = sampler.sample(num_samples, 0.5);
            for _ in 0..config.ci_group_size {
                let (subsample, _) = sampler.subsample(&outer_sample, config.sample_fraction * 2.0);
                let mut tree = tree_trainer.train(data, observations, sampler, &subsample);
                tree.set_oob_samples(complement(num_samples, &subsample));
                trees.push(tree);
            }
        }
        trees
    }
}

/// The sample ids of `[0, num_samples)` not present in `samples`, ascending.
fn complement(num_samples: usize, samples: &[usize]) -> Vec<usize> {
    let mut in_sample = vec![false; num_samples];
    for &sample in samples {
        in_sample[sample] = true;
    }
    (0..num_samples).filter(|&sample| !in_sample[sample]).collect()
}
