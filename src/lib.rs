//! # Grove
//!
//! `grove` trains and predicts with generalized random forests: ensembles of
//! honest, recursively-partitioned binary trees whose per-leaf summaries
//! yield point predictions and confidence-interval variance estimates.
//!
//! The moving parts are pluggable. A [`relabeling::RelabelingStrategy`]
//! turns a node's raw observations into the pseudo-responses that drive the
//! split search, a [`splitting::SplittingRule`] picks the split, and an
//! [`prediction::strategy::OptimizedPredictionStrategy`] precomputes leaf
//! summaries at training time and turns their averages into predictions.
//! Regression, quantile, and instrumental wirings ship with the crate.
//!
//! ## Key Features
//!
//! * **Honesty**: each tree chooses its splits on one half of its subsample
//!   and populates its leaves with the disjoint other half.
//! * **Variance estimates**: forests train in small tree groups sharing a
//!   subsample, driving a bootstrap-of-little-bags variance estimate with
//!   objective-Bayes debiasing.
//! * **Parallel and reproducible**: training and prediction run on a
//!   [Rayon](https://docs.rs/rayon) worker pool; per-group samplers are
//!   seeded from the configured seed, so results are identical at any
//!   thread count.
//!
//! ## Quick Start
//!
//! ```rust
//! use grove::{ForestConfig, ForestPredictor, ForestTrainer, Matrix, Observations};
//!
//! // 1. Prepare data: one covariate column over 10 rows (column major).
//! let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
//! let data = Matrix::new(&x, 10, 1);
//! let outcomes: Vec<f64> = x.iter().map(|v| v * 2.0).collect();
//! let observations = Observations::from_outcomes(outcomes);
//!
//! // 2. Configure and train.
//! let config = ForestConfig {
//!     num_trees: 4,
//!     ci_group_size: 2,
//!     mtry: 1,
//!     min_node_size: 1,
//!     ..Default::default()
//! };
//! let trainer = ForestTrainer::regression(config).expect("valid configuration");
//! let forest = trainer.train(&data, &observations).expect("training succeeds");
//!
//! // 3. Predict, with a variance estimate per row.
//! let predictions = ForestPredictor::regression().predict(&forest, &data);
//! assert_eq!(predictions.len(), 10);
//! ```

// Modules
pub mod data;
pub mod errors;
pub mod forest;
pub mod observations;
pub mod prediction;
pub mod relabeling;
pub mod sampler;
pub mod splitting;
pub mod tree;

// Individual classes, and functions
pub use data::{Matrix, RowMajorMatrix};
pub use errors::GroveError;
pub use forest::config::ForestConfig;
pub use forest::forest::Forest;
pub use forest::predictor::ForestPredictor;
pub use forest::trainer::ForestTrainer;
pub use observations::Observations;
pub use prediction::values::{Prediction, PredictionValues};
