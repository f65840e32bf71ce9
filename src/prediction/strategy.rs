use crate::data::RowMajorMatrix;
use crate::observations::Observations;
use crate::prediction::values::PredictionValues;

/// A prediction strategy defines how predictions are computed over query
/// rows.
///
/// An optimized strategy does not predict from a list of neighbor samples
/// and weights. Instead it precomputes summary values for each leaf during
/// training, and at prediction time works from the element-wise average of
/// the summaries of the leaves a query row landed in. This avoids revisiting
/// training samples for every query.
///
/// Strategies are immutable after construction and shared across workers.
pub trait OptimizedPredictionStrategy: Send + Sync {
    /// The number of values in a prediction, e.g. 1 for regression, or the
    /// number of quantiles for quantile forests.
    fn prediction_length(&self) -> usize;

    /// The number of types of precomputed summary matrices stored per leaf.
    fn prediction_value_length(&self) -> usize;

    /// Called at the end of tree construction to precompute a summary for
    /// every non-empty leaf. `leaf_samples` is indexed by node id.
    fn precompute_prediction_values(
        &self,
        leaf_samples: &[Vec<usize>],
        observations: &Observations,
    ) -> PredictionValues;

    /// Compute the point prediction for a single query row.
    ///
    /// * `average_values` - the summaries precomputed during training,
    ///   averaged across all leaves this query row landed in.
    fn predict(&self, average_values: &[RowMajorMatrix<f64>]) -> Vec<f64>;

    /// Compute a variance estimate for a single query row.
    ///
    /// * `average_values` - as in `predict`.
    /// * `leaf_values` - the individual summaries for each leaf this query
    ///   row landed in, one entry per tree; trees that were excluded or hit
    ///   an empty leaf have an empty entry.
    /// * `ci_group_size` - the size of the tree groups used in training,
    ///   needed to separate within-group from between-group variance.
    fn compute_variance(
        &self,
        average_values: &[RowMajorMatrix<f64>],
        leaf_values: &PredictionValues,
        ci_group_size: usize,
    ) -> Vec<f64>;
}
