//! Relabeling
//!
//! Strategies that map a candidate node's raw observations into the
//! per-sample pseudo-responses driving the split search. Regression keeps
//! outcomes as-is, quantile forests relabel with quantile-bin indices, and
//! instrumental forests relabel with residualized pseudo-outcomes.
use crate::observations::{Observations, INSTRUMENT, OUTCOME, TREATMENT};
use hashbrown::HashMap;
use log::warn;

/// Pseudo-responses for one candidate node, keyed by sample id. A strategy
/// either labels every sample in the node or returns an empty map.
pub type ResponsesBySample = HashMap<usize, Vec<f64>>;

pub trait RelabelingStrategy: Send + Sync {
    /// Produce a response vector for every sample in `samples`. An empty
    /// map signals that the node should not be split.
    fn relabel(&self, samples: &[usize], observations: &Observations) -> ResponsesBySample;
}

/// Passes outcomes through untouched; the regression forest's relabeling.
pub struct NoopRelabelingStrategy;

impl RelabelingStrategy for NoopRelabelingStrategy {
    fn relabel(&self, samples: &[usize], observations: &Observations) -> ResponsesBySample {
        let mut responses = HashMap::with_capacity(samples.len());
        for &sample in samples {
            responses.insert(sample, observations.get(OUTCOME, sample).to_vec());
        }
        responses
    }
}

/// Relabels each sample with the index of the quantile bin its outcome
/// falls in, computed against the node-local outcome distribution.
pub struct QuantileRelabelingStrategy {
    quantiles: Vec<f64>,
}

impl QuantileRelabelingStrategy {
    pub fn new(quantiles: Vec<f64>) -> Self {
        QuantileRelabelingStrategy { quantiles }
    }
}

impl RelabelingStrategy for QuantileRelabelingStrategy {
    fn relabel(&self, samples: &[usize], observations: &Observations) -> ResponsesBySample {
        if samples.is_empty() {
            return HashMap::new();
        }
        let mut sorted_outcomes: Vec<f64> = samples
            .iter()
            .map(|&sample| observations.get(OUTCOME, sample)[0])
            .collect();
        sorted_outcomes.sort_by(|a, b| a.total_cmp(b));
        let num_samples = sorted_outcomes.len();

        // The outcome value cutoff for each quantile, duplicates removed so
        // ties collapse into one bin boundary.
        let mut quantile_cutoffs: Vec<f64> = self
            .quantiles
            .iter()
            .map(|quantile| {
                let index = ((num_samples as f64 * quantile).ceil() as usize)
                    .saturating_sub(1)
                    .min(num_samples - 1);
                sorted_outcomes[index]
            })
            .collect();
        quantile_cutoffs.dedup();

        let mut responses = HashMap::with_capacity(samples.len());
        for &sample in samples {
            let outcome = observations.get(OUTCOME, sample)[0];
            let bin = quantile_cutoffs.partition_point(|cutoff| *cutoff < outcome);
            responses.insert(sample, vec![bin as f64]);
        }
        responses
    }
}

/// Relabels with residualized pseudo-outcomes for instrumental-variable
/// splits: each sample's centered (regularized) instrument times the
/// residual of its outcome against the node-local treatment effect
/// estimate. With `split_regularization = 0` and treatment used as its own
/// instrument this reduces to the causal-forest relabeling.
pub struct InstrumentalRelabelingStrategy {
    split_regularization: f64,
}

impl InstrumentalRelabelingStrategy {
    pub fn new(split_regularization: f64) -> Self {
        InstrumentalRelabelingStrategy { split_regularization }
    }
}

impl RelabelingStrategy for InstrumentalRelabelingStrategy {
    fn relabel(&self, samples: &[usize], observations: &Observations) -> ResponsesBySample {
        if samples.is_empty() {
            return HashMap::new();
        }
        let reg = self.split_regularization;
        let num_samples = samples.len() as f64;

        let mut total_outcome = 0.0;
        let mut total_treatment = 0.0;
        let mut total_instrument = 0.0;
        for &sample in samples {
            total_outcome += observations.get(OUTCOME, sample)[0];
            total_treatment += observations.get(TREATMENT, sample)[0];
            total_instrument += observations.get(INSTRUMENT, sample)[0];
        }
        let average_outcome = total_outcome / num_samples;
        let average_treatment = total_treatment / num_samples;
        let average_instrument = total_instrument / num_samples;
        let average_regularized_instrument = (1.0 - reg) * average_instrument + reg * average_treatment;

        // Node-local instrumental estimate of the treatment effect.
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for &sample in samples {
            let outcome = observations.get(OUTCOME, sample)[0];
            let treatment = observations.get(TREATMENT, sample)[0];
            let instrument = observations.get(INSTRUMENT, sample)[0];
            let regularized_instrument = (1.0 - reg) * instrument + reg * treatment;
            numerator += (regularized_instrument - average_regularized_instrument) * (outcome - average_outcome);
            denominator +=
                (regularized_instrument - average_regularized_instrument) * (treatment - average_treatment);
        }
        // A vanishing first stage leaves the effect unidentified in this
        // node; signal the trainer not to split.
        if denominator.abs() <= 1.0e-10 {
            warn!(
                "first-stage denominator vanished in a node of {} samples, leaving it unsplit",
                samples.len()
            );
            return HashMap::new();
        }
        let local_average_treatment_effect = numerator / denominator;

        let mut responses = HashMap::with_capacity(samples.len());
        for &sample in samples {
            let outcome = observations.get(OUTCOME, sample)[0];
            let treatment = observations.get(TREATMENT, sample)[0];
            let instrument = observations.get(INSTRUMENT, sample)[0];
            let regularized_instrument = (1.0 - reg) * instrument + reg * treatment;
            let residual =
                (outcome - average_outcome) - local_average_treatment_effect * (treatment - average_treatment);
            responses.insert(
                sample,
                vec![(regularized_instrument - average_regularized_instrument) * residual],
            );
        }
        responses
    }
}
