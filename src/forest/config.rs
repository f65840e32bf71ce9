//! Forest Configuration
//!
//! The configuration record consumed by the forest trainer, with serde
//! defaults so partial configurations deserialize cleanly, and validation
//! performed once at trainer construction.
use crate::errors::GroveError;
use serde::{Deserialize, Serialize};

fn default_num_trees() -> usize {
    100
}
fn default_ci_group_size() -> usize {
    2
}
fn default_mtry() -> usize {
    5
}
fn default_min_node_size() -> usize {
    5
}
fn default_honesty() -> bool {
    true
}
fn default_honesty_fraction() -> f64 {
    0.5
}
fn default_sample_fraction() -> f64 {
    0.5
}
fn default_alpha() -> f64 {
    0.05
}
fn default_seed() -> u64 {
    42
}

/// Training configuration for a forest.
///
/// * `num_trees` - Number of trees to train; must be a multiple of
///   `ci_group_size`.
/// * `ci_group_size` - Trees per confidence-interval group. Groups share an
///   outer subsample and drive the bootstrap-of-little-bags variance
///   estimate; a group size of 1 disables variance estimation.
/// * `mtry` - Mean of the Poisson draw determining how many candidate split
///   variables are considered at each node.
/// * `min_node_size` - A node with this many samples or fewer is terminal.
/// * `honesty` - Split-selection and leaf-population use disjoint halves of
///   each tree's subsample.
/// * `honesty_fraction` - Fraction of a tree's subsample used to choose
///   splits when honesty is on.
/// * `sample_fraction` - Fraction of the data subsampled per tree.
/// * `deterministic_vars` - Variables always included among the split
///   candidates.
/// * `no_split_variables` - Variables never offered as split candidates,
///   e.g. columns holding outcomes or treatments.
/// * `split_select_vars` / `split_select_weights` - Optional weighted
///   candidate-variable pool used in place of uniform draws.
/// * `alpha` - Fraction of a node's samples each child must retain.
/// * `split_regularization` - Instrument regularization used by the
///   instrumental relabeling strategy.
/// * `seed` - Base seed; per-group samplers derive from it deterministically.
/// * `num_threads` - Worker threads for training and prediction
///   (None = all cores).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    #[serde(default = "default_num_trees")]
    pub num_trees: usize,
    #[serde(default = "default_ci_group_size")]
    pub ci_group_size: usize,
    #[serde(default = "default_mtry")]
    pub mtry: usize,
    #[serde(default = "default_min_node_size")]
    pub min_node_size: usize,
    #[serde(default = "default_honesty")]
    pub honesty: bool,
    #[serde(default = "default_honesty_fraction")]
    pub honesty_fraction: f64,
    #[serde(default = "default_sample_fraction")]
    pub sample_fraction: f64,
    #[serde(default)]
    pub deterministic_vars: Vec<usize>,
    #[serde(default)]
    pub no_split_variables: Vec<usize>,
    #[serde(default)]
    pub split_select_vars: Vec<usize>,
    #[serde(default)]
    pub split_select_weights: Vec<f64>,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default)]
    pub split_regularization: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub num_threads: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        serde_json::from_str("{}").expect("empty config deserializes from defaults")
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<(), GroveError> {
        if self.num_trees == 0 {
            return Err(GroveError::InvalidParameter(
                "num_trees".to_string(),
                "a positive tree count".to_string(),
                self.num_trees.to_string(),
            ));
        }
        if self.ci_group_size == 0 {
            return Err(GroveError::InvalidParameter(
                "ci_group_size".to_string(),
                "a group size of at least 1".to_string(),
                self.ci_group_size.to_string(),
            ));
        }
        if self.num_trees % self.ci_group_size != 0 {
            return Err(GroveError::InvalidParameter(
                "num_trees".to_string(),
                format!("a multiple of ci_group_size ({})", self.ci_group_size),
                self.num_trees.to_string(),
            ));
        }
        if self.mtry == 0 {
            return Err(GroveError::InvalidParameter(
                "mtry".to_string(),
                "a positive candidate-variable count".to_string(),
                self.mtry.to_string(),
            ));
        }
        if !(self.honesty_fraction > 0.0 && self.honesty_fraction < 1.0) {
            return Err(GroveError::InvalidParameter(
                "honesty_fraction".to_string(),
                "a fraction strictly between 0 and 1".to_string(),
                self.honesty_fraction.to_string(),
            ));
        }
        if !(self.sample_fraction > 0.0 && self.sample_fraction <= 1.0) {
            return Err(GroveError::InvalidParameter(
                "sample_fraction".to_string(),
                "a fraction in (0, 1]".to_string(),
                self.sample_fraction.to_string(),
            ));
        }
        // Grouped trees subsample from a shared half of the data.
        if self.ci_group_size > 1 && self.sample_fraction > 0.5 {
            return Err(GroveError::InvalidParameter(
                "sample_fraction".to_string(),
                "at most 0.5 when ci_group_size > 1".to_string(),
                self.sample_fraction.to_string(),
            ));
        }
        if !(self.alpha >= 0.0 && self.alpha < 0.5) {
            return Err(GroveError::InvalidParameter(
                "alpha".to_string(),
                "a child-size fraction in [0, 0.5)".to_string(),
                self.alpha.to_string(),
            ));
        }
        if let Some(var) = self
            .deterministic_vars
            .iter()
            .find(|v| self.no_split_variables.contains(v))
        {
            return Err(GroveError::InvalidParameter(
                "deterministic_vars".to_string(),
                "no overlap with no_split_variables".to_string(),
                format!("variable {} present in both", var),
            ));
        }
        if !self.split_select_weights.is_empty()
            && self.split_select_weights.len() != self.split_select_vars.len()
        {
            return Err(GroveError::InvalidParameter(
                "split_select_weights".to_string(),
                format!("one weight per split_select_var ({})", self.split_select_vars.len()),
                self.split_select_weights.len().to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ForestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.honesty_fraction, 0.5);
        assert!(config.honesty);
    }

    #[test]
    fn test_partial_config_deserializes() {
        let config: ForestConfig = serde_json::from_str(r#"{"num_trees": 10, "ci_group_size": 1}"#).unwrap();
        assert_eq!(config.num_trees, 10);
        assert_eq!(config.min_node_size, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_mtry_rejected() {
        let config = ForestConfig {
            mtry: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ci_group_size_rejected() {
        let config = ForestConfig {
            ci_group_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_group_size_must_divide_num_trees() {
        let config = ForestConfig {
            num_trees: 5,
            ci_group_size: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_grouped_sample_fraction_capped() {
        let config = ForestConfig {
            sample_fraction: 0.8,
            ci_group_size: 2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = ForestConfig {
            sample_fraction: 0.8,
            ci_group_size: 1,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_conflicting_variable_sets_rejected() {
        let config = ForestConfig {
            deterministic_vars: vec![1, 3],
            no_split_variables: vec![3],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
