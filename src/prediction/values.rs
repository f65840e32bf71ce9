use crate::data::RowMajorMatrix;
use serde::{Deserialize, Serialize};

/// The per-leaf summary matrices precomputed at training time, indexed by
/// node id. A node without a summary (internal node, or a leaf emptied by
/// honest repopulation) has an empty entry that prediction skips over.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionValues {
    values: Vec<Vec<RowMajorMatrix<f64>>>,
    num_nodes: usize,
    num_types: usize,
}

impl PredictionValues {
    pub fn new(values: Vec<Vec<RowMajorMatrix<f64>>>, num_nodes: usize, num_types: usize) -> Self {
        assert_eq!(values.len(), num_nodes);
        for node_values in values.iter() {
            assert!(node_values.is_empty() || node_values.len() == num_types);
        }
        PredictionValues {
            values,
            num_nodes,
            num_types,
        }
    }

    /// True when no summary is stored for this node.
    pub fn empty(&self, node: usize) -> bool {
        node >= self.values.len() || self.values[node].is_empty()
    }

    pub fn get(&self, node: usize, value_type: usize) -> &RowMajorMatrix<f64> {
        &self.values[node][value_type]
    }

    pub fn get_values(&self, node: usize) -> &[RowMajorMatrix<f64>] {
        &self.values[node]
    }

    pub fn get_num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn get_num_types(&self) -> usize {
        self.num_types
    }
}

/// A point prediction for one query row, with a variance estimate when the
/// forest was trained in confidence-interval groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    predictions: Vec<f64>,
    variance_estimates: Option<Vec<f64>>,
}

impl Prediction {
    pub fn new(predictions: Vec<f64>) -> Self {
        Prediction {
            predictions,
            variance_estimates: None,
        }
    }

    pub fn with_variance(predictions: Vec<f64>, variance_estimates: Vec<f64>) -> Self {
        Prediction {
            predictions,
            variance_estimates: Some(variance_estimates),
        }
    }

    pub fn size(&self) -> usize {
        self.predictions.len()
    }

    pub fn get_predictions(&self) -> &[f64] {
        &self.predictions
    }

    pub fn get_variance_estimates(&self) -> Option<&[f64]> {
        self.variance_estimates.as_deref()
    }
}
