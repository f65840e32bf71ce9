use crate::prediction::values::PredictionValues;
use serde::{Deserialize, Serialize};

/// A trained decision tree, stored as parallel arrays over dense node ids
/// rather than pointer-linked nodes.
///
/// Node 0 is the root. An internal node carries a split variable and a
/// threshold `>= 0`; a terminal node carries the sentinel split value `-1.0`
/// and child ids of 0. Children are allocated after their parent, so child
/// ids strictly exceed the parent's id and the arrays read in construction
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub root_node: usize,
    pub left_children: Vec<usize>,
    pub right_children: Vec<usize>,
    pub split_vars: Vec<usize>,
    pub split_values: Vec<f64>,
    /// Sample ids residing in each node; non-empty only for leaves.
    pub leaf_samples: Vec<Vec<usize>>,
    /// Sample ids withheld from this tree's training subsample.
    pub oob_samples: Vec<usize>,
    prediction_values: PredictionValues,
}

impl Tree {
    pub fn new(
        left_children: Vec<usize>,
        right_children: Vec<usize>,
        split_vars: Vec<usize>,
        split_values: Vec<f64>,
        leaf_samples: Vec<Vec<usize>>,
    ) -> Self {
        Tree {
            root_node: 0,
            left_children,
            right_children,
            split_vars,
            split_values,
            leaf_samples,
            oob_samples: Vec::new(),
            prediction_values: PredictionValues::default(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.split_values.len()
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        self.split_values[node] < 0.0
    }

    pub fn get_oob_samples(&self) -> &[usize] {
        &self.oob_samples
    }

    pub fn set_oob_samples(&mut self, oob_samples: Vec<usize>) {
        self.oob_samples = oob_samples;
    }

    pub fn get_prediction_values(&self) -> &PredictionValues {
        &self.prediction_values
    }

    /// Attach the precomputed leaf summaries. Called once, at the end of
    /// tree construction.
    pub fn set_prediction_values(&mut self, prediction_values: PredictionValues) {
        self.prediction_values = prediction_values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A stump splitting variable 0 at 0.5: node 0 -> leaves 1 and 2.
    fn stump() -> Tree {
        Tree::new(
            vec![1, 0, 0],
            vec![2, 0, 0],
            vec![0, 0, 0],
            vec![0.5, -1.0, -1.0],
            vec![Vec::new(), vec![0], vec![1]],
        )
    }

    #[test]
    fn test_leaf_detection() {
        let tree = stump();
        assert!(!tree.is_leaf(0));
        assert!(tree.is_leaf(1));
        assert!(tree.is_leaf(2));
        assert_eq!(tree.num_nodes(), 3);
    }

    #[test]
    fn test_child_ids_exceed_parent() {
        let tree = stump();
        for node in 0..tree.num_nodes() {
            if !tree.is_leaf(node) {
                assert!(tree.left_children[node] > node);
                assert!(tree.right_children[node] > node);
            }
        }
    }
}
