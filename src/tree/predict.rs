use super::tree::Tree;
use crate::data::Matrix;

impl Tree {
    /// Route each listed sample from the root to a leaf.
    ///
    /// Returns a vector indexed by sample id over all rows of `data`;
    /// entries for samples not listed stay 0 and must only be read under an
    /// inclusion mask. A NaN cell fails the `<=` comparison and is routed to
    /// the right child, the same side the split search accounted it to.
    pub fn find_leaf_nodes(&self, data: &Matrix<f64>, samples: &[usize]) -> Vec<usize> {
        let mut leaf_nodes = vec![0; data.rows];
        for &sample in samples {
            let mut node = self.root_node;
            while self.split_values[node] >= 0.0 {
                node = if *data.get(sample, self.split_vars[node]) <= self.split_values[node] {
                    self.left_children[node]
                } else {
                    self.right_children[node]
                };
            }
            leaf_nodes[sample] = node;
        }
        leaf_nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(
            vec![1, 0, 0],
            vec![2, 0, 0],
            vec![0, 0, 0],
            vec![0.5, -1.0, -1.0],
            vec![Vec::new(), Vec::new(), Vec::new()],
        )
    }

    #[test]
    fn test_routes_on_threshold() {
        let x = vec![0.2, 0.5, 0.7];
        let data = Matrix::new(&x, 3, 1);
        let leaf_nodes = stump().find_leaf_nodes(&data, &[0, 1, 2]);
        // The threshold itself goes left.
        assert_eq!(leaf_nodes, vec![1, 1, 2]);
    }

    #[test]
    fn test_nan_routes_right() {
        let x = vec![f64::NAN];
        let data = Matrix::new(&x, 1, 1);
        let leaf_nodes = stump().find_leaf_nodes(&data, &[0]);
        assert_eq!(leaf_nodes, vec![2]);
    }

    #[test]
    fn test_unlisted_samples_left_untouched() {
        let x = vec![0.9, 0.9];
        let data = Matrix::new(&x, 2, 1);
        let leaf_nodes = stump().find_leaf_nodes(&data, &[1]);
        assert_eq!(leaf_nodes[0], 0);
        assert_eq!(leaf_nodes[1], 2);
    }

    #[test]
    fn test_deeper_routing() {
        // Root splits var 0 at 0; node 2 splits var 1 at 10.
        let tree = Tree::new(
            vec![1, 0, 3, 0, 0],
            vec![2, 0, 4, 0, 0],
            vec![0, 0, 1, 0, 0],
            vec![0.0, -1.0, 10.0, -1.0, -1.0],
            vec![Vec::new(); 5],
        );
        let x = vec![
            -1.0, 1.0, 1.0, // var 0
            0.0, 5.0, 25.0, // var 1
        ];
        let data = Matrix::new(&x, 3, 2);
        assert_eq!(tree.find_leaf_nodes(&data, &[0, 1, 2]), vec![1, 3, 4]);
    }
}
