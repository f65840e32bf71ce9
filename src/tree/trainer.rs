//! Tree trainer
//!
//! The honest recursive-partitioning algorithm. A tree is grown over a
//! worklist of open node ids: each node either becomes terminal or splits
//! its samples into two freshly allocated children. With honesty enabled,
//! splits are chosen on one half of the tree's subsample and the leaves are
//! repopulated afterwards with the held-out half.
use super::tree::Tree;
use crate::data::Matrix;
use crate::observations::{Observations, OUTCOME};
use crate::prediction::strategy::OptimizedPredictionStrategy;
use crate::relabeling::RelabelingStrategy;
use crate::sampler::RandomSampler;
use crate::splitting::SplittingRule;
use std::sync::Arc;

/// Per-tree knobs, extracted from the forest configuration.
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub mtry: usize,
    pub min_node_size: usize,
    pub honesty: bool,
    pub honesty_fraction: f64,
    pub deterministic_vars: Vec<usize>,
    pub no_split_variables: Vec<usize>,
    pub split_select_vars: Vec<usize>,
    pub split_select_weights: Vec<f64>,
}

pub struct TreeTrainer {
    relabeling_strategy: Arc<dyn RelabelingStrategy>,
    splitting_rule: Arc<dyn SplittingRule>,
    prediction_strategy: Option<Arc<dyn OptimizedPredictionStrategy>>,
    options: TreeOptions,
}

impl TreeTrainer {
    pub fn new(
        relabeling_strategy: Arc<dyn RelabelingStrategy>,
        splitting_rule: Arc<dyn SplittingRule>,
        prediction_strategy: Option<Arc<dyn OptimizedPredictionStrategy>>,
        options: TreeOptions,
    ) -> Self {
        TreeTrainer {
            relabeling_strategy,
            splitting_rule,
            prediction_strategy,
            options,
        }
    }

    /// Grow one tree over `samples`, the tree's training subsample.
    pub fn train(
        &self,
        data: &Matrix<f64>,
        observations: &Observations,
        sampler: &mut RandomSampler,
        samples: &[usize],
    ) -> Tree {
        let mut left_children = Vec::new();
        let mut right_children = Vec::new();
        let mut split_vars = Vec::new();
        let mut split_values = Vec::new();
        let mut nodes: Vec<Vec<usize>> = Vec::new();
        create_empty_node(
            &mut left_children,
            &mut right_children,
            &mut split_vars,
            &mut split_values,
            &mut nodes,
        );

        let new_leaf_samples = if self.options.honesty {
            let (split_samples, leaf_samples) = sampler.subsample(samples, self.options.honesty_fraction);
            nodes[0] = split_samples;
            leaf_samples
        } else {
            nodes[0] = samples.to_vec();
            Vec::new()
        };

        let mut num_open_nodes = 1;
        let mut i = 0;
        while num_open_nodes > 0 {
            let is_leaf_node = self.split_node(
                i,
                data,
                observations,
                sampler,
                &mut left_children,
                &mut right_children,
                &mut split_vars,
                &mut split_values,
                &mut nodes,
            );
            if is_leaf_node {
                num_open_nodes -= 1;
            } else {
                num_open_nodes += 1;
            }
            i += 1;
        }

        let mut tree = Tree::new(left_children, right_children, split_vars, split_values, nodes);

        if !new_leaf_samples.is_empty() {
            repopulate_leaf_nodes(&mut tree, data, &new_leaf_samples);
        }

        if let Some(strategy) = &self.prediction_strategy {
            let prediction_values = strategy.precompute_prediction_values(&tree.leaf_samples, observations);
            tree.set_prediction_values(prediction_values);
        }

        tree
    }

    /// Attempt to split one node. Returns true when the node is terminal;
    /// otherwise two children have been allocated and the node's samples
    /// moved into them.
    #[allow(clippy::too_many_arguments)]
    fn split_node(
        &self,
        node: usize,
        data: &Matrix<f64>,
        observations: &Observations,
        sampler: &mut RandomSampler,
        left_children: &mut Vec<usize>,
        right_children: &mut Vec<usize>,
        split_vars: &mut Vec<usize>,
        split_values: &mut Vec<f64>,
        nodes: &mut Vec<Vec<usize>>,
    ) -> bool {
        // Select the random subset of variables to possibly split at.
        let possible_split_vars = self.create_split_variable_subset(sampler, data);

        let stop = self.split_node_internal(
            node,
            data,
            observations,
            &possible_split_vars,
            split_vars,
            split_values,
            nodes,
        );
        if stop {
            return true;
        }

        let split_var = split_vars[node];
        let split_value = split_values[node];

        // Children are appended after the parent, keeping node ids monotone.
        let left_child_node = nodes.len();
        left_children[node] = left_child_node;
        create_empty_node(left_children, right_children, split_vars, split_values, nodes);

        let right_child_node = nodes.len();
        right_children[node] = right_child_node;
        create_empty_node(left_children, right_children, split_vars, split_values, nodes);

        // Ordered: left is <= split_value and right is > split_value.
        let node_samples = std::mem::take(&mut nodes[node]);
        for sample in node_samples {
            if *data.get(sample, split_var) <= split_value {
                nodes[left_child_node].push(sample);
            } else {
                nodes[right_child_node].push(sample);
            }
        }

        false
    }

    /// Decide whether a node can be split, and with what. Returns true to
    /// mark the node terminal, stamping the sentinel split value.
    #[allow(clippy::too_many_arguments)]
    fn split_node_internal(
        &self,
        node: usize,
        data: &Matrix<f64>,
        observations: &Observations,
        possible_split_vars: &[usize],
        split_vars: &mut [usize],
        split_values: &mut [f64],
        nodes: &mut [Vec<usize>],
    ) -> bool {
        if nodes[node].len() <= self.options.min_node_size {
            split_values[node] = -1.0;
            return true;
        }

        // Pure nodes cannot be improved by splitting. Only the first
        // outcome component is inspected, so multi-output outcomes with a
        // constant first component also read as pure.
        let mut pure = true;
        let mut pure_value = 0.0;
        for (i, &sample) in nodes[node].iter().enumerate() {
            let value = observations.get(OUTCOME, sample)[0];
            if i != 0 && value != pure_value {
                pure = false;
                break;
            }
            pure_value = value;
        }
        if pure {
            split_values[node] = -1.0;
            return true;
        }

        let responses_by_sample = self.relabeling_strategy.relabel(&nodes[node], observations);
        let split = if responses_by_sample.is_empty() {
            None
        } else {
            self.splitting_rule
                .find_best_split(data, &nodes[node], possible_split_vars, &responses_by_sample)
        };

        match split {
            Some(split) => {
                split_vars[node] = split.var;
                split_values[node] = split.value;
                false
            }
            None => {
                split_values[node] = -1.0;
                true
            }
        }
    }

    /// The candidate variables offered to the splitting rule at one node:
    /// the deterministic variables, plus a Poisson(mtry) draw clamped to
    /// `[1, num_independent_variables]` of random ones.
    fn create_split_variable_subset(&self, sampler: &mut RandomSampler, data: &Matrix<f64>) -> Vec<usize> {
        let mut result = self.options.deterministic_vars.clone();

        let num_independent_variables = data.cols - self.options.no_split_variables.len();
        let mtry_sample = sampler.sample_poisson(self.options.mtry);
        let split_mtry = mtry_sample.min(num_independent_variables).max(1);

        if self.options.split_select_weights.is_empty() {
            sampler.draw_without_replacement_skip(
                &mut result,
                data.cols,
                &self.options.no_split_variables,
                split_mtry,
            );
        } else if split_mtry > result.len() {
            let num_draws = split_mtry - result.len();
            sampler.draw_without_replacement_weighted(
                &mut result,
                &self.options.split_select_vars,
                num_draws,
                &self.options.split_select_weights,
            );
        }
        result
    }
}

fn create_empty_node(
    left_children: &mut Vec<usize>,
    right_children: &mut Vec<usize>,
    split_vars: &mut Vec<usize>,
    split_values: &mut Vec<f64>,
    nodes: &mut Vec<Vec<usize>>,
) {
    left_children.push(0);
    right_children.push(0);
    split_vars.push(0);
    split_values.push(0.0);
    nodes.push(Vec::new());
}

/// Replace the split-half samples sitting in the leaves with the held-out
/// honest half, routed through the finished tree. Leaves no held-out sample
/// reaches end up empty and carry no prediction summary.
fn repopulate_leaf_nodes(tree: &mut Tree, data: &Matrix<f64>, leaf_samples: &[usize]) {
    let num_nodes = tree.num_nodes();
    let mut new_leaf_samples: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];

    let leaf_nodes = tree.find_leaf_nodes(data, leaf_samples);
    for &sample in leaf_samples {
        let leaf_node = leaf_nodes[sample];
        new_leaf_samples[leaf_node].push(sample);
    }
    tree.leaf_samples = new_leaf_samples;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relabeling::NoopRelabelingStrategy;
    use crate::splitting::RegressionSplittingRule;

    fn trainer(min_node_size: usize, honesty: bool) -> TreeTrainer {
        TreeTrainer::new(
            Arc::new(NoopRelabelingStrategy),
            Arc::new(RegressionSplittingRule::new(0.0)),
            None,
            TreeOptions {
                mtry: 2,
                min_node_size,
                honesty,
                honesty_fraction: 0.5,
                deterministic_vars: Vec::new(),
                no_split_variables: Vec::new(),
                split_select_vars: Vec::new(),
                split_select_weights: Vec::new(),
            },
        )
    }

    // Stands in for the real rule where a test must prove the rule was
    // never consulted.
    struct PanickingRule;

    impl crate::splitting::SplittingRule for PanickingRule {
        fn find_best_split(
            &self,
            _data: &Matrix<f64>,
            _samples: &[usize],
            _possible_split_vars: &[usize],
            _responses_by_sample: &crate::relabeling::ResponsesBySample,
        ) -> Option<crate::splitting::Split> {
            panic!("splitting rule must not run on this node");
        }
    }

    #[test]
    fn test_pure_node_is_terminal_without_split_search() {
        let x: Vec<f64> = (0..8).map(|v| v as f64).collect();
        let data = Matrix::new(&x, 8, 1);
        let observations = Observations::from_outcomes(vec![7.0; 8]);
        let samples: Vec<usize> = (0..8).collect();

        let pure_trainer = TreeTrainer::new(
            Arc::new(NoopRelabelingStrategy),
            Arc::new(PanickingRule),
            None,
            trainer(1, false).options.clone(),
        );
        let mut sampler = RandomSampler::new(0);
        let tree = pure_trainer.train(&data, &observations, &mut sampler, &samples);
        assert_eq!(tree.num_nodes(), 1);
        assert!(tree.is_leaf(0));
        assert_eq!(tree.leaf_samples[0], samples);
    }

    #[test]
    fn test_min_node_size_skips_split_search() {
        let x: Vec<f64> = (0..5).map(|v| v as f64).collect();
        let data = Matrix::new(&x, 5, 1);
        let observations = Observations::from_outcomes(vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let small_trainer = TreeTrainer::new(
            Arc::new(NoopRelabelingStrategy),
            Arc::new(PanickingRule),
            None,
            trainer(5, false).options.clone(),
        );
        let mut sampler = RandomSampler::new(0);
        let tree = small_trainer.train(&data, &observations, &mut sampler, &[0, 1, 2, 3, 4]);
        assert!(tree.is_leaf(0));
    }

    #[test]
    fn test_min_node_size_is_terminal() {
        let x: Vec<f64> = (0..5).map(|v| v as f64).collect();
        let data = Matrix::new(&x, 5, 1);
        let observations = Observations::from_outcomes(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let samples: Vec<usize> = (0..5).collect();

        let mut sampler = RandomSampler::new(0);
        let tree = trainer(5, false).train(&data, &observations, &mut sampler, &samples);
        assert_eq!(tree.num_nodes(), 1);
        assert!(tree.is_leaf(0));
    }

    #[test]
    fn test_poisson_mtry_clamps_to_independent_variables() {
        let x: Vec<f64> = (0..4).map(|v| v as f64).collect();
        let data = Matrix::new(&x, 4, 1);
        let mut sampler = RandomSampler::new(11);
        let trainer = trainer(1, false);
        for _ in 0..50 {
            let subset = trainer.create_split_variable_subset(&mut sampler, &data);
            assert_eq!(subset, vec![0]);
        }
    }

    #[test]
    fn test_deterministic_vars_always_offered() {
        let x: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let data = Matrix::new(&x, 4, 3);
        let mut sampler = RandomSampler::new(5);
        let mut trainer = trainer(1, false);
        trainer.options.deterministic_vars = vec![2];
        for _ in 0..20 {
            let subset = trainer.create_split_variable_subset(&mut sampler, &data);
            assert!(subset.contains(&2));
        }
    }

    #[test]
    fn test_no_split_variables_never_offered() {
        let x: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let data = Matrix::new(&x, 4, 3);
        let mut sampler = RandomSampler::new(5);
        let mut trainer = trainer(1, false);
        trainer.options.no_split_variables = vec![0];
        for _ in 0..20 {
            let subset = trainer.create_split_variable_subset(&mut sampler, &data);
            assert!(!subset.contains(&0));
        }
    }

    #[test]
    fn test_split_ordering_and_leaf_partition() {
        let x = vec![5.0, 1.0, 4.0, 2.0, 3.0, 8.0, 7.0, 6.0];
        let data = Matrix::new(&x, 8, 1);
        let observations = Observations::from_outcomes(vec![5.0, 1.0, 4.0, 2.0, 3.0, 8.0, 7.0, 6.0]);
        let samples: Vec<usize> = (0..8).collect();

        let mut sampler = RandomSampler::new(3);
        let tree = trainer(1, false).train(&data, &observations, &mut sampler, &samples);
        assert!(tree.num_nodes() > 1);

        let mut seen = Vec::new();
        for node in 0..tree.num_nodes() {
            if tree.is_leaf(node) {
                seen.extend(tree.leaf_samples[node].iter().copied());
            } else {
                assert!(tree.leaf_samples[node].is_empty());
                assert!(tree.split_values[node] >= 0.0);
                for &sample in &tree.leaf_samples[tree.left_children[node]] {
                    assert!(*data.get(sample, tree.split_vars[node]) <= tree.split_values[node]);
                }
                for &sample in &tree.leaf_samples[tree.right_children[node]] {
                    assert!(*data.get(sample, tree.split_vars[node]) > tree.split_values[node]);
                }
            }
        }
        seen.sort();
        assert_eq!(seen, samples);
    }

    #[test]
    fn test_honesty_separates_split_and_leaf_samples() {
        let x: Vec<f64> = (0..20).map(|v| v as f64).collect();
        let data = Matrix::new(&x, 20, 1);
        let outcomes: Vec<f64> = (0..20).map(|v| (v as f64).sin()).collect();
        let observations = Observations::from_outcomes(outcomes);
        let samples: Vec<usize> = (0..20).collect();

        let mut sampler = RandomSampler::new(9);
        // Reproduce the honest split the trainer will make.
        let mut probe = RandomSampler::new(9);
        let (split_half, leaf_half) = probe.subsample(&samples, 0.5);

        let tree = trainer(1, true).train(&data, &observations, &mut sampler, &samples);

        let mut populated: Vec<usize> = tree.leaf_samples.iter().flatten().copied().collect();
        populated.sort();
        let mut expected = leaf_half.clone();
        expected.sort();
        assert_eq!(populated, expected);
        for sample in split_half {
            assert!(!populated.contains(&sample));
        }
    }
}
