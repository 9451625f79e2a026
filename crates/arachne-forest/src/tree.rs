//! Single decision tree with weighted split-candidate selection.

use rand_chacha::ChaCha8Rng;

use crate::node::{LeafValue, Node, NodeIndex};
use crate::sample::weighted_candidates;
use crate::split::{SplitTarget, find_best_split};

/// Growth limits shared by every tree of a forest.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) mtry: usize,
}

/// A fitted decision tree, stored as an arena of nodes.
#[derive(Debug, Clone)]
pub(crate) struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on the given (possibly repeated) sample indices.
    ///
    /// At every node the split candidates are redrawn from the weight
    /// vector, so a feature's chance of being offered scales with its
    /// weight and zero-weight features never appear.
    pub(crate) fn grow(
        col_features: &[Vec<f64>],
        target: &SplitTarget<'_>,
        sample_indices: &[usize],
        weights: &[f64],
        params: &TreeParams,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut nodes = Vec::new();
        build_node(
            col_features,
            target,
            sample_indices,
            weights,
            params,
            0,
            rng,
            &mut nodes,
        );
        Self { nodes }
    }

    /// Predict a single sample by root-to-leaf traversal.
    pub(crate) fn predict(&self, sample: &[f64]) -> LeafValue {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[*feature] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Add this tree's impurity decreases into per-feature totals.
    pub(crate) fn accumulate_importances(&self, totals: &mut [f64]) {
        for node in &self.nodes {
            if let Node::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                totals[*feature] += impurity_decrease;
            }
        }
    }

    /// Return the total number of nodes in the tree.
    #[cfg(test)]
    pub(crate) fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// Recursively build the arena-based tree.
///
/// Returns the [`NodeIndex`] of the node just created in `nodes`.
#[allow(clippy::too_many_arguments)]
fn build_node(
    col_features: &[Vec<f64>],
    target: &SplitTarget<'_>,
    sample_indices: &[usize],
    weights: &[f64],
    params: &TreeParams,
    depth: usize,
    rng: &mut ChaCha8Rng,
    nodes: &mut Vec<Node>,
) -> NodeIndex {
    let n_samples = sample_indices.len();

    let make_leaf = |nodes: &mut Vec<Node>| -> NodeIndex {
        let idx = nodes.len();
        nodes.push(Node::Leaf {
            value: target.leaf_value(sample_indices),
        });
        NodeIndex::new(idx)
    };

    let depth_exceeded = params.max_depth.is_some_and(|max_d| depth >= max_d);
    if depth_exceeded || n_samples < params.min_samples_split || target.is_pure(sample_indices) {
        return make_leaf(nodes);
    }

    let candidates = weighted_candidates(weights, params.mtry, rng);
    let split = match find_best_split(
        col_features,
        target,
        sample_indices,
        &candidates,
        params.min_samples_leaf,
    ) {
        Some(s) => s,
        None => return make_leaf(nodes),
    };

    // Arena pattern: push a placeholder, recurse, then overwrite with the split.
    let node_idx = nodes.len();
    nodes.push(Node::Leaf {
        value: target.leaf_value(sample_indices),
    });

    let left_idx = build_node(
        col_features,
        target,
        &split.left_indices,
        weights,
        params,
        depth + 1,
        rng,
        nodes,
    );
    let right_idx = build_node(
        col_features,
        target,
        &split.right_indices,
        weights,
        params,
        depth + 1,
        rng,
        nodes,
    );

    nodes[node_idx] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: left_idx,
        right: right_idx,
        impurity_decrease: split.impurity_decrease,
    };
    NodeIndex::new(node_idx)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{DecisionTree, TreeParams};
    use crate::node::LeafValue;
    use crate::split::SplitTarget;

    fn params(mtry: usize) -> TreeParams {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            mtry,
        }
    }

    #[test]
    fn regression_tree_fits_step_function() {
        let cols = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let y = vec![0.0, 0.0, 0.0, 5.0, 5.0, 5.0];
        let target = SplitTarget::Continuous(&y);
        let indices: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let tree = DecisionTree::grow(&cols, &target, &indices, &[1.0], &params(1), &mut rng);

        assert_eq!(tree.predict(&[2.0]), LeafValue::Mean(0.0));
        assert_eq!(tree.predict(&[11.5]), LeafValue::Mean(5.0));
    }

    #[test]
    fn classification_tree_fits_step_function() {
        let cols = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let target = SplitTarget::Classes {
            labels: &labels,
            n_classes: 2,
        };
        let indices: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let tree = DecisionTree::grow(&cols, &target, &indices, &[1.0], &params(1), &mut rng);

        assert_eq!(tree.predict(&[2.0]), LeafValue::Class(0));
        assert_eq!(tree.predict(&[11.5]), LeafValue::Class(1));
    }

    #[test]
    fn zero_weight_feature_never_splits() {
        // Feature 0 is perfectly informative but carries weight 0; the tree
        // must fall back to feature 1 or stay a stump.
        let cols = vec![
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.5, 0.5, 0.5, 0.5],
        ];
        let y = vec![0.0, 0.0, 5.0, 5.0];
        let target = SplitTarget::Continuous(&y);
        let indices: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let tree = DecisionTree::grow(
            &cols,
            &target,
            &indices,
            &[0.0, 1.0],
            &params(2),
            &mut rng,
        );

        let mut importances = vec![0.0; 2];
        tree.accumulate_importances(&mut importances);
        assert_eq!(importances[0], 0.0);
    }

    #[test]
    fn max_depth_one_gives_stump() {
        let cols = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let y = vec![0.0, 1.0, 0.0, 5.0, 6.0, 5.0];
        let target = SplitTarget::Continuous(&y);
        let indices: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let tree = DecisionTree::grow(
            &cols,
            &target,
            &indices,
            &[1.0],
            &TreeParams {
                max_depth: Some(1),
                min_samples_split: 2,
                min_samples_leaf: 1,
                mtry: 1,
            },
            &mut rng,
        );

        // Root split plus two leaves at most.
        assert!(tree.n_nodes() <= 3);
    }

    #[test]
    fn importances_concentrate_on_informative_feature() {
        let cols = vec![
            vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0],
            vec![0.2, 0.8, 0.5, 0.3, 0.9, 0.1],
        ];
        let y = vec![0.0, 0.0, 0.0, 5.0, 5.0, 5.0];
        let target = SplitTarget::Continuous(&y);
        let indices: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let tree = DecisionTree::grow(
            &cols,
            &target,
            &indices,
            &[0.5, 0.5],
            &params(2),
            &mut rng,
        );

        let mut importances = vec![0.0; 2];
        tree.accumulate_importances(&mut importances);
        assert!(importances[0] > importances[1]);
    }
}
