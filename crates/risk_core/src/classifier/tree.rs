//! Decision tree structures shared by the tree-based learners
//!
//! Trees are stored as flat node arrays with node 0 as the root. Internal
//! nodes route left when `feature <= threshold`. Leaves carry a value vector:
//! a class distribution for classification trees, a single score for
//! boosting trees.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes `feature_idx >= 0`, `left`/`right` index child nodes and
/// `leaf` is `None`. For leaves `feature_idx == -1` and `leaf` holds the value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub left: i32,
    pub right: i32,
    pub feature_idx: i32,
    pub threshold: f64,
    pub leaf: Option<Vec<f64>>,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(feature_idx: usize, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            left,
            right,
            feature_idx: feature_idx as i32,
            threshold,
            leaf: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(value: Vec<f64>) -> Self {
        Self {
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx < 0 || self.leaf.is_some()
    }
}

/// A single decision tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecisionTree {
    pub nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Walk the tree and return the leaf value reached by `features`.
    ///
    /// Callers must have run [`DecisionTree::validate`]; a malformed tree
    /// yields an empty slice.
    pub fn evaluate(&self, features: &[f64]) -> &[f64] {
        let mut idx = 0usize;
        // A valid tree reaches a leaf within `nodes.len()` steps.
        for _ in 0..=self.nodes.len() {
            let Some(node) = self.nodes.get(idx) else {
                return &[];
            };
            if let Some(value) = &node.leaf {
                return value;
            }
            let Some(&feature_value) = features.get(node.feature_idx as usize) else {
                return &[];
            };
            let next = if feature_value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return &[];
            }
            idx = next as usize;
        }
        &[]
    }

    /// First element of the reached leaf, for single-output trees.
    pub fn evaluate_scalar(&self, features: &[f64]) -> f64 {
        self.evaluate(features).first().copied().unwrap_or(0.0)
    }

    /// Validate tree structure against the expected feature count and leaf width.
    pub fn validate(&self, feature_count: usize, leaf_width: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match &node.leaf {
                    Some(value) if value.len() == leaf_width => {}
                    Some(value) => {
                        return Err(format!(
                            "Leaf node {i} has width {}, expected {leaf_width}",
                            value.len()
                        ))
                    }
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                }
                continue;
            }

            for (side, child) in [("left", node.left), ("right", node.right)] {
                // Children always follow their parent in the flat layout.
                if child < 0 || child as usize <= i || child as usize >= self.nodes.len() {
                    return Err(format!("Node {i} has invalid {side} child: {child}"));
                }
            }
            if node.feature_idx as usize >= feature_count {
                return Err(format!(
                    "Node {i} splits on feature {} but only {feature_count} exist",
                    node.feature_idx
                ));
            }
        }

        Ok(())
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() => {
                    1 + walk(nodes, node.left as usize).max(walk(nodes, node.right as usize))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> DecisionTree {
        DecisionTree::new(vec![
            Node::internal(0, 50.0, 1, 2),
            Node::leaf(vec![1.0, 0.0]),
            Node::leaf(vec![0.25, 0.75]),
        ])
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[30.0]), &[1.0, 0.0]);
        assert_eq!(tree.evaluate(&[50.0]), &[1.0, 0.0]); // Equal goes left
        assert_eq!(tree.evaluate(&[60.0]), &[0.25, 0.75]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate(1, 2).is_ok());
        assert!(stump().validate(1, 3).is_err());
        assert!(stump().validate(0, 2).is_err());

        let invalid = DecisionTree::new(vec![
            Node::internal(0, 50.0, 5, 2), // left=5 is out of bounds
            Node::leaf(vec![1.0]),
            Node::leaf(vec![2.0]),
        ]);
        assert!(invalid.validate(1, 1).is_err());
    }

    #[test]
    fn test_missing_feature_yields_empty() {
        assert!(stump().evaluate(&[]).is_empty());
        assert_eq!(stump().evaluate_scalar(&[]), 0.0);
    }
}
