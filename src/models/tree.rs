//! Decision-tree ensembles: random forest and gradient boosting.

use super::scorer::{sigmoid, Scorer};
use crate::normalizer::NormalizedFeatures;
use anyhow::Result;
use serde::Deserialize;

/// A node of a fitted decision tree.
///
/// Splits send a sample left when `x[feature] <= threshold`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Flat array of nodes with the root at index 0.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Check the tree is well formed for `n_features` inputs.
    ///
    /// Children must point strictly forward, which rules out cycles and
    /// guarantees traversal ends on a leaf.
    pub(crate) fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} of {}",
                            i, feature, n_features
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", i));
                    }
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", i, child));
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("leaf {} has a non-finite value", i));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf and return its value.
    pub fn leaf_value(&self, x: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    i = if x[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

fn validate_trees(trees: &[DecisionTree], n_features: usize) -> Result<(), String> {
    if trees.is_empty() {
        return Err("ensemble has no trees".to_string());
    }
    for (i, tree) in trees.iter().enumerate() {
        tree.validate(n_features)
            .map_err(|e| format!("tree {}: {}", i, e))?;
    }
    Ok(())
}

/// Random forest classifier: leaves hold the positive-class fraction and the
/// forest probability is their mean.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(n_features: usize, trees: Vec<DecisionTree>) -> Self {
        Self { n_features, trees }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        validate_trees(&self.trees, self.n_features)?;
        let out_of_range = self.trees.iter().flat_map(|t| &t.nodes).any(|n| match n {
            Node::Leaf { value } => !(0.0..=1.0).contains(value),
            Node::Split { .. } => false,
        });
        if out_of_range {
            return Err("leaf probabilities must lie in [0, 1]".to_string());
        }
        Ok(())
    }
}

impl Scorer for RandomForest {
    fn family(&self) -> &'static str {
        "random_forest"
    }

    fn feature_count(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn score_probability(&self, features: &NormalizedFeatures) -> Result<f64> {
        let x = features.as_slice();
        let total: f64 = self.trees.iter().map(|t| t.leaf_value(x)).sum();
        Ok(total / self.trees.len() as f64)
    }
}

/// Gradient-boosted trees with a logistic link:
/// `sigmoid(init_score + learning_rate * sum(leaf))`.
#[derive(Debug, Clone, Deserialize)]
pub struct GradientBoosting {
    n_features: usize,
    init_score: f64,
    learning_rate: f64,
    trees: Vec<DecisionTree>,
}

impl GradientBoosting {
    pub fn new(
        n_features: usize,
        init_score: f64,
        learning_rate: f64,
        trees: Vec<DecisionTree>,
    ) -> Self {
        Self {
            n_features,
            init_score,
            learning_rate,
            trees,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !self.init_score.is_finite() {
            return Err("init_score must be finite".to_string());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err("learning_rate must be positive".to_string());
        }
        validate_trees(&self.trees, self.n_features)
    }
}

impl Scorer for GradientBoosting {
    fn family(&self) -> &'static str {
        "gradient_boosting"
    }

    fn feature_count(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn score_probability(&self, features: &NormalizedFeatures) -> Result<f64> {
        let x = features.as_slice();
        let raw: f64 = self.trees.iter().map(|t| t.leaf_value(x)).sum();
        Ok(sigmoid(self.init_score + self.learning_rate * raw))
    }
}
