//! Tree-ensemble evaluation over fitted decision trees.
//!
//! Trees use the flat array layout scikit-learn exports: node `i` is a leaf
//! when `children_left[i] == -1`, otherwise samples with
//! `x[feature[i]] <= threshold[i]` go left.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Child index marking a leaf
pub const TREE_LEAF: i64 = -1;

/// One fitted decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node output: class fractions for forests, a single raw value for boosting
    pub value: Vec<Vec<f64>>,
    /// Node impurity, needed only to derive importances
    #[serde(default)]
    pub impurity: Option<Vec<f64>>,
    /// Weighted training samples reaching each node, needed only to derive importances
    #[serde(default)]
    pub weighted_n_node_samples: Option<Vec<f64>>,
}

impl DecisionTree {
    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == TREE_LEAF
    }

    /// Check structure against the model's input width and expected leaf output width.
    pub fn validate(&self, n_features: usize, output_width: usize) -> Result<(), ModelError> {
        let nodes = self.node_count();
        if nodes == 0 {
            return Err(ModelError::Invalid("tree has no nodes".to_string()));
        }
        let lengths = [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ];
        if lengths.iter().any(|&len| len != nodes) {
            return Err(ModelError::Invalid(format!(
                "tree node arrays disagree in length (expected {nodes})"
            )));
        }
        for stats in [&self.impurity, &self.weighted_n_node_samples]
            .into_iter()
            .flatten()
        {
            if stats.len() != nodes {
                return Err(ModelError::Invalid(format!(
                    "tree node statistics have {} entries, expected {nodes}",
                    stats.len()
                )));
            }
        }

        for node in 0..nodes {
            if self.is_leaf(node) {
                if self.children_right[node] != TREE_LEAF {
                    return Err(ModelError::Invalid(format!(
                        "node {node} has only one child"
                    )));
                }
                let value = &self.value[node];
                if value.len() != output_width || value.iter().any(|v| !v.is_finite()) {
                    return Err(ModelError::Invalid(format!(
                        "leaf {node} must carry {output_width} finite output value(s)"
                    )));
                }
                continue;
            }

            // Children always follow their parent, which rules out cycles.
            for child in [self.children_left[node], self.children_right[node]] {
                if child <= node as i64 || child >= nodes as i64 {
                    return Err(ModelError::Invalid(format!(
                        "node {node} points to invalid child {child}"
                    )));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(ModelError::Invalid(format!(
                    "node {node} splits on feature {feature}, model has {n_features}"
                )));
            }
            if !self.threshold[node].is_finite() {
                return Err(ModelError::Invalid(format!(
                    "node {node} has a non-finite threshold"
                )));
            }
        }
        Ok(())
    }

    /// Output vector of the leaf `x` falls into.
    pub fn leaf_value(&self, x: &[f64]) -> &[f64] {
        let mut node = 0;
        while !self.is_leaf(node) {
            let feature = self.feature[node] as usize;
            node = if x[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }

    /// Normalised mean-decrease-in-impurity importances of this tree.
    ///
    /// Returns `None` when the tree carries no impurity statistics.
    pub fn impurity_importances(&self, n_features: usize) -> Option<Vec<f64>> {
        let impurity = self.impurity.as_ref()?;
        let weights = self.weighted_n_node_samples.as_ref()?;
        let mut importances = vec![0.0; n_features];

        for node in 0..self.node_count() {
            if self.is_leaf(node) {
                continue;
            }
            let left = self.children_left[node] as usize;
            let right = self.children_right[node] as usize;
            importances[self.feature[node] as usize] += weights[node] * impurity[node]
                - weights[left] * impurity[left]
                - weights[right] * impurity[right];
        }

        if weights[0] > 0.0 {
            for importance in &mut importances {
                *importance /= weights[0];
            }
        }
        normalize(&mut importances);
        Some(importances)
    }
}

/// How tree outputs combine into a probability
#[derive(Debug, Clone, PartialEq)]
pub enum EnsembleKind {
    /// Average of per-tree positive-class fractions
    RandomForest,
    /// Sigmoid of `base_score + learning_rate * Σ leaf`
    GradientBoosting { base_score: f64, learning_rate: f64 },
}

/// A validated tree ensemble producing a positive-class probability
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    kind: EnsembleKind,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl TreeEnsemble {
    pub fn new(
        kind: EnsembleKind,
        trees: Vec<DecisionTree>,
        n_features: usize,
    ) -> Result<Self, ModelError> {
        if trees.is_empty() {
            return Err(ModelError::Invalid("ensemble has no trees".to_string()));
        }
        let output_width = match kind {
            EnsembleKind::RandomForest => 2,
            EnsembleKind::GradientBoosting { .. } => 1,
        };
        for (index, tree) in trees.iter().enumerate() {
            tree.validate(n_features, output_width)
                .map_err(|e| ModelError::Invalid(format!("tree {index}: {e}")))?;
        }
        if let EnsembleKind::RandomForest = kind {
            let degenerate = trees
                .iter()
                .flat_map(|t| t.value.iter().zip(&t.children_left))
                .any(|(value, &left)| left == TREE_LEAF && value.iter().sum::<f64>() <= 0.0);
            if degenerate {
                return Err(ModelError::Invalid(
                    "forest leaf has no class mass".to_string(),
                ));
            }
        }

        Ok(Self {
            kind,
            trees,
            n_features,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    /// Positive-class probability for one transformed vector.
    ///
    /// The caller guarantees `x.len() == self.n_features()`.
    pub fn predict_proba(&self, x: &[f64]) -> f64 {
        match self.kind {
            EnsembleKind::RandomForest => {
                let mut total = 0.0;
                for tree in &self.trees {
                    let value = tree.leaf_value(x);
                    total += value[1] / (value[0] + value[1]);
                }
                total / self.trees.len() as f64
            }
            EnsembleKind::GradientBoosting {
                base_score,
                learning_rate,
            } => {
                let margin: f64 = self.trees.iter().map(|t| t.leaf_value(x)[0]).sum();
                sigmoid(base_score + learning_rate * margin)
            }
        }
    }

    /// Ensemble importances derived from node impurity, if every tree carries the statistics.
    pub fn impurity_importances(&self) -> Option<Vec<f64>> {
        let mut total = vec![0.0; self.n_features];
        let mut contributing = 0usize;

        for tree in &self.trees {
            // Single-leaf trees carry no split information.
            if tree.node_count() <= 1 {
                continue;
            }
            let importances = tree.impurity_importances(self.n_features)?;
            for (sum, importance) in total.iter_mut().zip(importances) {
                *sum += importance;
            }
            contributing += 1;
        }

        if contributing > 0 {
            for sum in &mut total {
                *sum /= contributing as f64;
            }
        }
        normalize(&mut total);
        Some(total)
    }
}

fn normalize(values: &mut [f64]) {
    let sum: f64 = values.iter().sum();
    if sum > 0.0 {
        for value in values.iter_mut() {
            *value /= sum;
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
