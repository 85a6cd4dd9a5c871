//! Fitted classifiers stored in model bundles.
//!
//! Three kinds, all scoring one already-scaled, already-selected row:
//!
//! - [`RandomForest`]: mean of per-tree leaf probabilities.
//! - [`GradientBoosting`]: `sigmoid(init + learning_rate * Σ leaf)`.
//! - [`LogisticModel`]: `sigmoid(coef · x + intercept)`.
//!
//! Trees are flat node lists with the root at index 0. Nothing here panics on
//! a malformed artifact; structural problems surface as [`ScoreError`].

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;

/// Positive-class probability for one row.
pub trait Classifier {
    fn predict_proba(&self, x: &[f64]) -> Result<f64, ScoreError>;

    /// Check the model's structure against an input width without scoring.
    fn validate(&self, width: usize) -> Result<(), ScoreError>;
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn finite(p: f64) -> Result<f64, ScoreError> {
    if p.is_finite() {
        Ok(p)
    } else {
        Err(ScoreError::NonFinite)
    }
}

// ── Decision trees ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    /// `x[feature] <= threshold` goes left.
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

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walk from the root to a leaf and return its value.
    pub fn evaluate(&self, x: &[f64]) -> Result<f64, ScoreError> {
        let mut index = 0;
        // A walk longer than the node count has revisited a node.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                None => return Err(ScoreError::MissingNode { index }),
                Some(TreeNode::Leaf { value }) => return Ok(*value),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let v = x.get(*feature).ok_or(ScoreError::FeatureOutOfRange {
                        feature: *feature,
                        width: x.len(),
                    })?;
                    index = if *v <= *threshold { *left } else { *right };
                }
            }
        }
        Err(ScoreError::Cycle)
    }

    /// Children must point forward and in range; split features must exist.
    ///
    /// Forward-only children rule out cycles.
    pub fn validate(&self, width: usize) -> Result<(), ScoreError> {
        if self.nodes.is_empty() {
            return Err(ScoreError::MissingNode { index: 0 });
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            else {
                continue;
            };
            if *feature >= width {
                return Err(ScoreError::FeatureOutOfRange {
                    feature: *feature,
                    width,
                });
            }
            for &child in [left, right] {
                if child >= self.nodes.len() {
                    return Err(ScoreError::MissingNode { index: child });
                }
                if child <= i {
                    return Err(ScoreError::Cycle);
                }
            }
        }
        Ok(())
    }
}

// ── Random forest ──

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

impl Classifier for RandomForest {
    fn predict_proba(&self, x: &[f64]) -> Result<f64, ScoreError> {
        if self.trees.is_empty() {
            return Err(ScoreError::EmptyEnsemble);
        }
        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.evaluate(x)?;
        }
        finite(sum / self.trees.len() as f64).map(|p| p.clamp(0.0, 1.0))
    }

    fn validate(&self, width: usize) -> Result<(), ScoreError> {
        if self.trees.is_empty() {
            return Err(ScoreError::EmptyEnsemble);
        }
        self.trees.iter().try_for_each(|t| t.validate(width))
    }
}

// ── Gradient boosting ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    /// Prior log-odds.
    pub init: f64,
    pub learning_rate: f64,
    pub trees: Vec<DecisionTree>,
}

impl Classifier for GradientBoosting {
    fn predict_proba(&self, x: &[f64]) -> Result<f64, ScoreError> {
        if self.trees.is_empty() {
            return Err(ScoreError::EmptyEnsemble);
        }
        let mut raw = 0.0;
        for tree in &self.trees {
            raw += tree.evaluate(x)?;
        }
        finite(sigmoid(self.init + self.learning_rate * raw))
    }

    fn validate(&self, width: usize) -> Result<(), ScoreError> {
        if self.trees.is_empty() {
            return Err(ScoreError::EmptyEnsemble);
        }
        self.trees.iter().try_for_each(|t| t.validate(width))
    }
}

// ── Logistic regression ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, x: &[f64]) -> Result<f64, ScoreError> {
        self.validate(x.len())?;
        let z: f64 = self.coef.iter().zip(x).map(|(c, v)| c * v).sum();
        finite(sigmoid(z + self.intercept))
    }

    fn validate(&self, width: usize) -> Result<(), ScoreError> {
        if self.coef.len() != width {
            return Err(ScoreError::WidthMismatch {
                expected: self.coef.len(),
                got: width,
            });
        }
        Ok(())
    }
}
