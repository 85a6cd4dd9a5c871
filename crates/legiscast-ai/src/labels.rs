//! Fitted label encoders for categorical features.
//!
//! Vocabularies come from `metadata.json`, written by the training process in
//! the order a fitted label encoder stores them (sorted). Encoding a category
//! is its index in that vocabulary; a category never seen in training encodes
//! to `0` instead of failing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// Code used for categories outside the training vocabulary.
pub const UNSEEN_CODE: f64 = 0.0;

/// A fitted label encoder: one vocabulary, index-coded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { classes, index }
    }

    /// Index of a known category.
    pub fn try_encode(&self, category: &str) -> Option<usize> {
        self.index.get(category).copied()
    }

    /// Numeric code for a category, [`UNSEEN_CODE`] when unknown.
    pub fn encode(&self, category: &str) -> f64 {
        self.try_encode(category)
            .map(|i| i as f64)
            .unwrap_or(UNSEEN_CODE)
    }

    /// Category for a code, if it is in the vocabulary.
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl From<Vec<String>> for LabelEncoder {
    fn from(classes: Vec<String>) -> Self {
        Self::new(classes)
    }
}

impl From<LabelEncoder> for Vec<String> {
    fn from(enc: LabelEncoder) -> Self {
        enc.classes
    }
}

/// Encoders for every categorical feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelEncoders {
    /// Sponsor party codes.
    pub party: LabelEncoder,
    /// Policy area names.
    pub policy: LabelEncoder,
}

/// Shared artifact metadata (`metadata.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub label_encoders: LabelEncoders,
    /// Candidate feature names per stage, before selection.
    pub feature_sets: HashMap<Stage, Vec<String>>,
}

/// Summary statistics for loaded metadata.
pub struct MetadataSummary {
    pub party_classes: usize,
    pub policy_classes: usize,
    pub stages_with_feature_sets: usize,
}

impl Metadata {
    pub fn summary(&self) -> MetadataSummary {
        MetadataSummary {
            party_classes: self.label_encoders.party.len(),
            policy_classes: self.label_encoders.policy.len(),
            stages_with_feature_sets: self.feature_sets.len(),
        }
    }
}
