//! Model bundle: the frozen transformers and classifiers for one
//! (task, stage) pair.
//!
//! Bundles are loaded once and never mutated. [`ModelBundle::validate`] runs
//! at load time and rejects anything the scorer could not use; base
//! classifiers are checked separately by [`ModelBundle::base_model_issues`]
//! because a broken base model degrades scoring instead of disabling it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BundleError, ScoreError};
use crate::stage::{Stage, Task};
use crate::tree::{Classifier, GradientBoosting, LogisticModel, RandomForest};

// ── Preprocessing ──

/// Per-feature standardization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    /// `(x - mean) / scale`; a zero scale (constant training column) divides by 1.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| {
                let s = if *s == 0.0 || !s.is_finite() { 1.0 } else { *s };
                let v = (x - m) / s;
                if v.is_finite() { v } else { 0.0 }
            })
            .collect()
    }
}

/// Fitted feature-selection mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMask {
    pub support: Vec<bool>,
}

impl FeatureMask {
    pub fn apply(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.support)
            .filter(|(_, keep)| **keep)
            .map(|(v, _)| *v)
            .collect()
    }

    pub fn selected(&self) -> usize {
        self.support.iter().filter(|k| **k).count()
    }
}

// ── Calibrated meta-classifier ──

/// Monotone step function fitted offline.
///
/// `values[i]` applies to scores in `[breakpoints[i], breakpoints[i + 1])`.
/// Scores below the first breakpoint take `values[0]`; non-finite scores
/// map to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Isotonic {
    pub breakpoints: Vec<f64>,
    pub values: Vec<f64>,
}

impl Isotonic {
    pub fn calibrate(&self, raw: f64) -> f64 {
        if !raw.is_finite() || self.values.is_empty() {
            return 0.0;
        }
        let i = self.breakpoints.partition_point(|b| *b <= raw);
        self.values[i.saturating_sub(1).min(self.values.len() - 1)]
    }

    fn validate(&self) -> Result<(), BundleError> {
        if self.breakpoints.is_empty() || self.breakpoints.len() != self.values.len() {
            return Err(BundleError::Invalid(format!(
                "isotonic calibrator needs matching non-empty breakpoints/values ({} vs {})",
                self.breakpoints.len(),
                self.values.len()
            )));
        }
        if self.breakpoints.windows(2).any(|w| !(w[0] <= w[1])) {
            return Err(BundleError::Invalid(
                "isotonic breakpoints are not sorted".into(),
            ));
        }
        if self.values.iter().any(|v| !(0.0..=1.0).contains(v))
            || self.values.windows(2).any(|w| w[1] < w[0])
        {
            return Err(BundleError::Invalid(
                "isotonic values must be non-decreasing within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Soft-voting weights over the three members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteWeights {
    pub forest: f64,
    pub boosted: f64,
    pub linear: f64,
}

impl Default for VoteWeights {
    fn default() -> Self {
        Self {
            forest: 0.4,
            boosted: 0.4,
            linear: 0.2,
        }
    }
}

/// One calibration fold: a fitted voting triple plus its calibrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedFold {
    pub forest: RandomForest,
    pub boosted: GradientBoosting,
    pub linear: LogisticModel,
    pub calibrator: Isotonic,
}

impl CalibratedFold {
    fn score(&self, x: &[f64], w: &VoteWeights) -> Result<f64, ScoreError> {
        let total = w.forest + w.boosted + w.linear;
        let vote = (w.forest * self.forest.predict_proba(x)?
            + w.boosted * self.boosted.predict_proba(x)?
            + w.linear * self.linear.predict_proba(x)?)
            / total;
        Ok(self.calibrator.calibrate(vote))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedEnsemble {
    #[serde(default)]
    pub weights: VoteWeights,
    pub folds: Vec<CalibratedFold>,
}

impl CalibratedEnsemble {
    /// Mean of the calibrated fold outputs.
    pub fn predict_proba(&self, x: &[f64]) -> Result<f64, ScoreError> {
        if self.folds.is_empty() {
            return Err(ScoreError::EmptyEnsemble);
        }
        let mut sum = 0.0;
        for fold in &self.folds {
            sum += fold.score(x, &self.weights)?;
        }
        let p = sum / self.folds.len() as f64;
        if p.is_finite() {
            Ok(p.clamp(0.0, 1.0))
        } else {
            Err(ScoreError::NonFinite)
        }
    }

    fn validate(&self, width: usize) -> Result<(), BundleError> {
        let w = &self.weights;
        let weights = [w.forest, w.boosted, w.linear];
        if weights.iter().any(|v| !v.is_finite() || *v < 0.0) || weights.iter().sum::<f64>() <= 0.0
        {
            return Err(BundleError::Invalid(
                "ensemble weights must be non-negative with a positive sum".into(),
            ));
        }
        if self.folds.is_empty() {
            return Err(ScoreError::EmptyEnsemble.into());
        }
        for fold in &self.folds {
            fold.forest.validate(width)?;
            fold.boosted.validate(width)?;
            fold.linear.validate(width)?;
            fold.calibrator.validate()?;
        }
        Ok(())
    }
}

// ── Bundle ──

/// Held-out metrics recorded at training time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Performance {
    pub accuracy: f64,
    pub roc_auc: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub cv_roc_auc: f64,
    pub cv_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub task: Task,
    pub stage: Stage,
    /// Every feature the bundle expects, in column order.
    pub features: Vec<String>,
    pub scaler: Scaler,
    pub selector: FeatureMask,
    pub selected_features: Vec<String>,
    pub forest: RandomForest,
    pub boosted: GradientBoosting,
    pub linear: LogisticModel,
    pub ensemble: CalibratedEnsemble,
    /// Decision threshold chosen at training time.
    pub threshold: f64,
    #[serde(default)]
    pub performance: Performance,
}

impl ModelBundle {
    /// File name for a (task, stage) artifact inside a models directory.
    pub fn file_name(task: Task, stage: Stage) -> String {
        format!("{task}_{stage}.json")
    }

    /// Read, parse, and validate one artifact.
    pub fn load(path: &Path, task: Task, stage: Stage) -> Result<Self, BundleError> {
        if !path.exists() {
            return Err(BundleError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let bundle: Self = serde_json::from_str(&text).map_err(|source| BundleError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if (bundle.task, bundle.stage) != (task, stage) {
            return Err(BundleError::WrongKey {
                expected: format!("{task}/{stage}"),
                found: format!("{}/{}", bundle.task, bundle.stage),
            });
        }
        bundle.validate()?;
        Ok(bundle)
    }

    /// Check everything the meta-model path depends on.
    pub fn validate(&self) -> Result<(), BundleError> {
        let n = self.features.len();
        if n == 0 {
            return Err(BundleError::Invalid("bundle declares no features".into()));
        }
        for (what, len) in [
            ("scaler.mean", self.scaler.mean.len()),
            ("scaler.scale", self.scaler.scale.len()),
            ("selector.support", self.selector.support.len()),
        ] {
            if len != n {
                return Err(BundleError::Invalid(format!(
                    "{what} has {len} entries for {n} features"
                )));
            }
        }
        let width = self.selector.selected();
        if width == 0 {
            return Err(BundleError::Invalid("selector keeps no features".into()));
        }
        if self.selected_features.len() != width {
            return Err(BundleError::Invalid(format!(
                "selected_features lists {} names but the selector keeps {width}",
                self.selected_features.len()
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(BundleError::Invalid(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        self.ensemble.validate(width)
    }

    /// Structural problems in the three base classifiers, one line each.
    pub fn base_model_issues(&self) -> Vec<String> {
        let width = self.selector.selected();
        [
            ("forest", self.forest.validate(width)),
            ("boosted", self.boosted.validate(width)),
            ("linear", self.linear.validate(width)),
        ]
        .into_iter()
        .filter_map(|(name, r)| r.err().map(|e| format!("{name}: {e}")))
        .collect()
    }

    /// Width of the row the classifiers see.
    pub fn selected_width(&self) -> usize {
        self.selector.selected()
    }
}
