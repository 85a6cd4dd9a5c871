//! Ensemble scorer: feature vector + bundle → point estimate and bounds.

use serde::Serialize;
use tracing::{debug, warn};

use crate::bundle::ModelBundle;
use crate::error::ScoreError;
use crate::features::FeatureVector;
use crate::tree::Classifier;

/// Width of the bound centred on the point when base scores are unavailable.
pub const DEFAULT_FALLBACK_SPREAD: f64 = 0.1;

/// Independent scores of the three base classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaseScores {
    pub forest: f64,
    pub boosted: f64,
    pub linear: f64,
}

impl BaseScores {
    pub fn min(&self) -> f64 {
        self.forest.min(self.boosted).min(self.linear)
    }

    pub fn max(&self) -> f64 {
        self.forest.max(self.boosted).max(self.linear)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Calibrated meta-model estimate.
    pub point: f64,
    pub low: f64,
    pub high: f64,
    /// `None` when any base classifier failed and the fallback spread was used.
    pub base_scores: Option<BaseScores>,
    /// The calibrated point lies outside `[low, high]` of the base scores.
    /// Expected under calibration; reported rather than hidden.
    pub outside_base_range: bool,
}

impl PredictionResult {
    pub fn used_base_scores(&self) -> bool {
        self.base_scores.is_some()
    }

    pub fn spread(&self) -> f64 {
        self.high - self.low
    }
}

/// Scores feature vectors against one bundle.
pub struct EnsembleScorer<'a> {
    bundle: &'a ModelBundle,
    fallback_spread: f64,
}

impl<'a> EnsembleScorer<'a> {
    pub fn new(bundle: &'a ModelBundle) -> Self {
        Self {
            bundle,
            fallback_spread: DEFAULT_FALLBACK_SPREAD,
        }
    }

    pub fn with_fallback_spread(mut self, spread: f64) -> Self {
        self.fallback_spread = spread;
        self
    }

    /// Project, scale, and select: the row every classifier sees.
    pub fn prepare(&self, features: &FeatureVector) -> Vec<f64> {
        let projected = features.project(&self.bundle.features);
        let scaled = self.bundle.scaler.transform(&projected);
        self.bundle.selector.apply(&scaled)
    }

    /// Score one bill. Fails only when the calibrated meta-model does.
    pub fn score(&self, features: &FeatureVector) -> Result<PredictionResult, ScoreError> {
        let b = self.bundle;
        let row = self.prepare(features);
        debug!(task = %b.task, stage = %b.stage, width = row.len(), "scoring");

        let base = match self.base_scores(&row) {
            Ok(scores) => Some(scores),
            Err(e) => {
                warn!(
                    task = %b.task,
                    stage = %b.stage,
                    error = %e,
                    "base classifier failed, using fallback spread"
                );
                None
            }
        };

        let point = b.ensemble.predict_proba(&row)?;

        let (low, high) = match &base {
            Some(s) => (s.min(), s.max()),
            None => {
                let half = self.fallback_spread / 2.0;
                ((point - half).max(0.0), (point + half).min(1.0))
            }
        };
        let outside_base_range = base.is_some() && (point < low || point > high);
        if outside_base_range {
            debug!(
                task = %b.task,
                stage = %b.stage,
                point,
                low,
                high,
                "calibrated estimate outside base range"
            );
        }

        Ok(PredictionResult {
            point,
            low,
            high,
            base_scores: base,
            outside_base_range,
        })
    }

    fn base_scores(&self, row: &[f64]) -> Result<BaseScores, ScoreError> {
        Ok(BaseScores {
            forest: self.bundle.forest.predict_proba(row)?,
            boosted: self.bundle.boosted.predict_proba(row)?,
            linear: self.bundle.linear.predict_proba(row)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::tests::tiny_bundle;
    use crate::stage::{Stage, Task};
    use crate::tree::sigmoid;

    fn features(actions: f64) -> FeatureVector {
        let mut fv = FeatureVector::new();
        fv.set("action_count", actions);
        fv
    }

    #[test]
    fn bounds_from_base_scores() {
        let b = tiny_bundle(Task::Viability, Stage::Progressive);
        let r = EnsembleScorer::new(&b).score(&features(1.0)).unwrap();
        assert_eq!(r.point, 0.8);
        let s = r.base_scores.unwrap();
        assert_eq!(s.forest, 0.7);
        assert!((s.boosted - sigmoid(2.0)).abs() < 1e-12);
        assert_eq!(s.linear, 0.5);
        assert_eq!(r.low, 0.5);
        assert!((r.high - sigmoid(2.0)).abs() < 1e-12);
        assert!(!r.outside_base_range);
        assert!(r.used_base_scores());
    }

    #[test]
    fn base_failure_falls_back_to_fixed_spread() {
        let mut b = tiny_bundle(Task::Viability, Stage::Progressive);
        b.linear.coef = vec![1.0, 1.0];
        let r = EnsembleScorer::new(&b).score(&features(1.0)).unwrap();
        assert!(r.base_scores.is_none());
        assert_eq!(r.point, 0.8);
        assert!((r.low - 0.75).abs() < 1e-12);
        assert!((r.high - 0.85).abs() < 1e-12);
        assert!(!r.outside_base_range);
    }

    #[test]
    fn fallback_bounds_clamped() {
        let mut b = tiny_bundle(Task::Viability, Stage::Progressive);
        b.forest.trees.clear();
        for fold in &mut b.ensemble.folds {
            fold.calibrator.values = vec![0.0, 0.98];
        }
        let low = EnsembleScorer::new(&b).score(&features(-1.0)).unwrap();
        assert_eq!((low.low, low.point), (0.0, 0.0));
        let high = EnsembleScorer::new(&b).score(&features(1.0)).unwrap();
        assert_eq!(high.high, 1.0);
    }

    #[test]
    fn calibrated_point_may_leave_base_range() {
        let mut b = tiny_bundle(Task::Viability, Stage::Progressive);
        b.ensemble.folds[0].calibrator.values = vec![0.01, 0.02];
        let r = EnsembleScorer::new(&b).score(&features(1.0)).unwrap();
        assert_eq!(r.point, 0.02);
        assert!(r.point < r.low);
        assert!(r.outside_base_range);
    }

    #[test]
    fn deterministic() {
        let b = tiny_bundle(Task::Passage, Stage::NewBill);
        let scorer = EnsembleScorer::new(&b);
        let fv = features(3.0);
        assert_eq!(scorer.score(&fv).unwrap(), scorer.score(&fv).unwrap());
    }

    #[test]
    fn missing_features_project_to_zero() {
        let b = tiny_bundle(Task::Viability, Stage::NewBill);
        let mut fv = FeatureVector::new();
        fv.set("action_count", f64::NAN);
        assert_eq!(EnsembleScorer::new(&b).prepare(&fv), vec![0.0]);
    }
}
