//! End-to-end prediction for one bill.
//!
//! Normalize → aggregate → build features → select stage → score viability
//! → gate → score passage (only when viable) → compose. One call is one
//! synchronous pass with no shared mutable state.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use legiscast_core::{BillMetrics, NormalizedBill, UpstreamBill, aggregate, normalize};

use crate::config::PipelineConfig;
use crate::ensemble::{EnsembleScorer, PredictionResult};
use crate::error::PredictError;
use crate::features::{FeatureBuilder, FeatureVector, ProgressEvidence};
use crate::gate::{GateDecision, GatePolicy};
use crate::registry::BundleRegistry;
use crate::stage::{Stage, Task};

/// Probability shown for bills already enacted.
pub const ENACTED_DISPLAY_PROBABILITY: f64 = 1.0;

/// Flat result handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutput {
    pub viability_point: f64,
    pub viability_low: f64,
    pub viability_high: f64,
    pub passage_point: Option<f64>,
    pub passage_low: Option<f64>,
    pub passage_high: Option<f64>,
    pub overall_probability: f64,
    /// Every model that ran had its base scores available.
    pub used_base_scores: bool,
    pub stage_used: Stage,
    pub viable: bool,
    pub bundle_threshold: f64,
    pub passes_bundle_threshold: bool,
    pub enacted: bool,
    /// `overall_probability`, or 1.0 for enacted bills.
    pub display_probability: f64,
}

/// Everything computed for one bill.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub bill: NormalizedBill,
    pub metrics: BillMetrics,
    pub features: FeatureVector,
    pub evidence: ProgressEvidence,
    pub stage: Stage,
    pub viability: PredictionResult,
    pub passage: Option<PredictionResult>,
    pub gate: GateDecision,
    pub overall_probability: f64,
    /// Threshold/metrics of the bundles used, for insight reporting.
    pub viability_cv_std: f64,
    pub selected_features: Vec<String>,
}

impl Assessment {
    pub fn enacted(&self) -> bool {
        self.evidence.became_law
    }

    pub fn display_probability(&self) -> f64 {
        if self.enacted() {
            ENACTED_DISPLAY_PROBABILITY
        } else {
            self.overall_probability
        }
    }

    pub fn output(&self) -> PredictionOutput {
        PredictionOutput {
            viability_point: self.viability.point,
            viability_low: self.viability.low,
            viability_high: self.viability.high,
            passage_point: self.passage.as_ref().map(|p| p.point),
            passage_low: self.passage.as_ref().map(|p| p.low),
            passage_high: self.passage.as_ref().map(|p| p.high),
            overall_probability: self.overall_probability,
            used_base_scores: self.viability.used_base_scores()
                && self.passage.as_ref().is_none_or(|p| p.used_base_scores()),
            stage_used: self.stage,
            viable: self.gate.viable,
            bundle_threshold: self.gate.bundle_threshold,
            passes_bundle_threshold: self.gate.passes_bundle_threshold,
            enacted: self.enacted(),
            display_probability: self.display_probability(),
        }
    }
}

pub struct Predictor<'a> {
    registry: &'a BundleRegistry,
    gate: GatePolicy,
    fallback_spread: f64,
}

impl<'a> Predictor<'a> {
    pub fn new(registry: &'a BundleRegistry, config: &PipelineConfig) -> Self {
        Self {
            registry,
            gate: config.gate,
            fallback_spread: config.fallback_spread,
        }
    }

    /// Predict from raw upstream payloads.
    pub fn predict(
        &self,
        upstream: &UpstreamBill,
        today: NaiveDate,
    ) -> Result<Assessment, PredictError> {
        let normalized = normalize(upstream).ok_or(PredictError::BillNotFound)?;
        self.predict_normalized(normalized, today)
    }

    pub fn predict_normalized(
        &self,
        normalized: NormalizedBill,
        today: NaiveDate,
    ) -> Result<Assessment, PredictError> {
        let metrics = aggregate(
            &normalized.bill,
            &normalized.actions,
            &normalized.cosponsors,
            &normalized.subjects,
            today,
        );
        let evidence = ProgressEvidence::detect(&normalized.bill, &normalized.actions);
        let features = FeatureBuilder::new(&self.registry.metadata().label_encoders).build(
            &normalized,
            &metrics,
            today,
        );
        let stage = Stage::for_days_active(metrics.days_active);

        let viability_bundle = self.registry.get(Task::Viability, stage)?;
        let viability = self.score(Task::Viability, stage, &viability_bundle, &features)?;
        let gate = self.gate.decide(viability.point, viability_bundle.threshold);

        let passage = if gate.viable {
            let bundle = self.registry.get(Task::Passage, stage)?;
            Some(self.score(Task::Passage, stage, &bundle, &features)?)
        } else {
            None
        };
        let overall_probability = self
            .gate
            .overall(viability.point, passage.as_ref().map(|p| p.point));

        if evidence.became_law {
            debug!(
                bill = %normalized.bill.id,
                viability = viability.point,
                overall = overall_probability,
                "enacted bill, raw model scores"
            );
        }
        info!(
            bill = %normalized.bill.id,
            %stage,
            viability = viability.point,
            viable = gate.viable,
            overall = overall_probability,
            "prediction complete"
        );

        Ok(Assessment {
            viability_cv_std: viability_bundle.performance.cv_std,
            selected_features: viability_bundle.selected_features.clone(),
            bill: normalized,
            metrics,
            features,
            evidence,
            stage,
            viability,
            passage,
            gate,
            overall_probability,
        })
    }

    fn score(
        &self,
        task: Task,
        stage: Stage,
        bundle: &crate::bundle::ModelBundle,
        features: &FeatureVector,
    ) -> Result<PredictionResult, PredictError> {
        EnsembleScorer::new(bundle)
            .with_fallback_spread(self.fallback_spread)
            .score(features)
            .map_err(|source| PredictError::Scoring {
                task,
                stage,
                source,
            })
    }
}
