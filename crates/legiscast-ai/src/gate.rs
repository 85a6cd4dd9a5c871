//! Decision gate: whether to score passage, and the overall probability.

use serde::{Deserialize, Serialize};

pub const DEFAULT_VIABILITY_CUTOFF: f64 = 0.5;
pub const DEFAULT_NON_VIABLE_MULTIPLIER: f64 = 0.05;

/// Which cutoff decides viability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutoffSource {
    /// The configured `viability_cutoff`.
    #[default]
    Fixed,
    /// The viability bundle's trained `threshold`.
    BundleThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatePolicy {
    pub viability_cutoff: f64,
    pub non_viable_multiplier: f64,
    pub cutoff_source: CutoffSource,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            viability_cutoff: DEFAULT_VIABILITY_CUTOFF,
            non_viable_multiplier: DEFAULT_NON_VIABLE_MULTIPLIER,
            cutoff_source: CutoffSource::Fixed,
        }
    }
}

/// Outcome of the viability gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateDecision {
    pub viable: bool,
    /// Cutoff that decided `viable`.
    pub cutoff_used: f64,
    /// Trained threshold of the viability bundle, reported either way.
    pub bundle_threshold: f64,
    pub passes_fixed_cutoff: bool,
    pub passes_bundle_threshold: bool,
}

impl GatePolicy {
    /// Gate a viability point estimate.
    pub fn decide(&self, viability: f64, bundle_threshold: f64) -> GateDecision {
        let cutoff_used = match self.cutoff_source {
            CutoffSource::Fixed => self.viability_cutoff,
            CutoffSource::BundleThreshold => bundle_threshold,
        };
        GateDecision {
            viable: viability >= cutoff_used,
            cutoff_used,
            bundle_threshold,
            passes_fixed_cutoff: viability >= self.viability_cutoff,
            passes_bundle_threshold: viability >= bundle_threshold,
        }
    }

    /// `viability * passage` when passage was scored, else the non-viable penalty.
    pub fn overall(&self, viability: f64, passage: Option<f64>) -> f64 {
        match passage {
            Some(p) => viability * p,
            None => viability * self.non_viable_multiplier,
        }
    }
}
