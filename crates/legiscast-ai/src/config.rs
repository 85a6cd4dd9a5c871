//! Pipeline settings, loadable from the `[pipeline]` table of a TOML file.
//!
//! ```toml
//! [pipeline]
//! models_dir = "models"
//! viability_cutoff = 0.5
//! non_viable_multiplier = 0.05
//! fallback_spread = 0.1
//! cutoff_source = "fixed"   # or "bundle_threshold"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use legiscast_core::ConfigError;

use crate::ensemble::DEFAULT_FALLBACK_SPREAD;
use crate::gate::GatePolicy;

pub const DEFAULT_MODELS_DIR: &str = "models";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub models_dir: PathBuf,
    #[serde(flatten)]
    pub gate: GatePolicy,
    pub fallback_spread: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            gate: GatePolicy::default(),
            fallback_spread: DEFAULT_FALLBACK_SPREAD,
        }
    }
}

impl PipelineConfig {
    /// Read the `[pipeline]` table; absent table or keys keep defaults.
    pub fn from_toml(file: &toml::Value) -> Result<Self, ConfigError> {
        match file.get("pipeline") {
            Some(table) => Ok(table.clone().try_into()?),
            None => Ok(Self::default()),
        }
    }
}
