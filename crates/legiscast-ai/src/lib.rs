pub mod bundle;
pub mod config;
pub mod ensemble;
pub mod error;
pub mod features;
pub mod gate;
pub mod insights;
pub mod labels;
pub mod pipeline;
pub mod registry;
pub mod stage;
pub mod tree;

pub use bundle::{ModelBundle, Performance};
pub use config::PipelineConfig;
pub use ensemble::{BaseScores, EnsembleScorer, PredictionResult};
pub use error::{BundleError, PredictError, ScoreError};
pub use features::{FEATURE_NAMES, FeatureBuilder, FeatureVector, ProgressEvidence};
pub use gate::{CutoffSource, GateDecision, GatePolicy};
pub use insights::Insights;
pub use labels::{LabelEncoder, LabelEncoders, Metadata};
pub use pipeline::{Assessment, PredictionOutput, Predictor};
pub use registry::{BundleRegistry, BundleSlot};
pub use stage::{Stage, Task};
