//! Bundle registry: every (task, stage) artifact loaded once, read-only.
//!
//! A bundle that fails to load disables only its own slot. Asking for it
//! later returns [`PredictError::BundleMissing`] naming that exact pair; the
//! registry never substitutes another stage's bundle.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::bundle::ModelBundle;
use crate::error::{BundleError, PredictError};
use crate::labels::Metadata;
use crate::stage::{Stage, Task};

pub const METADATA_FILE: &str = "metadata.json";

/// Load state of one slot.
#[derive(Debug, Clone)]
pub enum BundleSlot {
    Ready(Arc<ModelBundle>),
    Unavailable(String),
}

#[derive(Debug)]
pub struct BundleRegistry {
    dir: PathBuf,
    slots: BTreeMap<(Task, Stage), BundleSlot>,
    metadata: Metadata,
}

impl BundleRegistry {
    /// Eagerly load all six bundles and the shared metadata from `dir`.
    pub fn load_dir(dir: &Path) -> Self {
        let mut slots = BTreeMap::new();
        for task in Task::ALL {
            for stage in Stage::ALL {
                let path = dir.join(ModelBundle::file_name(task, stage));
                let slot = match ModelBundle::load(&path, task, stage) {
                    Ok(bundle) => {
                        for issue in bundle.base_model_issues() {
                            warn!(%task, %stage, issue = %issue, "base classifier unusable, bounds will use fallback spread");
                        }
                        BundleSlot::Ready(Arc::new(bundle))
                    }
                    Err(e) => {
                        warn!(%task, %stage, error = %e, "bundle unavailable");
                        BundleSlot::Unavailable(e.to_string())
                    }
                };
                slots.insert((task, stage), slot);
            }
        }

        let metadata = match load_metadata(&dir.join(METADATA_FILE)) {
            Ok(m) => m,
            Err(e) => {
                warn!(error = %e, "metadata unavailable, categorical features will encode to 0");
                Metadata::default()
            }
        };

        let ready = slots
            .values()
            .filter(|s| matches!(s, BundleSlot::Ready(_)))
            .count();
        info!(dir = %dir.display(), ready, total = slots.len(), "model bundles loaded");

        Self {
            dir: dir.to_path_buf(),
            slots,
            metadata,
        }
    }

    /// Registry built from bundles already in memory.
    pub fn from_bundles(bundles: Vec<ModelBundle>, metadata: Metadata) -> Self {
        let mut slots: BTreeMap<(Task, Stage), BundleSlot> = Task::ALL
            .iter()
            .flat_map(|t| Stage::ALL.iter().map(move |s| (*t, *s)))
            .map(|key| (key, BundleSlot::Unavailable("not provided".into())))
            .collect();
        for bundle in bundles {
            let key = (bundle.task, bundle.stage);
            let slot = match bundle.validate() {
                Ok(()) => BundleSlot::Ready(Arc::new(bundle)),
                Err(e) => BundleSlot::Unavailable(e.to_string()),
            };
            slots.insert(key, slot);
        }
        Self {
            dir: PathBuf::new(),
            slots,
            metadata,
        }
    }

    /// The bundle for one pair, or the reason it cannot serve.
    pub fn get(&self, task: Task, stage: Stage) -> Result<Arc<ModelBundle>, PredictError> {
        match self.slots.get(&(task, stage)) {
            Some(BundleSlot::Ready(b)) => Ok(Arc::clone(b)),
            Some(BundleSlot::Unavailable(reason)) => Err(PredictError::BundleMissing {
                task,
                stage,
                reason: reason.clone(),
            }),
            None => Err(PredictError::BundleMissing {
                task,
                stage,
                reason: "not loaded".into(),
            }),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every slot in (task, stage) order.
    pub fn slots(&self) -> impl Iterator<Item = (Task, Stage, &BundleSlot)> {
        self.slots.iter().map(|((t, s), slot)| (*t, *s, slot))
    }
}

fn load_metadata(path: &Path) -> Result<Metadata, BundleError> {
    if !path.exists() {
        return Err(BundleError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| BundleError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| BundleError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

static GLOBAL: OnceLock<BundleRegistry> = OnceLock::new();

/// Process-wide registry, loaded from `dir` on first use.
///
/// Later calls return the same registry whatever `dir` they pass.
pub fn global(dir: &Path) -> &'static BundleRegistry {
    GLOBAL.get_or_init(|| BundleRegistry::load_dir(dir))
}
