//! Model tasks and lifecycle stages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prediction target a bundle was trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Viability,
    Passage,
}

impl Task {
    pub const ALL: [Task; 2] = [Task::Viability, Task::Passage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Viability => "viability",
            Self::Passage => "passage",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// How much lifecycle data a bill has, by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Introduced at most one day ago.
    NewBill,
    /// 2 to 30 days.
    EarlyStage,
    /// More than 30 days.
    Progressive,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::NewBill, Stage::EarlyStage, Stage::Progressive];

    /// Select the stage for a bill `days_active` days old.
    ///
    /// Recomputed on every call: the same bill moves to a later stage (and a
    /// different bundle) as time passes.
    pub fn for_days_active(days_active: i64) -> Self {
        if days_active <= 1 {
            Self::NewBill
        } else if days_active <= 30 {
            Self::EarlyStage
        } else {
            Self::Progressive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewBill => "new_bill",
            Self::EarlyStage => "early_stage",
            Self::Progressive => "progressive",
        }
    }

    /// Human-readable model name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NewBill => "New Bill Model",
            Self::EarlyStage => "Early Stage Model",
            Self::Progressive => "Progressive Model",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
