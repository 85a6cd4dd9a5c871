//! Interpretive summaries of an [`Assessment`] for presentation.

use serde::Serialize;

use crate::pipeline::Assessment;

/// Cross-validation deviation below which a model counts as highly reliable.
const RELIABLE_CV_STD: f64 = 0.05;

/// How many selected features to report as key factors.
const KEY_FACTOR_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    High,
    Moderate,
    Low,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Moderate => "Moderate",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Impact {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyFactor {
    pub name: String,
    pub value: f64,
    pub impact: Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub model_reliability: Level,
    pub prediction_confidence: Level,
    pub viability_tier: &'static str,
    pub passage_tier: Option<&'static str>,
    pub progress: &'static str,
    pub percentile: String,
    pub recommendations: Vec<String>,
    pub key_factors: Vec<KeyFactor>,
}

pub fn reliability(cv_std: f64) -> Level {
    if cv_std < RELIABLE_CV_STD {
        Level::High
    } else {
        Level::Moderate
    }
}

/// Confidence from the width of the viability bound.
pub fn confidence(spread: f64) -> Level {
    if spread < 0.2 {
        Level::High
    } else if spread < 0.4 {
        Level::Moderate
    } else {
        Level::Low
    }
}

pub fn viability_tier(p: f64) -> &'static str {
    if p >= 0.7 {
        "Highly Viable"
    } else if p >= 0.5 {
        "Viable"
    } else if p >= 0.3 {
        "Marginal"
    } else {
        "Not Viable"
    }
}

pub fn passage_tier(p: f64) -> &'static str {
    if p >= 0.7 {
        "Likely to Pass"
    } else if p >= 0.5 {
        "Possible Passage"
    } else if p >= 0.3 {
        "Unlikely to Pass"
    } else {
        "Very Unlikely to Pass"
    }
}

/// Rank label: a bill at overall probability `p` sits in the top `p * 100`%.
pub fn percentile(overall: f64) -> String {
    format!("Top {:.0}%", overall.clamp(0.0, 1.0) * 100.0)
}

impl Insights {
    pub fn from_assessment(a: &Assessment) -> Self {
        let progress = a.evidence.label();
        let (percentile, passage_tier) = if a.enacted() {
            ("Enacted".to_string(), Some("Enacted"))
        } else {
            (
                percentile(a.overall_probability),
                a.passage.as_ref().map(|p| passage_tier(p.point)),
            )
        };
        Self {
            model_reliability: reliability(a.viability_cv_std),
            prediction_confidence: confidence(a.viability.spread()),
            viability_tier: viability_tier(a.viability.point),
            passage_tier,
            progress,
            percentile,
            recommendations: recommendations(a),
            key_factors: key_factors(a),
        }
    }
}

fn feature(a: &Assessment, name: &str) -> f64 {
    a.features.get(name).unwrap_or(0.0)
}

/// Strategic suggestions based on what the bill lacks.
pub fn recommendations(a: &Assessment) -> Vec<String> {
    let mut out = Vec::new();
    if !a.gate.viable {
        if feature(a, "cosponsor_count") < 10.0 {
            out.push("Build a broader coalition: recruit at least 10 cosponsors".to_string());
        }
        if feature(a, "committee_count") == 0.0 {
            out.push("Secure a committee referral and hearing".to_string());
        }
        if feature(a, "has_bipartisan_support") == 0.0 {
            out.push("Seek cosponsors from across the aisle".to_string());
        }
        if feature(a, "is_stale") == 1.0 {
            out.push("Revive activity: no recent movement on this bill".to_string());
        }
    } else {
        if a.passage.as_ref().is_none_or(|p| p.point < 0.3) {
            out.push("Maintain momentum through committee markup".to_string());
            out.push("Build public and stakeholder support".to_string());
        }
        if feature(a, "committee_density") < 0.5 {
            out.push("Accelerate committee action".to_string());
        }
    }
    out
}

/// The first selected features of the viability model with sign-based impact.
pub fn key_factors(a: &Assessment) -> Vec<KeyFactor> {
    a.selected_features
        .iter()
        .take(KEY_FACTOR_COUNT)
        .map(|name| {
            let value = feature(a, name);
            let impact = if value > 0.0 {
                Impact::Positive
            } else if value < 0.0 {
                Impact::Negative
            } else {
                Impact::Neutral
            };
            KeyFactor {
                name: name.clone(),
                value,
                impact,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use legiscast_core::{NormalizedBill, aggregate};

    use crate::ensemble::PredictionResult;
    use crate::features::{FeatureVector, ProgressEvidence};
    use crate::gate::GatePolicy;
    use crate::stage::Stage;

    fn assessment(viability: f64, passage: Option<f64>) -> Assessment {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let bill = NormalizedBill::default();
        let metrics = aggregate(&bill.bill, &[], &[], &bill.subjects, today);
        let result = |p: f64| PredictionResult {
            point: p,
            low: (p - 0.15).max(0.0),
            high: (p + 0.15).min(1.0),
            base_scores: None,
            outside_base_range: false,
        };
        let gate = GatePolicy::default();
        let mut features = FeatureVector::new();
        features.set("party_balance", -0.5);
        features.set("action_count", 4.0);
        Assessment {
            bill,
            metrics,
            features,
            evidence: ProgressEvidence::default(),
            stage: Stage::EarlyStage,
            viability: result(viability),
            passage: passage.map(result),
            gate: gate.decide(viability, 0.5),
            overall_probability: gate.overall(viability, passage),
            viability_cv_std: 0.03,
            selected_features: vec![
                "action_count".into(),
                "party_balance".into(),
                "committee_count".into(),
            ],
        }
    }

    #[test]
    fn tiers() {
        assert_eq!(viability_tier(0.7), "Highly Viable");
        assert_eq!(viability_tier(0.5), "Viable");
        assert_eq!(viability_tier(0.3), "Marginal");
        assert_eq!(viability_tier(0.29), "Not Viable");
        assert_eq!(passage_tier(0.1), "Very Unlikely to Pass");
        assert_eq!(reliability(0.05), Level::Moderate);
        assert_eq!(confidence(0.2), Level::Moderate);
        assert_eq!(confidence(0.4), Level::Low);
        assert_eq!(percentile(0.021), "Top 2%");
    }

    #[test]
    fn non_viable_recommendations() {
        let recs = recommendations(&assessment(0.2, None));
        assert_eq!(recs.len(), 3);
        assert!(recs[0].contains("cosponsors"));
    }

    #[test]
    fn viable_recommendations() {
        let recs = recommendations(&assessment(0.8, Some(0.1)));
        assert_eq!(recs.len(), 3);
        assert!(recs[2].contains("committee action"));
    }

    #[test]
    fn insight_summary() {
        let i = Insights::from_assessment(&assessment(0.8, Some(0.6)));
        assert_eq!(i.model_reliability, Level::High);
        assert_eq!(i.prediction_confidence, Level::Moderate);
        assert_eq!(i.viability_tier, "Highly Viable");
        assert_eq!(i.passage_tier, Some("Possible Passage"));
        assert_eq!(i.percentile, "Top 48%");
        assert_eq!(i.progress, "In Progress");

        let impacts: Vec<Impact> = i.key_factors.iter().map(|k| k.impact).collect();
        assert_eq!(impacts, vec![Impact::Positive, Impact::Negative, Impact::Neutral]);
    }
}
