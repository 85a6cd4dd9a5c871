//! Feature vector builder.
//!
//! Combines a normalized bill, its aggregated metrics, and the current date
//! into the fixed, named feature set the model bundles were trained on.
//! Every name in [`FEATURE_NAMES`] is always present; any value that would
//! be NaN or infinite is stored as 0.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;

use legiscast_core::{ActionRecord, BillMetrics, BillRecord, NormalizedBill};

use crate::labels::LabelEncoders;

pub const FEATURE_NAMES: &[&str] = &[
    "sponsor_party_encoded",
    "sponsor_count",
    "original_cosponsor_count",
    "cosponsor_count",
    "month_introduced",
    "quarter_introduced",
    "is_election_year",
    "title_length",
    "title_word_count",
    "title_complexity",
    "subject_count",
    "policy_area_encoded",
    "dem_total",
    "rep_total",
    "party_balance",
    "party_dominance",
    "bipartisan_score",
    "has_bipartisan_support",
    "total_sponsors",
    "is_fresh",
    "support_velocity",
    "cosponsor_growth",
    "days_active",
    "log_days_active",
    "sqrt_days_active",
    "action_count",
    "activity_rate",
    "normalized_activity",
    "early_activity",
    "is_active",
    "is_stale",
    "committee_count",
    "has_committee",
    "multi_committee",
    "committee_density",
    "bipartisan_momentum",
    "committee_activity",
];

/// One bill's features, keyed by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureVector {
    /// All known features at 0.
    pub fn new() -> Self {
        Self {
            values: FEATURE_NAMES.iter().map(|n| (n.to_string(), 0.0)).collect(),
        }
    }

    /// Store a value, coercing NaN and infinities to 0.
    pub fn set(&mut self, name: &str, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Raise a feature to at least `min`.
    pub fn floor(&mut self, name: &str, min: f64) {
        let current = self.get(name).unwrap_or(0.0);
        self.set(name, current.max(min));
    }

    /// Values for `names` in order; unknown names become 0.
    pub fn project(&self, names: &[String]) -> Vec<f64> {
        names
            .iter()
            .map(|n| self.get(n).filter(|v| v.is_finite()).unwrap_or(0.0))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ── Progress evidence ──

const LAW_STATUS: &[&str] = &["became law", "public law"];
const LAW_ACTIONS: &[&str] = &["became public law", "became law"];
const PASSED_HOUSE: &[&str] = &["passed house", "received in the senate"];
const PASSED_SENATE: &[&str] = &["passed senate", "received in the house"];

/// What the status and action texts say about how far the bill got.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressEvidence {
    pub became_law: bool,
    pub passed_house: bool,
    pub passed_senate: bool,
}

impl ProgressEvidence {
    /// Case-insensitive substring match over the latest-action text and the
    /// concatenated action history.
    pub fn detect(bill: &BillRecord, actions: &[ActionRecord]) -> Self {
        let status = bill.latest_action_text.to_lowercase();
        let history = actions
            .iter()
            .map(|a| a.text.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        let any = |text: &str, patterns: &[&str]| patterns.iter().any(|p| text.contains(p));

        Self {
            became_law: any(&status, LAW_STATUS) || any(&history, LAW_ACTIONS),
            passed_house: any(&status, PASSED_HOUSE) || any(&history, PASSED_HOUSE),
            passed_senate: any(&status, PASSED_SENATE) || any(&history, PASSED_SENATE),
        }
    }

    pub fn passed_chamber(&self) -> bool {
        self.passed_house || self.passed_senate
    }

    /// Short label for the furthest point reached.
    pub fn label(&self) -> &'static str {
        if self.became_law {
            "Became Law"
        } else if self.passed_house && self.passed_senate {
            "Passed Both Chambers"
        } else if self.passed_house {
            "Passed House"
        } else if self.passed_senate {
            "Passed Senate"
        } else {
            "In Progress"
        }
    }
}

// ── Builder ──

/// Builds feature vectors using a fixed set of fitted encoders.
pub struct FeatureBuilder<'a> {
    encoders: &'a LabelEncoders,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(encoders: &'a LabelEncoders) -> Self {
        Self { encoders }
    }

    pub fn build(
        &self,
        normalized: &NormalizedBill,
        metrics: &BillMetrics,
        today: NaiveDate,
    ) -> FeatureVector {
        let bill = &normalized.bill;
        let evidence = ProgressEvidence::detect(bill, &normalized.actions);
        let mut fv = FeatureVector::new();

        // Sponsorship
        let sponsor_count = bill.sponsors.len().max(1) as f64;
        let cosponsor_count = bill.cosponsor_count as f64;
        let total_sponsors = sponsor_count + cosponsor_count;
        fv.set(
            "sponsor_party_encoded",
            self.encoders.party.encode(bill.sponsor_party().code()),
        );
        fv.set("sponsor_count", sponsor_count);
        fv.set(
            "original_cosponsor_count",
            metrics.original_cosponsor_count as f64,
        );
        fv.set("cosponsor_count", cosponsor_count);
        fv.set("total_sponsors", total_sponsors);

        // Timing
        let month = bill.introduced_date.unwrap_or(today).month();
        fv.set("month_introduced", month as f64);
        fv.set("quarter_introduced", ((month - 1) / 3 + 1) as f64);
        fv.set("is_election_year", flag(today.year() % 4 == 0));

        // Content
        let title_length = bill.titles.length() as f64;
        let title_word_count = bill.titles.word_count() as f64;
        fv.set("title_length", title_length);
        fv.set("title_word_count", title_word_count);
        fv.set("title_complexity", title_length / (title_word_count + 1.0));
        fv.set("subject_count", metrics.subject_count as f64);
        fv.set(
            "policy_area_encoded",
            self.encoders.policy.encode(&bill.policy_area),
        );

        // Party dynamics
        let dem = metrics.dem_total as f64;
        let rep = metrics.rep_total as f64;
        let party_balance = (dem - rep) / (total_sponsors + 1.0);
        fv.set("dem_total", dem);
        fv.set("rep_total", rep);
        fv.set("party_balance", party_balance);
        fv.set("party_dominance", party_balance.abs());
        fv.set("bipartisan_score", metrics.bipartisan_score);
        fv.set("has_bipartisan_support", flag(bill.is_bipartisan));

        // Momentum
        let days = metrics.days_active as f64;
        let months = (days / 30.0).max(1.0);
        let total_actions = metrics.total_actions as f64;
        let committee_count = metrics.committee_count as f64;
        let normalized_activity = total_actions / days.ln_1p();
        fv.set("is_fresh", flag(days <= 30.0));
        fv.set("support_velocity", total_sponsors / days.sqrt());
        fv.set(
            "cosponsor_growth",
            (cosponsor_count - metrics.original_cosponsor_count as f64) / months,
        );
        fv.set("days_active", days);
        fv.set("log_days_active", days.ln_1p());
        fv.set("sqrt_days_active", days.sqrt());
        fv.set("action_count", total_actions);
        fv.set("activity_rate", metrics.activity_rate);
        fv.set("normalized_activity", normalized_activity);
        fv.set("early_activity", total_actions / (days.min(30.0) + 1.0));
        fv.set("is_active", flag(days <= 90.0));
        fv.set("is_stale", flag(days > 180.0));

        // Committees
        fv.set("committee_count", committee_count);
        fv.set("has_committee", flag(committee_count > 0.0));
        fv.set("multi_committee", flag(committee_count >= 2.0));
        fv.set("committee_density", committee_count / months);

        // Interactions
        fv.set(
            "bipartisan_momentum",
            metrics.bipartisan_score * fv.get("normalized_activity").unwrap_or(0.0),
        );
        fv.set("committee_activity", committee_count * metrics.activity_rate);

        apply_progress_overrides(&mut fv, &evidence);
        debug!(
            bill = %bill.id,
            days_active = metrics.days_active,
            progress = evidence.label(),
            "built feature vector"
        );
        fv
    }
}

/// Floor activity features for bills whose outcome is already known.
///
/// Runs after every derived feature so the floors are what the model sees.
pub fn apply_progress_overrides(fv: &mut FeatureVector, evidence: &ProgressEvidence) {
    if evidence.became_law {
        fv.floor("action_count", 50.0);
        fv.floor("committee_count", 5.0);
        fv.floor("activity_rate", 1.0);
        fv.floor("normalized_activity", 5.0);
        fv.set("is_stale", 0.0);
    } else if evidence.passed_chamber() {
        fv.floor("action_count", 20.0);
        fv.floor("committee_count", 3.0);
        fv.set("is_stale", 0.0);
    }
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legiscast_core::{BillId, Party, Sponsor, TitleInfo, aggregate};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn encoders() -> LabelEncoders {
        LabelEncoders {
            party: vec!["D".to_string(), "I".into(), "R".into()].into(),
            policy: vec!["Health".to_string(), "Taxation".into()].into(),
        }
    }

    fn bill(introduced: NaiveDate, status: &str) -> NormalizedBill {
        NormalizedBill {
            bill: BillRecord {
                id: BillId {
                    congress: Some(118),
                    bill_type: "HR".into(),
                    number: "1".into(),
                },
                titles: TitleInfo {
                    short: "Clean Water Act".into(),
                    ..Default::default()
                },
                introduced_date: Some(introduced),
                latest_action_text: status.into(),
                sponsors: vec![Sponsor {
                    name: "Rep. A".into(),
                    party: Party::Republican,
                    state: "OH".into(),
                }],
                policy_area: "Taxation".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn build(n: &NormalizedBill, today: NaiveDate) -> FeatureVector {
        let m = aggregate(&n.bill, &n.actions, &n.cosponsors, &n.subjects, today);
        FeatureBuilder::new(&encoders()).build(n, &m, today)
    }

    #[test]
    fn every_feature_present_and_finite() {
        let today = ymd(2024, 3, 10);
        let fv = build(&bill(today, ""), today);
        assert_eq!(fv.len(), FEATURE_NAMES.len());
        for name in FEATURE_NAMES {
            let v = fv.get(name).unwrap();
            assert!(v.is_finite(), "{name} = {v}");
        }
    }

    #[test]
    fn timing_follows_introduction_date() {
        let today = ymd(2025, 3, 10);
        let fv = build(&bill(ymd(2024, 11, 5), ""), today);
        assert_eq!(fv.get("month_introduced"), Some(11.0));
        assert_eq!(fv.get("quarter_introduced"), Some(4.0));
        assert_eq!(fv.get("is_election_year"), Some(0.0));

        let mut undated = bill(today, "");
        undated.bill.introduced_date = None;
        assert_eq!(build(&undated, today).get("month_introduced"), Some(3.0));
    }

    #[test]
    fn introduced_today() {
        let today = ymd(2024, 3, 10);
        let fv = build(&bill(today, "Introduced in House"), today);
        assert_eq!(fv.get("days_active"), Some(1.0));
        assert_eq!(fv.get("bipartisan_score"), Some(0.0));
        assert_eq!(fv.get("has_bipartisan_support"), Some(0.0));
        assert_eq!(fv.get("sponsor_party_encoded"), Some(2.0));
        assert_eq!(fv.get("policy_area_encoded"), Some(1.0));
        assert_eq!(fv.get("month_introduced"), Some(3.0));
        assert_eq!(fv.get("quarter_introduced"), Some(1.0));
        assert_eq!(fv.get("is_election_year"), Some(1.0));
        assert_eq!(fv.get("is_fresh"), Some(1.0));
        assert_eq!(fv.get("total_sponsors"), Some(1.0));
        // "Clean Water Act": 15 chars, 3 words
        assert_eq!(fv.get("title_length"), Some(15.0));
        assert!((fv.get("title_complexity").unwrap() - 15.0 / 4.0).abs() < 1e-12);
        // rep 1, dem 0: (0 - 1) / (1 + 1)
        assert_eq!(fv.get("party_balance"), Some(-0.5));
        assert_eq!(fv.get("party_dominance"), Some(0.5));
    }

    #[test]
    fn derived_formulas() {
        let today = ymd(2023, 6, 1);
        let mut n = bill(ymd(2023, 1, 1), "");
        n.bill.cosponsor_count = 4;
        n.bill.committees = vec!["Ways and Means".into(), "Budget".into()];
        n.actions = (0..10)
            .map(|_| ActionRecord {
                date: Some(ymd(2023, 2, 1)),
                text: "Referred".into(),
                ..Default::default()
            })
            .collect();
        let m = aggregate(&n.bill, &n.actions, &n.cosponsors, &n.subjects, today);
        let fv = FeatureBuilder::new(&encoders()).build(&n, &m, today);

        let days = 151.0_f64;
        let months = days / 30.0;
        assert_eq!(fv.get("days_active"), Some(days));
        assert!((fv.get("support_velocity").unwrap() - 5.0 / days.sqrt()).abs() < 1e-12);
        assert!((fv.get("cosponsor_growth").unwrap() - 4.0 / months).abs() < 1e-12);
        assert!((fv.get("normalized_activity").unwrap() - 10.0 / days.ln_1p()).abs() < 1e-12);
        assert!((fv.get("early_activity").unwrap() - 10.0 / 31.0).abs() < 1e-12);
        assert!((fv.get("committee_density").unwrap() - 2.0 / months).abs() < 1e-12);
        assert!((fv.get("committee_activity").unwrap() - 2.0 * 10.0 / days).abs() < 1e-12);
        assert_eq!(fv.get("multi_committee"), Some(1.0));
        assert_eq!(fv.get("is_active"), Some(0.0));
        assert_eq!(fv.get("is_stale"), Some(0.0));
        assert_eq!(fv.get("is_election_year"), Some(0.0));
    }

    #[test]
    fn zero_days_active_stays_finite() {
        let today = ymd(2024, 3, 10);
        let n = bill(today, "");
        let mut m = aggregate(&n.bill, &n.actions, &n.cosponsors, &n.subjects, today);
        m.days_active = 0;
        m.total_actions = 3;
        let fv = FeatureBuilder::new(&encoders()).build(&n, &m, today);
        for (name, v) in fv.iter() {
            assert!(v.is_finite(), "{name} = {v}");
        }
        assert_eq!(fv.get("support_velocity"), Some(0.0));
        assert_eq!(fv.get("normalized_activity"), Some(0.0));
    }

    #[test]
    fn became_law_overrides() {
        let today = ymd(2024, 3, 10);
        let fv = build(&bill(ymd(2023, 1, 1), "Became Public Law No: 118-5."), today);
        assert_eq!(fv.get("is_stale"), Some(0.0));
        assert_eq!(fv.get("action_count"), Some(50.0));
        assert_eq!(fv.get("committee_count"), Some(5.0));
        assert_eq!(fv.get("activity_rate"), Some(1.0));
        assert_eq!(fv.get("normalized_activity"), Some(5.0));
    }

    #[test]
    fn chamber_passed_overrides() {
        let today = ymd(2024, 3, 10);
        let mut n = bill(ymd(2023, 1, 1), "Referred to the Committee on Finance.");
        n.actions = vec![ActionRecord {
            text: "Received in the Senate.".into(),
            ..Default::default()
        }];
        let fv = build(&n, today);
        assert_eq!(fv.get("action_count"), Some(20.0));
        assert_eq!(fv.get("committee_count"), Some(3.0));
        assert_eq!(fv.get("is_stale"), Some(0.0));
    }

    #[test]
    fn overrides_never_lower_values() {
        let mut fv = FeatureVector::new();
        fv.set("action_count", 80.0);
        apply_progress_overrides(
            &mut fv,
            &ProgressEvidence {
                became_law: true,
                ..Default::default()
            },
        );
        assert_eq!(fv.get("action_count"), Some(80.0));
    }

    #[test]
    fn evidence_labels() {
        let b = BillRecord {
            latest_action_text: "Passed House by voice vote".into(),
            ..Default::default()
        };
        let actions = vec![ActionRecord {
            text: "Passed Senate without amendment".into(),
            ..Default::default()
        }];
        let e = ProgressEvidence::detect(&b, &actions);
        assert!(e.passed_house && e.passed_senate && !e.became_law);
        assert_eq!(e.label(), "Passed Both Chambers");
        assert_eq!(ProgressEvidence::default().label(), "In Progress");
    }

    #[test]
    fn unseen_categories_encode_to_zero() {
        let today = ymd(2024, 3, 10);
        let mut n = bill(today, "");
        n.bill.policy_area = "Space Exploration".into();
        n.bill.sponsors[0].party = Party::Other("Whig".into());
        let fv = build(&n, today);
        assert_eq!(fv.get("policy_area_encoded"), Some(0.0));
        assert_eq!(fv.get("sponsor_party_encoded"), Some(0.0));
    }

    #[test]
    fn projection_fills_unknown_names() {
        let mut fv = FeatureVector::new();
        fv.set("action_count", 7.0);
        fv.set("days_active", f64::INFINITY);
        let row = fv.project(&["action_count".into(), "not_a_feature".into(), "days_active".into()]);
        assert_eq!(row, vec![7.0, 0.0, 0.0]);
    }
}
