//! Summary counts derived from normalized records.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::days_between;
use crate::record::{ActionRecord, BillRecord, CosponsorRecord, Party, SubjectSet};

/// Aggregated metrics for one bill. Every field is always defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillMetrics {
    pub total_actions: u32,
    pub committee_count: u32,
    /// Whole days since introduction, floored at 1.
    pub days_active: i64,
    /// Whole days since the most recent dated action, 0 when there is none.
    pub days_since_last_action: i64,
    pub original_cosponsor_count: u32,
    pub subject_count: u32,
    pub dem_total: u32,
    pub rep_total: u32,
    pub bipartisan_score: f64,
    pub activity_rate: f64,
}

/// Balance of Democratic vs Republican participation.
///
/// `2 * min / (dem + rep)`: 1.0 at an even split, 0.0 when either side has
/// no participants (including when both are zero).
pub fn bipartisan_score(dem_total: u32, rep_total: u32) -> f64 {
    let total = dem_total as f64 + rep_total as f64;
    if total == 0.0 {
        return 0.0;
    }
    2.0 * dem_total.min(rep_total) as f64 / total
}

/// Aggregate metrics for a bill as of `today`.
pub fn aggregate(
    bill: &BillRecord,
    actions: &[ActionRecord],
    cosponsors: &[CosponsorRecord],
    subjects: &SubjectSet,
    today: NaiveDate,
) -> BillMetrics {
    let total_actions = actions.len() as u32;

    let committees: HashSet<&str> = bill
        .committees
        .iter()
        .chain(actions.iter().flat_map(|a| a.committees.iter()))
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();

    let days_active = bill
        .introduced_date
        .map(|d| days_between(d, today).max(1))
        .unwrap_or(1);

    let days_since_last_action = actions
        .iter()
        .filter_map(|a| a.date)
        .max()
        .map(|d| days_between(d, today).max(0))
        .unwrap_or(0);

    let original_cosponsor_count = cosponsors.iter().filter(|c| c.is_original).count() as u32;

    let parties = bill
        .sponsors
        .iter()
        .map(|s| &s.party)
        .chain(cosponsors.iter().map(|c| &c.party));
    let (mut dem_total, mut rep_total) = (0u32, 0u32);
    for party in parties {
        match party {
            Party::Democrat => dem_total += 1,
            Party::Republican => rep_total += 1,
            _ => {}
        }
    }

    BillMetrics {
        total_actions,
        committee_count: committees.len() as u32,
        days_active,
        days_since_last_action,
        original_cosponsor_count,
        subject_count: subjects.legislative_subjects.len() as u32,
        dem_total,
        rep_total,
        bipartisan_score: bipartisan_score(dem_total, rep_total),
        activity_rate: total_actions as f64 / days_active.max(1) as f64,
    }
}
