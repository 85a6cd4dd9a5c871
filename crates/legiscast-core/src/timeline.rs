//! Legislative activity timeline.
//!
//! Dated actions only, newest first, with exact duplicates (same day and
//! same text) dropped. Undated actions stay in the raw record list but never
//! appear here.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::days_between;
use crate::record::ActionRecord;

/// Maximum characters of action text kept per entry.
const MAX_TEXT: usize = 200;

/// Window for the "recent actions" count.
const RECENT_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub text: String,
    pub days_ago: i64,
    pub chamber: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    /// Days between the earliest and latest entry.
    pub span_days: i64,
    /// Entries dated within the last 30 days.
    pub recent_count: usize,
}

pub fn build_timeline(actions: &[ActionRecord], today: NaiveDate) -> Timeline {
    let mut dated: Vec<(NaiveDate, &ActionRecord)> = actions
        .iter()
        .filter_map(|a| a.date.map(|d| (d, a)))
        .collect();
    // Stable sort keeps upstream order among same-day actions.
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    let mut seen: HashSet<(NaiveDate, &str)> = HashSet::new();
    let entries: Vec<TimelineEntry> = dated
        .into_iter()
        .filter(|(d, a)| seen.insert((*d, a.text.as_str())))
        .map(|(date, a)| TimelineEntry {
            date,
            text: truncate(a.text.trim()),
            days_ago: days_between(date, today),
            chamber: if a.source_chamber.is_empty() {
                "Congress".to_string()
            } else {
                a.source_chamber.clone()
            },
        })
        .collect();

    let span_days = match (entries.last(), entries.first()) {
        (Some(oldest), Some(newest)) => days_between(oldest.date, newest.date),
        _ => 0,
    };
    let recent_count = entries
        .iter()
        .filter(|e| e.days_ago < RECENT_DAYS)
        .count();

    Timeline {
        entries,
        span_days,
        recent_count,
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_TEXT {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_TEXT - 3).collect();
    format!("{cut}...")
}
