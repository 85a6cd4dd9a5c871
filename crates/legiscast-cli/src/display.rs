//! Vertical card display for predictions, bundles, and timelines.
//!
//! Feature values are grouped into the same sections the builder computes
//! them in; zero-valued sections are skipped.

use legiscast_ai::bundle::ModelBundle;
use legiscast_ai::{Assessment, BundleRegistry, BundleSlot, Insights, PredictionResult};
use legiscast_core::Timeline;

const MAX_TIMELINE_ENTRIES: usize = 10;

// ── Feature section groupings ──

const SPONSORSHIP: &[&str] = &[
    "sponsor_party_encoded",
    "sponsor_count",
    "original_cosponsor_count",
    "cosponsor_count",
    "total_sponsors",
];

const TIMING: &[&str] = &["month_introduced", "quarter_introduced", "is_election_year"];

const CONTENT: &[&str] = &[
    "title_length",
    "title_word_count",
    "title_complexity",
    "subject_count",
    "policy_area_encoded",
];

const PARTY: &[&str] = &[
    "dem_total",
    "rep_total",
    "party_balance",
    "party_dominance",
    "bipartisan_score",
    "has_bipartisan_support",
];

const MOMENTUM: &[&str] = &[
    "days_active",
    "is_fresh",
    "is_active",
    "is_stale",
    "support_velocity",
    "cosponsor_growth",
    "action_count",
    "activity_rate",
    "normalized_activity",
    "early_activity",
];

const COMMITTEES: &[&str] = &[
    "committee_count",
    "has_committee",
    "multi_committee",
    "committee_density",
    "committee_activity",
    "bipartisan_momentum",
];

// ── Public API ──

/// Print one prediction as a card.
pub fn print_assessment(a: &Assessment, insights: &Insights) {
    let bill = &a.bill.bill;
    println!("=== {} ===", bill.id);
    if let Some(title) = bill.titles.display_title() {
        println!("{title}");
    }
    println!();

    println!("Outlook");
    row("stage", format!("{} ({})", a.stage, a.stage.label()));
    row("progress", insights.progress);
    if a.enacted() {
        row("status", "enacted into law");
        row("displayed probability", pct(a.display_probability()));
        row("model overall probability", pct(a.overall_probability));
    } else {
        row("overall probability", pct(a.overall_probability));
    }
    row("percentile", &insights.percentile);
    println!();

    println!("Viability");
    print_result(&a.viability);
    row("tier", insights.viability_tier);
    row(
        "cutoff",
        format!(
            "{:.2} (bundle threshold {:.2}, {})",
            a.gate.cutoff_used,
            a.gate.bundle_threshold,
            if a.gate.passes_bundle_threshold {
                "passed"
            } else {
                "not passed"
            }
        ),
    );
    println!();

    println!("Passage");
    match &a.passage {
        Some(p) => {
            print_result(p);
            if let Some(tier) = insights.passage_tier {
                row("tier", tier);
            }
        }
        None => row("scored", "no (not viable)"),
    }
    println!();

    println!("Confidence");
    row("model reliability", insights.model_reliability.as_str());
    row("prediction confidence", insights.prediction_confidence.as_str());
    println!();

    print_section(a, "Sponsorship", SPONSORSHIP);
    print_section(a, "Timing", TIMING);
    print_section(a, "Content", CONTENT);
    print_section(a, "Party Dynamics", PARTY);
    print_section(a, "Momentum", MOMENTUM);
    print_section(a, "Committees", COMMITTEES);

    if !insights.key_factors.is_empty() {
        println!("Key Factors");
        for f in &insights.key_factors {
            println!("  {:<26} {:>10.3}  {:?}", f.name, f.value, f.impact);
        }
        println!();
    }

    if !insights.recommendations.is_empty() {
        println!("Recommendations");
        for r in &insights.recommendations {
            println!("  - {r}");
        }
    }
}

/// Print every bundle slot with its recorded performance.
pub fn print_models(registry: &BundleRegistry) {
    println!("Model bundles in {}", registry.dir().display());
    println!();
    println!(
        "  {:<10} {:<12} {:>8} {:>8} {:>8} {:>8} {:>8} {:>10} {:>9}",
        "task", "stage", "acc", "auc", "prec", "recall", "f1", "cv_auc", "threshold"
    );
    for (task, stage, slot) in registry.slots() {
        match slot {
            BundleSlot::Ready(b) => print_bundle_row(b),
            BundleSlot::Unavailable(reason) => {
                println!("  {:<10} {:<12} UNAVAILABLE: {reason}", task, stage);
            }
        }
    }

    let meta = registry.metadata().summary();
    println!();
    println!(
        "  encoders: {} party classes, {} policy areas; feature sets for {} stages",
        meta.party_classes, meta.policy_classes, meta.stages_with_feature_sets
    );
}

/// Print the newest timeline entries and the activity summary.
pub fn print_timeline(t: &Timeline) {
    println!();
    println!("Timeline");
    row("dated actions", t.entries.len());
    row("activity span (days)", t.span_days);
    row("last 30 days", t.recent_count);
    for e in t.entries.iter().take(MAX_TIMELINE_ENTRIES) {
        println!("  {}  {:>5}d ago  [{}] {}", e.date, e.days_ago, e.chamber, e.text);
    }
    if t.entries.len() > MAX_TIMELINE_ENTRIES {
        println!("  ... ({} more)", t.entries.len() - MAX_TIMELINE_ENTRIES);
    }
}

// ── Section rendering ──

fn print_section(a: &Assessment, header: &str, names: &[&str]) {
    let values: Vec<(&str, f64)> = names
        .iter()
        .filter_map(|&n| a.features.get(n).map(|v| (n, v)))
        .collect();
    if values.iter().all(|(_, v)| *v == 0.0) {
        return;
    }

    println!("{header}");
    for (name, v) in values {
        if v.fract() == 0.0 {
            println!("  {:<26} {}", name, v as i64);
        } else {
            println!("  {:<26} {:.3}", name, v);
        }
    }
    println!();
}

fn print_result(r: &PredictionResult) {
    row("point", pct(r.point));
    let source = if r.used_base_scores() {
        "base models"
    } else {
        "fallback spread"
    };
    row("range", format!("{} - {} ({source})", pct(r.low), pct(r.high)));
    if let Some(s) = &r.base_scores {
        row(
            "base scores",
            format!(
                "forest {:.3}, boosted {:.3}, linear {:.3}",
                s.forest, s.boosted, s.linear
            ),
        );
    }
    if r.outside_base_range {
        row("note", "calibrated estimate lies outside the base-model range");
    }
}

fn print_bundle_row(b: &ModelBundle) {
    let p = &b.performance;
    println!(
        "  {:<10} {:<12} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>8.3} {:>10} {:>9.3}",
        b.task.as_str(),
        b.stage.as_str(),
        p.accuracy,
        p.roc_auc,
        p.precision,
        p.recall,
        p.f1_score,
        format!("{:.3}±{:.3}", p.cv_roc_auc, p.cv_std),
        b.threshold
    );
}

fn row(label: &str, value: impl std::fmt::Display) {
    println!("  {:<26} {}", label, value);
}

fn pct(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}
