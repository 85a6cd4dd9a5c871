//! Raw record normalizer: upstream JSON → flat, typed records.
//!
//! Every record kind (bill, action, cosponsor, sponsor, subject, text
//! version) goes through the same two steps: [`Collection::resolve`] flattens
//! the field to a sequence of objects, then [`FromRaw`] turns each object into
//! a record with safe defaults. Nothing in here returns an error; a field that
//! cannot be parsed comes out empty.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::dates::parse_date;
use crate::record::{
    ActionRecord, BillId, BillRecord, Chamber, CosponsorRecord, Party, Sponsor, SubjectSet,
    TextFormat, TextVersion, TitleInfo,
};
use crate::shape::{
    Collection, RawMap, field_bool, field_opt, field_str, field_u64, names, nested, nested_str,
};

/// Raw payloads from one upstream fetch, as returned by the bill-data API.
///
/// Each endpoint's payload may be either the bare value or the envelope the
/// API wraps it in (`{"bill": {...}}`, `{"actions": [...]}`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamBill {
    pub bill: Value,
    pub actions: Value,
    pub cosponsors: Value,
    pub subjects: Value,
    pub titles: Value,
    #[serde(alias = "textVersions")]
    pub text_versions: Value,
}

/// Everything the aggregator and feature builder need about one bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBill {
    pub bill: BillRecord,
    /// Ordered by date; actions with unparsable dates come last.
    pub actions: Vec<ActionRecord>,
    pub cosponsors: Vec<CosponsorRecord>,
    pub subjects: SubjectSet,
    pub text_versions: Vec<TextVersion>,
}

/// Shared context for record construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordContext {
    pub introduced: Option<NaiveDate>,
}

/// Construction of a record from one resolved upstream object.
pub trait FromRaw: Sized {
    fn from_raw(raw: &RawMap, ctx: &RecordContext) -> Option<Self>;
}

/// Resolve a collection field and convert every entry.
pub fn normalize_records<T: FromRaw>(value: Option<&Value>, ctx: &RecordContext) -> Vec<T> {
    Collection::resolve(value)
        .iter()
        .filter_map(|raw| T::from_raw(raw, ctx))
        .collect()
}

/// Normalize a full upstream fetch.
///
/// Returns `None` only when the bill payload itself is absent or empty;
/// partial data always yields a record with defaults.
pub fn normalize(upstream: &UpstreamBill) -> Option<NormalizedBill> {
    let bill_map = match unwrap_envelope(&upstream.bill, "bill") {
        Value::Object(map) if !map.is_empty() => map,
        _ => return None,
    };

    let introduced = parse_date(&field_str(bill_map, &["introducedDate", "introduced_date"]));
    let ctx = RecordContext { introduced };

    let mut actions: Vec<ActionRecord> =
        normalize_records(Some(unwrap_envelope(&upstream.actions, "actions")), &ctx);
    if actions.is_empty() {
        actions = normalize_records(bill_map.get("actions"), &ctx);
    }
    sort_actions(&mut actions);

    let mut cosponsors: Vec<CosponsorRecord> =
        normalize_records(Some(unwrap_envelope(&upstream.cosponsors, "cosponsors")), &ctx);
    if cosponsors.is_empty() {
        cosponsors = normalize_records(bill_map.get("cosponsors"), &ctx);
    }

    let subjects = normalize_subjects(unwrap_envelope(&upstream.subjects, "subjects"), bill_map);
    let titles = resolve_titles(bill_map, unwrap_envelope(&upstream.titles, "titles"));
    let text_versions: Vec<TextVersion> = normalize_records(
        Some(unwrap_envelope(&upstream.text_versions, "textVersions")),
        &ctx,
    );

    let bill = build_bill(bill_map, titles, &subjects, &cosponsors, introduced);

    debug!(
        bill = %bill.id,
        actions = actions.len(),
        cosponsors = cosponsors.len(),
        subjects = subjects.legislative_subjects.len(),
        text_versions = text_versions.len(),
        "normalized upstream bill"
    );

    Some(NormalizedBill {
        bill,
        actions,
        cosponsors,
        subjects,
        text_versions,
    })
}

fn build_bill(
    raw: &RawMap,
    titles: TitleInfo,
    subjects: &SubjectSet,
    cosponsors: &[CosponsorRecord],
    introduced: Option<NaiveDate>,
) -> BillRecord {
    let ctx = RecordContext { introduced };
    let sponsors: Vec<Sponsor> = normalize_records(
        ["sponsors", "sponsor"].iter().find_map(|k| raw.get(*k)),
        &ctx,
    );

    let bill_type = field_str(raw, &["type", "billType", "bill_type"]);
    let chamber = match Chamber::parse(&field_str(raw, &["originChamber", "chamber"])) {
        Chamber::Unknown => Chamber::parse(&bill_type),
        c => c,
    };

    let cosponsor_count = field_u64(raw, &["cosponsorCount", "cosponsor_count"])
        .or_else(|| {
            nested(raw, &["cosponsors"])
                .and_then(Value::as_object)
                .and_then(|m| field_u64(m, &["count"]))
        })
        .unwrap_or(cosponsors.len() as u64) as u32;

    let has_d = sponsors.iter().any(|s| s.party == Party::Democrat);
    let has_r = sponsors.iter().any(|s| s.party == Party::Republican);

    let mut committees = names(raw, &["committees", "committee"]);
    committees.dedup();

    let policy_area = if subjects.policy_area.is_empty() {
        policy_area_of(raw)
    } else {
        subjects.policy_area.clone()
    };

    BillRecord {
        id: BillId {
            congress: field_u64(raw, &["congress"]).map(|c| c as u32),
            bill_type,
            number: field_str(raw, &["number", "billNumber", "bill_number"]),
        },
        chamber,
        titles,
        introduced_date: introduced,
        latest_action_text: first_non_empty(&[
            nested_str(raw, &["latestAction", "text"]),
            field_str(raw, &["status", "latest_action_text"]),
        ]),
        latest_action_date: parse_date(&first_non_empty(&[
            nested_str(raw, &["latestAction", "actionDate"]),
            field_str(raw, &["latest_action_date"]),
        ])),
        sponsors,
        committees,
        policy_area,
        cosponsor_count,
        is_bipartisan: has_d && has_r,
    }
}

/// Apply the title resolution policy over the bill payload and the
/// dedicated titles endpoint. Titles-endpoint values win.
fn resolve_titles(bill: &RawMap, titles: &Value) -> TitleInfo {
    let mut info = TitleInfo {
        full: field_str(bill, &["title", "full_title"]),
        short: field_str(bill, &["shortTitle", "short_title"]),
        official: field_str(bill, &["officialTitle", "official_title"]),
        display: field_str(bill, &["displayTitle", "display_title"]),
    };

    let (mut short, mut display, mut official) = (None, None, None);
    for entry in Collection::resolve(Some(titles)).iter() {
        let kind = field_str(entry, &["titleType", "type"]).to_ascii_lowercase();
        let Some(text) = field_opt(entry, &["title", "name"]) else {
            continue;
        };
        let slot = if kind.contains("short title") {
            &mut short
        } else if kind.contains("display title") {
            &mut display
        } else if kind.contains("official title") {
            &mut official
        } else {
            continue;
        };
        // First entry of each kind wins.
        slot.get_or_insert(text);
    }

    if let Some(t) = short {
        info.short = t;
    }
    if let Some(t) = display {
        info.display = t;
    }
    if let Some(t) = official {
        info.official = t;
    }
    info
}

fn normalize_subjects(value: &Value, bill: &RawMap) -> SubjectSet {
    let Some(map) = value.as_object() else {
        return SubjectSet {
            policy_area: policy_area_of(bill),
            legislative_subjects: names(bill, &["subjects"]),
        };
    };
    let mut policy_area = policy_area_of(map);
    if policy_area.is_empty() {
        policy_area = policy_area_of(bill);
    }
    SubjectSet {
        policy_area,
        legislative_subjects: names(map, &["legislativeSubjects", "legislative_subjects"]),
    }
}

fn policy_area_of(map: &RawMap) -> String {
    first_non_empty(&[
        nested_str(map, &["policyArea", "name"]),
        field_str(map, &["policyArea", "policy_area"]),
    ])
}

/// Step into `{"key": inner}` when present, otherwise return the value as-is.
fn unwrap_envelope<'a>(value: &'a Value, key: &str) -> &'a Value {
    match value {
        Value::Object(map) => map.get(key).unwrap_or(value),
        _ => value,
    }
}

fn sort_actions(actions: &mut [ActionRecord]) {
    // Stable: same-day actions keep upstream order.
    actions.sort_by(|a, b| match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

fn first_non_empty(candidates: &[String]) -> String {
    candidates
        .iter()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_default()
}

fn person_name(raw: &RawMap) -> String {
    field_opt(raw, &["fullName", "name", "full_name"]).unwrap_or_else(|| {
        let first = field_str(raw, &["firstName", "first_name"]);
        let last = field_str(raw, &["lastName", "last_name"]);
        format!("{first} {last}").trim().to_string()
    })
}

// ── FromRaw impls ──

impl FromRaw for ActionRecord {
    fn from_raw(raw: &RawMap, _ctx: &RecordContext) -> Option<Self> {
        let raw_date = field_str(raw, &["actionDate", "date", "action_date"]);
        let text = field_str(raw, &["text", "description"]);
        // `{"count": N, "url": ...}` link objects carry neither.
        if raw_date.is_empty() && text.is_empty() {
            return None;
        }
        Some(Self {
            date: parse_date(&raw_date),
            raw_date,
            text,
            action_type: field_str(raw, &["type", "actionType", "action_type"]),
            action_code: field_str(raw, &["actionCode", "code", "action_code"]),
            source_chamber: first_non_empty(&[
                nested_str(raw, &["sourceSystem", "name"]),
                field_str(raw, &["sourceSystem", "chamber", "source_system"]),
            ]),
            committees: names(raw, &["committees", "committee"]),
        })
    }
}

impl FromRaw for CosponsorRecord {
    fn from_raw(raw: &RawMap, ctx: &RecordContext) -> Option<Self> {
        let name = person_name(raw);
        if name.is_empty() {
            return None;
        }
        let joined_date = parse_date(&field_str(
            raw,
            &["sponsorshipDate", "joined_date", "date"],
        ));
        let is_original = field_bool(raw, &["isOriginalCosponsor", "is_original"])
            .unwrap_or_else(|| joined_date.is_some() && joined_date == ctx.introduced);
        Some(Self {
            name,
            party: Party::parse(&field_str(raw, &["party", "partyName"])),
            state: field_str(raw, &["state"]),
            district: field_str(raw, &["district"]),
            joined_date,
            is_original,
        })
    }
}

impl FromRaw for Sponsor {
    fn from_raw(raw: &RawMap, _ctx: &RecordContext) -> Option<Self> {
        let name = person_name(raw);
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name,
            party: Party::parse(&field_str(raw, &["party", "partyName"])),
            state: field_str(raw, &["state"]),
        })
    }
}

impl FromRaw for TextFormat {
    fn from_raw(raw: &RawMap, _ctx: &RecordContext) -> Option<Self> {
        Some(Self {
            kind: field_str(raw, &["type", "name"]),
            url: field_str(raw, &["url"]),
        })
    }
}

impl FromRaw for TextVersion {
    fn from_raw(raw: &RawMap, ctx: &RecordContext) -> Option<Self> {
        Some(Self {
            date: parse_date(&field_str(raw, &["date"])),
            kind: field_str(raw, &["type", "name"]),
            formats: normalize_records(raw.get("formats"), ctx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn full_upstream() -> UpstreamBill {
        UpstreamBill {
            bill: json!({"bill": {
                "congress": 118,
                "type": "HR",
                "number": "1234",
                "title": "To amend the Internal Revenue Code to provide relief.",
                "introducedDate": "2023-03-01",
                "latestAction": {"actionDate": "2023-06-01", "text": "Passed House by voice vote."},
                "sponsors": [{"fullName": "Rep. Smith, Jane [D-CA-12]", "party": "D", "state": "CA"}],
                "committees": {"count": 2, "url": "https://example.test/committees"},
                "cosponsors": {"count": 3},
                "policyArea": {"name": "Taxation"}
            }}),
            actions: json!({"actions": [
                {"actionDate": "2023-06-01", "text": "Passed House by voice vote.", "type": "Floor",
                 "sourceSystem": {"name": "House floor actions"}},
                {"actionDate": "2023-03-01", "text": "Introduced in House", "type": "IntroReferral",
                 "committees": {"item": {"name": "Ways and Means Committee"}}},
                {"actionDate": "not a date", "text": "Garbled"}
            ]}),
            cosponsors: json!({"cosponsors": [
                {"fullName": "Rep. Doe, John [R-TX-3]", "party": "R", "state": "TX",
                 "district": 3, "sponsorshipDate": "2023-03-01", "isOriginalCosponsor": true},
                {"fullName": "Rep. Roe, Ann [D-NY-7]", "party": "D", "state": "NY",
                 "sponsorshipDate": "2023-03-01"},
                {"fullName": "Rep. Poe, Ed [I-VT-1]", "party": "I", "state": "VT",
                 "sponsorshipDate": "2023-04-15"}
            ]}),
            subjects: json!({"subjects": {
                "legislativeSubjects": [{"name": "Income tax"}, {"name": "Tax credits"}],
                "policyArea": {"name": "Taxation"}
            }}),
            titles: json!({"titles": [
                {"titleType": "Display Title", "title": "Tax Relief Act"},
                {"titleType": "Short Titles as Introduced", "title": "Tax Relief Act of 2023"}
            ]}),
            text_versions: json!({"textVersions": [
                {"date": "2023-03-01T04:00:00Z", "type": "Introduced in House",
                 "formats": [{"type": "PDF", "url": "https://example.test/a.pdf"}]}
            ]}),
        }
    }

    #[test]
    fn normalizes_full_fetch() {
        let n = normalize(&full_upstream()).unwrap();
        assert_eq!(n.bill.id.congress, Some(118));
        assert_eq!(n.bill.id.number, "1234");
        assert_eq!(n.bill.chamber, Chamber::House);
        assert_eq!(n.bill.introduced_date, Some(ymd(2023, 3, 1)));
        assert_eq!(n.bill.latest_action_date, Some(ymd(2023, 6, 1)));
        assert_eq!(n.bill.cosponsor_count, 3);
        assert_eq!(n.bill.policy_area, "Taxation");
        assert!(!n.bill.is_bipartisan, "cosponsor parties do not count");
        assert!(n.bill.committees.is_empty(), "count-only wrapper has no names");

        assert_eq!(n.actions.len(), 3);
        assert_eq!(n.actions[0].text, "Introduced in House");
        assert_eq!(n.actions[0].committees, vec!["Ways and Means Committee"]);
        assert_eq!(n.actions[1].source_chamber, "House floor actions");
        assert_eq!(n.actions[2].date, None, "unparsable dates sort last");
        assert_eq!(n.actions[2].raw_date, "not a date");

        assert_eq!(n.cosponsors.len(), 3);
        assert_eq!(n.cosponsors[0].district, "3");
        assert!(n.cosponsors[0].is_original);
        assert!(n.cosponsors[1].is_original, "joined on introduction day");
        assert!(!n.cosponsors[2].is_original);

        assert_eq!(n.subjects.legislative_subjects.len(), 2);
        assert_eq!(n.text_versions.len(), 1);
        assert_eq!(n.text_versions[0].formats[0].kind, "PDF");
    }

    #[test]
    fn titles_endpoint_short_title_preferred() {
        let n = normalize(&full_upstream()).unwrap();
        assert_eq!(n.bill.titles.short, "Tax Relief Act of 2023");
        assert_eq!(n.bill.titles.display, "Tax Relief Act");
        assert_eq!(
            n.bill.titles.display_title().as_deref(),
            Some("Tax Relief Act of 2023")
        );
    }

    #[test]
    fn empty_bill_is_none() {
        assert!(normalize(&UpstreamBill::default()).is_none());
        let up = UpstreamBill {
            bill: json!({"bill": {}}),
            ..Default::default()
        };
        assert!(normalize(&up).is_none());
    }

    #[test]
    fn minimal_bill_degrades_to_defaults() {
        let up = UpstreamBill {
            bill: json!({"number": 7, "sponsors": "Sen. Lone"}),
            ..Default::default()
        };
        let n = normalize(&up).unwrap();
        assert_eq!(n.bill.id.number, "7");
        assert_eq!(n.bill.sponsors.len(), 1);
        assert_eq!(n.bill.sponsors[0].party, Party::Unknown);
        assert_eq!(n.bill.introduced_date, None);
        assert_eq!(n.bill.cosponsor_count, 0);
        assert!(!n.bill.is_bipartisan);
        assert!(n.actions.is_empty());
        assert!(n.bill.titles.display_title().is_none());
    }

    #[test]
    fn sponsor_shape_variants_are_equivalent() {
        let variants = [
            json!({"sponsors": {"fullName": "Rep. A", "party": "R"}}),
            json!({"sponsors": [{"fullName": "Rep. A", "party": "R"}]}),
            json!({"sponsors": {"item": [{"fullName": "Rep. A", "party": "R"}]}}),
        ];
        let records: Vec<BillRecord> = variants
            .into_iter()
            .map(|bill| {
                normalize(&UpstreamBill {
                    bill,
                    ..Default::default()
                })
                .unwrap()
                .bill
            })
            .collect();
        assert_eq!(records[0].sponsors, records[1].sponsors);
        assert_eq!(records[1].sponsors, records[2].sponsors);
    }

    #[test]
    fn cosponsors_fall_back_to_bill_payload() {
        let up = UpstreamBill {
            bill: json!({
                "sponsors": [{"fullName": "Rep. A", "party": "D"}],
                "cosponsors": [{"firstName": "B", "lastName": "Bee", "party": "R"}]
            }),
            ..Default::default()
        };
        let n = normalize(&up).unwrap();
        assert_eq!(n.cosponsors.len(), 1);
        assert_eq!(n.cosponsors[0].name, "B Bee");
        assert_eq!(n.bill.cosponsor_count, 1);
        assert!(!n.bill.is_bipartisan);
    }

    #[test]
    fn bipartisan_needs_sponsors_from_both_parties() {
        let up = UpstreamBill {
            bill: json!({
                "sponsors": [
                    {"fullName": "Rep. A", "party": "D"},
                    {"fullName": "Rep. B", "party": "R"}
                ]
            }),
            ..Default::default()
        };
        assert!(normalize(&up).unwrap().bill.is_bipartisan);
    }

    #[test]
    fn count_only_actions_link_yields_no_actions() {
        let up = UpstreamBill {
            bill: json!({"bill": {
                "number": "42",
                "introducedDate": "2024-05-01",
                "actions": {"count": 0, "url": "https://example.test/actions"}
            }}),
            ..Default::default()
        };
        let n = normalize(&up).unwrap();
        assert!(n.actions.is_empty());

        let today = ymd(2024, 5, 1);
        let m = crate::metrics::aggregate(&n.bill, &n.actions, &n.cosponsors, &n.subjects, today);
        assert_eq!(m.total_actions, 0);
    }

    #[test]
    fn same_day_actions_keep_upstream_order() {
        let up = UpstreamBill {
            bill: json!({"number": "1"}),
            actions: json!([
                {"actionDate": "2024-02-02", "text": "second day"},
                {"actionDate": "2024-02-01", "text": "first a"},
                {"actionDate": "2024-02-01", "text": "first b"}
            ]),
            ..Default::default()
        };
        let texts: Vec<String> = normalize(&up)
            .unwrap()
            .actions
            .into_iter()
            .map(|a| a.text)
            .collect();
        assert_eq!(texts, vec!["first a", "first b", "second day"]);
    }

    #[test]
    fn upstream_deserializes_camel_case_text_versions() {
        let up: UpstreamBill =
            serde_json::from_value(json!({"bill": {"number": "1"}, "textVersions": []})).unwrap();
        assert!(up.text_versions.is_array());
        assert!(up.actions.is_null());
    }
}
