//! Normalized legislative record types.
//!
//! Every record is built once by [`crate::normalize`] from one upstream fetch
//! and is immutable afterwards. All string fields default to empty and all
//! dates are optional: a record never fails to exist because a field was
//! missing upstream.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Display titles longer than this are truncated with an ellipsis.
pub const DISPLAY_TITLE_MAX: usize = 100;

/// Title length used when a bill has no title at all.
pub const DEFAULT_TITLE_LENGTH: usize = 100;

/// Title word count used when a bill has no title at all.
pub const DEFAULT_TITLE_WORDS: usize = 20;

/// Party affiliation of a sponsor or cosponsor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Party {
    Democrat,
    Republican,
    Independent,
    Other(String),
    Unknown,
}

impl Party {
    /// Parse a party code or name (`"D"`, `"Democratic"`, `"R"`, `"ID"`, ...).
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim().to_ascii_uppercase();
        match s.as_str() {
            "" | "UNKNOWN" => Self::Unknown,
            "D" | "DEM" => Self::Democrat,
            "R" | "REP" | "GOP" => Self::Republican,
            "I" | "ID" | "IND" => Self::Independent,
            _ if s.starts_with("DEMOCRAT") => Self::Democrat,
            _ if s.starts_with("REPUBLICAN") => Self::Republican,
            _ if s.starts_with("INDEPENDENT") => Self::Independent,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Short code as used by the training vocabulary.
    pub fn code(&self) -> &str {
        match self {
            Self::Democrat => "D",
            Self::Republican => "R",
            Self::Independent => "I",
            Self::Other(s) => s,
            Self::Unknown => "Unknown",
        }
    }
}

impl From<String> for Party {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Party> for String {
    fn from(p: Party) -> Self {
        p.code().to_string()
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Originating chamber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chamber {
    House,
    Senate,
    #[default]
    Unknown,
}

impl Chamber {
    /// Parse an explicit chamber name, or infer it from a bill type code.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim().to_ascii_uppercase();
        match s.as_str() {
            "HOUSE" | "H" | "HR" | "HRES" | "HJRES" | "HCONRES" => Self::House,
            "SENATE" | "S" | "SRES" | "SJRES" | "SCONRES" => Self::Senate,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Senate => "senate",
            Self::Unknown => "unknown",
        }
    }
}

/// Congress / type / number triple identifying a bill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillId {
    pub congress: Option<u32>,
    pub bill_type: String,
    pub number: String,
}

impl fmt::Display for BillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.bill_type.is_empty() {
            "BILL".to_string()
        } else {
            self.bill_type.to_ascii_uppercase()
        };
        match self.congress {
            Some(c) => write!(f, "{kind}.{} ({c}th Congress)", self.number),
            None => write!(f, "{kind}.{}", self.number),
        }
    }
}

/// A bill sponsor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sponsor {
    pub name: String,
    pub party: Party,
    pub state: String,
}

/// The title variants a bill may carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleInfo {
    pub full: String,
    pub short: String,
    pub official: String,
    pub display: String,
}

impl TitleInfo {
    /// Title for presentation: short, then display, then the full title
    /// truncated to [`DISPLAY_TITLE_MAX`] characters with an ellipsis.
    pub fn display_title(&self) -> Option<String> {
        if !self.short.is_empty() {
            return Some(self.short.clone());
        }
        if !self.display.is_empty() {
            return Some(self.display.clone());
        }
        let full = self.full_or_official();
        if full.is_empty() {
            return None;
        }
        if full.chars().count() > DISPLAY_TITLE_MAX {
            let cut: String = full.chars().take(DISPLAY_TITLE_MAX).collect();
            Some(format!("{cut}..."))
        } else {
            Some(full.to_string())
        }
    }

    /// Title used for the length-derived features (untruncated).
    pub fn feature_title(&self) -> Option<&str> {
        [self.short.as_str(), self.display.as_str(), self.full_or_official()]
            .into_iter()
            .find(|t| !t.is_empty())
    }

    /// Character length of [`feature_title`](Self::feature_title), or the fixed default.
    pub fn length(&self) -> usize {
        self.feature_title()
            .map(|t| t.chars().count())
            .unwrap_or(DEFAULT_TITLE_LENGTH)
    }

    /// Whitespace word count of [`feature_title`](Self::feature_title), or the fixed default.
    pub fn word_count(&self) -> usize {
        self.feature_title()
            .map(|t| t.split_whitespace().count())
            .unwrap_or(DEFAULT_TITLE_WORDS)
    }

    fn full_or_official(&self) -> &str {
        if self.full.is_empty() {
            &self.official
        } else {
            &self.full
        }
    }
}

/// One row per bill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillRecord {
    pub id: BillId,
    pub chamber: Chamber,
    pub titles: TitleInfo,
    pub introduced_date: Option<NaiveDate>,
    pub latest_action_text: String,
    pub latest_action_date: Option<NaiveDate>,
    pub sponsors: Vec<Sponsor>,
    pub committees: Vec<String>,
    pub policy_area: String,
    pub cosponsor_count: u32,
    /// At least one Democrat and one Republican among the sponsors.
    pub is_bipartisan: bool,
}

impl BillRecord {
    /// Party of the primary sponsor.
    pub fn sponsor_party(&self) -> Party {
        self.sponsors
            .first()
            .map(|s| s.party.clone())
            .unwrap_or(Party::Unknown)
    }

    /// Comma-joined sponsor names.
    pub fn sponsor_names(&self) -> String {
        self.sponsors
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One row per legislative action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// `None` when the upstream date was unparsable.
    pub date: Option<NaiveDate>,
    pub raw_date: String,
    pub text: String,
    pub action_type: String,
    pub action_code: String,
    pub source_chamber: String,
    pub committees: Vec<String>,
}

/// One row per cosponsor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosponsorRecord {
    pub name: String,
    pub party: Party,
    pub state: String,
    pub district: String,
    pub joined_date: Option<NaiveDate>,
    pub is_original: bool,
}

/// Policy area and legislative subject terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectSet {
    pub policy_area: String,
    pub legislative_subjects: Vec<String>,
}

/// A published text format (PDF, XML, formatted text).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFormat {
    pub kind: String,
    pub url: String,
}

/// A published version of the bill text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextVersion {
    pub date: Option<NaiveDate>,
    pub kind: String,
    pub formats: Vec<TextFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_parse_codes_and_names() {
        assert_eq!(Party::parse("D"), Party::Democrat);
        assert_eq!(Party::parse("democratic"), Party::Democrat);
        assert_eq!(Party::parse(" R "), Party::Republican);
        assert_eq!(Party::parse("Republican"), Party::Republican);
        assert_eq!(Party::parse("ID"), Party::Independent);
        assert_eq!(Party::parse(""), Party::Unknown);
        assert_eq!(Party::parse("L"), Party::Other("L".into()));
    }

    #[test]
    fn party_serde_as_code() {
        let json = serde_json::to_string(&Party::Democrat).unwrap();
        assert_eq!(json, "\"D\"");
        let parsed: Party = serde_json::from_str("\"Republican\"").unwrap();
        assert_eq!(parsed, Party::Republican);

        let json = serde_json::to_string(&Party::Unknown).unwrap();
        let back: Party = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Party::Unknown);
    }

    #[test]
    fn chamber_from_bill_type() {
        assert_eq!(Chamber::parse("hr"), Chamber::House);
        assert_eq!(Chamber::parse("SJRES"), Chamber::Senate);
        assert_eq!(Chamber::parse("Senate"), Chamber::Senate);
        assert_eq!(Chamber::parse("xyz"), Chamber::Unknown);
    }

    #[test]
    fn bill_id_display() {
        let id = BillId {
            congress: Some(118),
            bill_type: "hr".into(),
            number: "1234".into(),
        };
        assert_eq!(id.to_string(), "HR.1234 (118th Congress)");
    }

    #[test]
    fn display_title_prefers_short() {
        let t = TitleInfo {
            full: "A bill to do many things".into(),
            short: "Do Things Act".into(),
            display: "Display".into(),
            ..Default::default()
        };
        assert_eq!(t.display_title().as_deref(), Some("Do Things Act"));
        assert_eq!(t.length(), 13);
        assert_eq!(t.word_count(), 3);
    }

    #[test]
    fn display_title_falls_back_to_display_then_truncated_full() {
        let t = TitleInfo {
            full: "x".repeat(150),
            display: "Shown".into(),
            ..Default::default()
        };
        assert_eq!(t.display_title().as_deref(), Some("Shown"));

        let t = TitleInfo {
            full: "x".repeat(150),
            ..Default::default()
        };
        let shown = t.display_title().unwrap();
        assert_eq!(shown.len(), 103);
        assert!(shown.ends_with("..."));
        // Features use the untruncated title.
        assert_eq!(t.length(), 150);
    }

    #[test]
    fn no_title_uses_fixed_defaults() {
        let t = TitleInfo::default();
        assert!(t.display_title().is_none());
        assert_eq!(t.length(), DEFAULT_TITLE_LENGTH);
        assert_eq!(t.word_count(), DEFAULT_TITLE_WORDS);
    }

    #[test]
    fn sponsor_party_defaults_unknown() {
        let bill = BillRecord::default();
        assert_eq!(bill.sponsor_party(), Party::Unknown);
    }
}
