//! Normalization of raw registration submissions.
//!
//! Clients encode the same form in different shapes: `sports` arrives as one
//! string or a list, `partners` as a list of records (some JSON-encoded into
//! strings) or as an object keyed by sport id. Each shape is modelled as an
//! untagged serde enum and folded into one canonical [`Draft`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;
use tracing::debug;

use crate::domain::Partner;
use crate::error::{ErrorKind, ErrorSet};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Partner entry {index} could not be decoded: {reason}")]
    MalformedPartnerEncoding { index: usize, reason: String },
}

impl From<NormalizeError> for ErrorSet {
    fn from(error: NormalizeError) -> Self {
        match error {
            NormalizeError::MalformedPartnerEncoding { index, .. } => ErrorSet::single(
                "partners",
                ErrorKind::MalformedPartnerEncoding,
                format!("Partner entry {} could not be read, please re-enter it", index + 1),
            ),
        }
    }
}

/// A single-valued form field as it arrives on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Text(String),
    Number(Number),
    Other(Value),
}

/// The `sports` field: one selection or several
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSports {
    One(String),
    Many(Vec<Value>),
    Other(Value),
}

/// A partner name, either plain or wrapped in `{"name": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawName {
    Plain(String),
    Nested(Map<String, Value>),
    Other(Value),
}

impl RawName {
    /// Trimmed name, or `None` when blank or missing
    pub fn resolve(&self) -> Option<String> {
        match self {
            RawName::Plain(name) => non_blank(name),
            RawName::Nested(fields) => RawName::deserialize(fields.get("name")?).ok()?.resolve(),
            RawName::Other(_) => None,
        }
    }
}

/// A `{"sport": ..., "name": ...}` partner record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPartnerRecord {
    pub sport: Option<Value>,
    pub name: Option<RawName>,
}

impl RawPartnerRecord {
    /// Read the record's keys from a JSON object; other keys are ignored
    pub fn from_map(fields: &Map<String, Value>) -> Self {
        Self {
            sport: fields.get("sport").cloned(),
            name: fields
                .get("name")
                .and_then(|name| RawName::deserialize(name).ok()),
        }
    }
}

/// One element of a partner list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPartnerEntry {
    /// A record JSON-encoded into a string, as some form widgets post it
    Encoded(String),
    /// Only JSON objects; arrays land in `Other`
    Record(Map<String, Value>),
    Other(Value),
}

/// The `partners` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawPartners {
    Sequence(Vec<RawPartnerEntry>),
    /// Keyed by sport id; values are a name or `{"name": ...}`
    Mapping(Map<String, Value>),
    Other(Value),
}

/// The sport selection part of a submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSelection {
    pub sports: Option<RawSports>,
    pub partners: Option<RawPartners>,
}

/// A registration form submission before any cleanup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSubmission {
    pub name: Option<RawScalar>,
    pub email: Option<RawScalar>,
    pub course: Option<RawScalar>,
    pub year: Option<RawScalar>,
    pub gender: Option<RawScalar>,
    pub notes: Option<RawScalar>,
    #[serde(flatten)]
    pub selection: RawSelection,
}

impl RawSubmission {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

/// A scalar field after cleanup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    #[default]
    Missing,
    Text(String),
    /// A list, object or boolean where a single value was expected
    Unsupported,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Canonical `{sports, partners}` shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub sports: Vec<String>,
    pub partners: Vec<Partner>,
}

/// A submission in canonical, type-uniform shape, ready for validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub name: FieldValue,
    pub email: FieldValue,
    pub course: FieldValue,
    pub year: FieldValue,
    pub gender: FieldValue,
    pub notes: FieldValue,
    pub sports: Vec<String>,
    pub partners: Vec<Partner>,
}

/// Normalize a whole submission.
///
/// Fails only when a partner entry is encoded and cannot be decoded; every
/// other irregularity is left for the validator to report.
pub fn normalize(raw: &RawSubmission) -> Result<Draft, NormalizeError> {
    let selection = normalize_selection(&raw.selection)?;
    let email = match normalize_scalar(raw.email.as_ref()) {
        FieldValue::Text(email) => FieldValue::Text(email.to_lowercase()),
        other => other,
    };

    let draft = Draft {
        name: normalize_scalar(raw.name.as_ref()),
        email,
        course: normalize_scalar(raw.course.as_ref()),
        year: normalize_scalar(raw.year.as_ref()),
        gender: normalize_scalar(raw.gender.as_ref()),
        notes: normalize_scalar(raw.notes.as_ref()),
        sports: selection.sports,
        partners: selection.partners,
    };
    debug!(
        sports = draft.sports.len(),
        partners = draft.partners.len(),
        "Normalized submission"
    );
    Ok(draft)
}

pub fn normalize_selection(raw: &RawSelection) -> Result<Selection, NormalizeError> {
    Ok(Selection {
        sports: normalize_sports(raw.sports.as_ref()),
        partners: normalize_partners(raw.partners.as_ref())?,
    })
}

/// Trimmed, non-blank sport ids in submission order
pub fn normalize_sports(raw: Option<&RawSports>) -> Vec<String> {
    match raw {
        Some(RawSports::One(sport)) => non_blank(sport).into_iter().collect(),
        Some(RawSports::Many(items)) => items
            .iter()
            .filter_map(|item| item.as_str().and_then(non_blank))
            .collect(),
        Some(RawSports::Other(_)) | None => Vec::new(),
    }
}

/// Partner entries with both sport and name present, in submission order
pub fn normalize_partners(raw: Option<&RawPartners>) -> Result<Vec<Partner>, NormalizeError> {
    match raw {
        Some(RawPartners::Sequence(entries)) => {
            let mut partners = Vec::with_capacity(entries.len());
            for (index, entry) in entries.iter().enumerate() {
                let record = match entry {
                    RawPartnerEntry::Record(fields) => RawPartnerRecord::from_map(fields),
                    RawPartnerEntry::Encoded(encoded) => {
                        let fields = serde_json::from_str::<Map<String, Value>>(encoded).map_err(|e| {
                            NormalizeError::MalformedPartnerEncoding {
                                index,
                                reason: e.to_string(),
                            }
                        })?;
                        RawPartnerRecord::from_map(&fields)
                    }
                    RawPartnerEntry::Other(_) => continue,
                };
                if let Some(partner) = complete_partner(&record) {
                    partners.push(partner);
                }
            }
            Ok(partners)
        }
        Some(RawPartners::Mapping(by_sport)) => Ok(by_sport
            .iter()
            .filter_map(|(sport, value)| {
                let name = RawName::deserialize(value).ok()?.resolve()?;
                let sport = non_blank(sport)?;
                Some(Partner { sport, name })
            })
            .collect()),
        Some(RawPartners::Other(_)) | None => Ok(Vec::new()),
    }
}

fn complete_partner(record: &RawPartnerRecord) -> Option<Partner> {
    let sport = record.sport.as_ref()?.as_str().and_then(non_blank)?;
    let name = record.name.as_ref()?.resolve()?;
    Some(Partner { sport, name })
}

fn normalize_scalar(raw: Option<&RawScalar>) -> FieldValue {
    match raw {
        None | Some(RawScalar::Other(Value::Null)) => FieldValue::Missing,
        Some(RawScalar::Text(text)) => match non_blank(text) {
            Some(text) => FieldValue::Text(text),
            None => FieldValue::Missing,
        },
        Some(RawScalar::Number(number)) => FieldValue::Text(number.to_string()),
        Some(RawScalar::Other(_)) => FieldValue::Unsupported,
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn selection(value: Value) -> Result<Selection, NormalizeError> {
        let raw: RawSelection = serde_json::from_value(value).unwrap();
        normalize_selection(&raw)
    }

    #[test]
    fn test_sports_sequence_drops_blanks_and_keeps_order() {
        let result = selection(json!({"sports": [" chess-singles ", "", "  ", "cricket"]})).unwrap();
        assert_eq!(result.sports, vec!["chess-singles", "cricket"]);
    }

    #[test]
    fn test_single_sport_string() {
        let result = selection(json!({"sports": "relay"})).unwrap();
        assert_eq!(result.sports, vec!["relay"]);

        let blank = selection(json!({"sports": "   "})).unwrap();
        assert!(blank.sports.is_empty());
    }

    #[test]
    fn test_missing_or_odd_sports_are_empty() {
        assert!(selection(json!({})).unwrap().sports.is_empty());
        assert!(selection(json!({"sports": 7})).unwrap().sports.is_empty());
        assert!(selection(json!({"sports": {"a": 1}})).unwrap().sports.is_empty());
        assert_eq!(
            selection(json!({"sports": ["poetry", 3, null]})).unwrap().sports,
            vec!["poetry"]
        );
    }

    #[test]
    fn test_keyed_mapping_partner_is_trimmed() {
        let result = selection(json!({"partners": {"carrom-doubles": {"name": " Sam "}}})).unwrap();
        assert_eq!(result.partners, vec![Partner::new("carrom-doubles", "Sam")]);
    }

    #[test]
    fn test_keyed_mapping_accepts_plain_strings_and_skips_blanks() {
        let result = selection(json!({
            "partners": {
                "tabletennis-mixed": "Priya",
                "badminton-doubles": "   ",
                "carrom-doubles": {"name": ""},
                "badminton-mixed": {"nickname": "Jo"}
            }
        }))
        .unwrap();
        assert_eq!(result.partners, vec![Partner::new("tabletennis-mixed", "Priya")]);
    }

    #[test]
    fn test_keyed_mapping_keeps_submission_order() {
        let result = selection(json!({
            "partners": {"tabletennis-mixed": "B", "badminton-doubles": "A"}
        }))
        .unwrap();
        let sports: Vec<_> = result.partners.iter().map(|p| p.sport.as_str()).collect();
        assert_eq!(sports, vec!["tabletennis-mixed", "badminton-doubles"]);
    }

    #[test]
    fn test_sequence_partners_skip_incomplete_records() {
        let result = selection(json!({
            "partners": [
                {"sport": "badminton-doubles", "name": " Alex "},
                {"sport": "badminton-mixed"},
                {"sport": " ", "name": "Kim"},
                {"sport": "carrom-doubles", "name": {"name": "Lee"}},
                null
            ]
        }))
        .unwrap();
        assert_eq!(
            result.partners,
            vec![
                Partner::new("badminton-doubles", "Alex"),
                Partner::new("carrom-doubles", "Lee"),
            ]
        );
    }

    #[test]
    fn test_encoded_partner_entries_are_decoded() {
        let result = selection(json!({
            "partners": ["{\"sport\":\"tabletennis-doubles\",\"name\":\"Mo\"}"]
        }))
        .unwrap();
        assert_eq!(result.partners, vec![Partner::new("tabletennis-doubles", "Mo")]);
    }

    #[test]
    fn test_undecodable_partner_entry_is_a_hard_error() {
        let result = selection(json!({
            "partners": [
                {"sport": "badminton-doubles", "name": "Alex"},
                "{not json"
            ]
        }));
        match result {
            Err(NormalizeError::MalformedPartnerEncoding { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected malformed encoding, got {:?}", other),
        }
    }

    #[test]
    fn test_positional_arrays_are_not_partner_records() {
        let result = selection(json!({
            "partners": [
                ["badminton-doubles", "Alex"],
                {"sport": "carrom-doubles", "name": ["Lee"]},
                {"sport": "tabletennis-doubles", "name": {"name": ["Mo"]}}
            ]
        }))
        .unwrap();
        assert!(result.partners.is_empty());

        let mapped = selection(json!({"partners": {"carrom-doubles": ["Sam"]}})).unwrap();
        assert!(mapped.partners.is_empty());
    }

    #[test]
    fn test_encoded_entry_must_decode_to_an_object() {
        for encoded in ["[]", "[\"badminton-doubles\",\"Alex\"]", "\"Alex\"", "null"] {
            match selection(json!({"partners": [encoded]})) {
                Err(NormalizeError::MalformedPartnerEncoding { index, .. }) => assert_eq!(index, 0),
                other => panic!("expected malformed encoding for {}, got {:?}", encoded, other),
            }
        }
    }

    #[test]
    fn test_canonical_selection_is_unchanged() {
        let canonical = Selection {
            sports: vec!["badminton-doubles".to_string(), "cricket".to_string()],
            partners: vec![Partner::new("badminton-doubles", "Alex")],
        };
        let again = selection(serde_json::to_value(&canonical).unwrap()).unwrap();
        assert_eq!(again, canonical);
    }

    #[test]
    fn test_scalar_fields() {
        let raw = RawSubmission::from_value(json!({
            "name": "  Asha  ",
            "email": " Asha@Example.COM ",
            "course": "",
            "year": 2,
            "gender": ["boy"],
            "notes": null
        }))
        .unwrap();
        let draft = normalize(&raw).unwrap();
        assert_eq!(draft.name, FieldValue::text("Asha"));
        assert_eq!(draft.email, FieldValue::text("asha@example.com"));
        assert_eq!(draft.course, FieldValue::Missing);
        assert_eq!(draft.year, FieldValue::text("2"));
        assert_eq!(draft.gender, FieldValue::Unsupported);
        assert_eq!(draft.notes, FieldValue::Missing);
    }

    #[test]
    fn test_malformed_encoding_becomes_single_error() {
        let errors: ErrorSet = NormalizeError::MalformedPartnerEncoding {
            index: 0,
            reason: "eof".to_string(),
        }
        .into();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.kind_of("partners"), Some(ErrorKind::MalformedPartnerEncoding));
    }
}
