//! Validation of canonical drafts.
//!
//! Every check runs on every draft so a single pass reports all problems.
//! The only check needing I/O is email uniqueness, which consults the store.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::SportCatalog;
use crate::constants::{
    MAX_COURSE_LEN, MAX_NAME_LEN, MAX_NOTES_LEN, MAX_PARTNER_NAME_LEN, MAX_YEAR, MIN_YEAR,
};
use crate::domain::{Gender, Partner, Registration, Status};
use crate::error::{ErrorKind, ErrorSet, RegistrationError};
use crate::normalize::{Draft, FieldValue};
use crate::storage::RegistrationStore;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub const PARTNER_MISMATCH_MESSAGE: &str =
    "Each selected partner sport must have exactly one corresponding partner name";

/// Validates drafts against the sport catalog
#[derive(Debug, Clone)]
pub struct Validator {
    catalog: Arc<SportCatalog>,
}

impl Validator {
    pub fn new(catalog: Arc<SportCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SportCatalog {
        &self.catalog
    }

    /// Run every check that needs no storage access.
    ///
    /// On success the registration is `pending` with both timestamps set to `now`.
    pub fn validate_fields(&self, draft: &Draft, now: DateTime<Utc>) -> Result<Registration, ErrorSet> {
        let mut errors = ErrorSet::new();

        let name = check_text(&mut errors, "name", "Name", &draft.name, MAX_NAME_LEN);
        let email = check_email(&mut errors, &draft.email);
        let course = check_text(&mut errors, "course", "Course", &draft.course, MAX_COURSE_LEN);
        let year = check_year(&mut errors, &draft.year);
        let gender = check_gender(&mut errors, &draft.gender);
        let notes = check_notes(&mut errors, &draft.notes);
        self.check_sports(&mut errors, &draft.sports);
        self.check_partners(&mut errors, &draft.sports, &draft.partners);

        match (name, email, course, year, gender, notes) {
            (Some(name), Some(email), Some(course), Some(year), Some(gender), Some(notes))
                if errors.is_empty() =>
            {
                Ok(Registration {
                    id: None,
                    name,
                    email,
                    course,
                    year,
                    gender,
                    sports: draft.sports.clone(),
                    partners: draft.partners.clone(),
                    notes,
                    status: Status::Pending,
                    registration_date: now,
                    last_updated: now,
                })
            }
            _ => {
                debug!(failed_fields = errors.len(), "Draft failed validation");
                Err(errors)
            }
        }
    }

    /// Full validation, including the email uniqueness lookup.
    ///
    /// `exclude` names a registration allowed to already own the email, used
    /// when an administrator edits an existing record.
    pub async fn validate(
        &self,
        draft: &Draft,
        store: &dyn RegistrationStore,
        exclude: Option<Uuid>,
    ) -> Result<Registration, RegistrationError> {
        let checked = self.validate_fields(draft, Utc::now());

        let mut duplicate = false;
        if let Some(email) = draft.email.as_text().filter(|e| is_valid_email(e)) {
            if let Some(existing) = store.find_by_email(email).await? {
                duplicate = exclude.is_none() || existing.id != exclude;
            }
        }

        match (checked, duplicate) {
            (Ok(registration), false) => Ok(registration),
            (Ok(_), true) => Err(RegistrationError::Invalid(ErrorSet::duplicate_email())),
            (Err(mut errors), true) => {
                let duplicate = ErrorSet::duplicate_email();
                if let Some(error) = duplicate.get("email") {
                    errors.push("email", error.kind, error.message.clone());
                }
                Err(RegistrationError::Invalid(errors))
            }
            (Err(errors), false) => Err(RegistrationError::Invalid(errors)),
        }
    }

    fn check_sports(&self, errors: &mut ErrorSet, sports: &[String]) {
        if sports.is_empty() {
            errors.push("sports", ErrorKind::MissingField, "At least one sport must be selected");
            return;
        }

        let unknown: Vec<&str> = sports
            .iter()
            .filter(|s| !self.catalog.is_valid_sport(s))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            errors.push(
                "sports",
                ErrorKind::InvalidSport,
                format!("One or more selected sports are invalid: {}", unknown.join(", ")),
            );
            return;
        }

        let mut seen = std::collections::HashSet::new();
        if let Some(repeated) = sports.iter().find(|s| !seen.insert(s.as_str())) {
            errors.push(
                "sports",
                ErrorKind::InvalidFormat,
                format!("Sport '{}' was selected more than once", repeated),
            );
        }
    }

    /// Exactly one partner per selected partner sport, none for any other sport
    fn check_partners(&self, errors: &mut ErrorSet, sports: &[String], partners: &[Partner]) {
        let mut required: Vec<&str> = Vec::new();
        for sport in sports {
            if self.catalog.requires_partner(sport) && !required.contains(&sport.as_str()) {
                required.push(sport);
            }
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for partner in partners {
            *counts.entry(partner.sport.as_str()).or_default() += 1;
        }

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|s| !counts.contains_key(s))
            .collect();
        let repeated: Vec<&str> = counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(sport, _)| *sport)
            .collect();
        let orphaned: Vec<&str> = counts
            .keys()
            .copied()
            .filter(|s| !required.contains(s))
            .collect();

        let matches = partners.len() == required.len() && missing.is_empty() && repeated.is_empty();
        if !matches {
            let mut details = Vec::new();
            if !missing.is_empty() {
                details.push(format!("missing for {}", missing.join(", ")));
            }
            if !repeated.is_empty() {
                details.push(format!("more than one for {}", repeated.join(", ")));
            }
            if !orphaned.is_empty() {
                details.push(format!("not expected for {}", orphaned.join(", ")));
            }
            let message = if details.is_empty() {
                PARTNER_MISMATCH_MESSAGE.to_string()
            } else {
                format!("{} ({})", PARTNER_MISMATCH_MESSAGE, details.join("; "))
            };
            errors.push("partners", ErrorKind::PartnerMismatch, message);
        }

        for (index, partner) in partners.iter().enumerate() {
            if partner.name.chars().count() > MAX_PARTNER_NAME_LEN {
                errors.push(
                    format!("partners[{}].name", index),
                    ErrorKind::InvalidFormat,
                    "Partner name is too long",
                );
            }
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

fn check_text(
    errors: &mut ErrorSet,
    field: &str,
    label: &str,
    value: &FieldValue,
    max_len: usize,
) -> Option<String> {
    match value {
        FieldValue::Missing => {
            errors.push(field, ErrorKind::MissingField, format!("{} is required", label));
            None
        }
        FieldValue::Unsupported => {
            errors.push(field, ErrorKind::InvalidFormat, format!("{} must be a single value", label));
            None
        }
        FieldValue::Text(text) if text.chars().count() > max_len => {
            errors.push(
                field,
                ErrorKind::InvalidFormat,
                format!("{} cannot be more than {} characters", label, max_len),
            );
            None
        }
        FieldValue::Text(text) => Some(text.clone()),
    }
}

fn check_email(errors: &mut ErrorSet, value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Missing => {
            errors.push("email", ErrorKind::MissingField, "Email is required");
            None
        }
        FieldValue::Text(email) if is_valid_email(email) => Some(email.clone()),
        FieldValue::Text(_) | FieldValue::Unsupported => {
            errors.push("email", ErrorKind::InvalidFormat, "Please enter a valid email address");
            None
        }
    }
}

fn check_year(errors: &mut ErrorSet, value: &FieldValue) -> Option<u8> {
    let text = match value {
        FieldValue::Missing => {
            errors.push("year", ErrorKind::MissingField, "Year is required");
            return None;
        }
        FieldValue::Unsupported => {
            errors.push("year", ErrorKind::InvalidFormat, "Year must be a number");
            return None;
        }
        FieldValue::Text(text) => text,
    };

    let year: i64 = match text.parse() {
        Ok(year) => year,
        Err(_) => {
            errors.push("year", ErrorKind::InvalidFormat, "Year must be a number");
            return None;
        }
    };
    if year < MIN_YEAR {
        errors.push("year", ErrorKind::InvalidFormat, format!("Year must be at least {}", MIN_YEAR));
        return None;
    }
    if year > MAX_YEAR {
        errors.push("year", ErrorKind::InvalidFormat, format!("Year must be at most {}", MAX_YEAR));
        return None;
    }
    u8::try_from(year).ok()
}

fn check_gender(errors: &mut ErrorSet, value: &FieldValue) -> Option<Gender> {
    match value {
        FieldValue::Missing => {
            errors.push("gender", ErrorKind::MissingField, "Gender is required");
            None
        }
        FieldValue::Text(text) => match text.parse::<Gender>() {
            Ok(gender) => Some(gender),
            Err(_) => {
                errors.push("gender", ErrorKind::InvalidFormat, "Gender must be either boy or girl");
                None
            }
        },
        FieldValue::Unsupported => {
            errors.push("gender", ErrorKind::InvalidFormat, "Gender must be either boy or girl");
            None
        }
    }
}

/// Notes are optional, so a missing value passes as `Some(None)`
fn check_notes(errors: &mut ErrorSet, value: &FieldValue) -> Option<Option<String>> {
    match value {
        FieldValue::Missing => Some(None),
        FieldValue::Unsupported => {
            errors.push("notes", ErrorKind::InvalidFormat, "Notes must be text");
            None
        }
        FieldValue::Text(text) if text.chars().count() > MAX_NOTES_LEN => {
            errors.push(
                "notes",
                ErrorKind::InvalidFormat,
                format!("Notes cannot exceed {} characters", MAX_NOTES_LEN),
            );
            None
        }
        FieldValue::Text(text) => Some(Some(text.clone())),
    }
}
