use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Message shown for a duplicate email, whether the pre-check or the store caught it
pub const DUPLICATE_EMAIL_MESSAGE: &str = "This email is already registered";

/// Category of a single field-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    MissingField,
    InvalidFormat,
    InvalidSport,
    PartnerMismatch,
    DuplicateEmail,
    MalformedPartnerEncoding,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingField => "missing_field",
            ErrorKind::InvalidFormat => "invalid_format",
            ErrorKind::InvalidSport => "invalid_sport",
            ErrorKind::PartnerMismatch => "partner_mismatch",
            ErrorKind::DuplicateEmail => "duplicate_email",
            ErrorKind::MalformedPartnerEncoding => "malformed_partner_encoding",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single failed check, with a message fit for the person filling in the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub kind: ErrorKind,
    pub message: String,
}

/// All field failures of one submission, keyed by field name.
///
/// The first failure recorded for a field wins; later ones for the same field
/// are dropped so the caller always gets one message per input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorSet {
    errors: BTreeMap<String, FieldError>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Error set holding exactly one failure
    pub fn single(field: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.push(field, kind, message);
        set
    }

    pub fn duplicate_email() -> Self {
        Self::single("email", ErrorKind::DuplicateEmail, DUPLICATE_EMAIL_MESSAGE)
    }

    pub fn push(&mut self, field: impl Into<String>, kind: ErrorKind, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert(FieldError {
            kind,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.errors.get(field)
    }

    pub fn kind_of(&self, field: &str) -> Option<ErrorKind> {
        self.errors.get(field).map(|e| e.kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, error) in &self.errors {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorSet {}

#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Registration rejected: {0}")]
    Invalid(ErrorSet),

    #[error("Registration not found: {0}")]
    NotFound(uuid::Uuid),

    /// Raised by a store when its uniqueness constraint on email rejects a write
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ErrorSet> for RegistrationError {
    fn from(errors: ErrorSet) -> Self {
        RegistrationError::Invalid(errors)
    }
}

impl RegistrationError {
    /// Fold a write-time duplicate into the same error set the pre-check produces
    pub fn into_submission_error(self) -> Self {
        match self {
            RegistrationError::DuplicateEmail(_) => {
                RegistrationError::Invalid(ErrorSet::duplicate_email())
            }
            other => other,
        }
    }

    /// Field errors carried by this error, if it is a validation failure
    pub fn field_errors(&self) -> Option<&ErrorSet> {
        match self {
            RegistrationError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
