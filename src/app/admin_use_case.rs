use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::catalog::SportCatalog;
use crate::domain::{Registration, RegistrationFilter, Status};
use crate::error::{ErrorKind, ErrorSet, RegistrationError, Result};
use crate::metrics::AdminMetrics;
use crate::normalize::{normalize, FieldValue, RawScalar, RawSubmission};
use crate::report::Roster;
use crate::storage::RegistrationStore;
use crate::validate::Validator;

/// An administrator's edit of a registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminUpdate {
    #[serde(flatten)]
    pub submission: RawSubmission,
    pub status: Option<RawScalar>,
}

/// Use case for the administrative side: listing, editing, deleting, exporting
pub struct AdminUseCase {
    store: Arc<dyn RegistrationStore>,
    validator: Validator,
}

impl AdminUseCase {
    pub fn new(store: Arc<dyn RegistrationStore>, catalog: Arc<SportCatalog>) -> Self {
        Self {
            store,
            validator: Validator::new(catalog),
        }
    }

    pub async fn list(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        let registrations = self.store.list_registrations(filter).await?;
        info!("Fetched registrations count: {}", registrations.len());
        Ok(registrations)
    }

    /// Replace a registration's details, keeping its id and registration date.
    ///
    /// The edit goes through the same normalization and validation as a new
    /// submission. Omitting `email` keeps the stored one; omitting `status`
    /// keeps the current status.
    pub async fn update(&self, id: Uuid, update: &AdminUpdate) -> Result<Registration> {
        let existing = self
            .store
            .get_registration(id)
            .await?
            .ok_or(RegistrationError::NotFound(id))?;

        let mut draft = normalize(&update.submission).map_err(ErrorSet::from)?;
        if draft.email == FieldValue::Missing {
            draft.email = FieldValue::Text(existing.email.clone());
        }

        let status = parse_status(update.status.as_ref());
        let validated = self.validator.validate(&draft, self.store.as_ref(), Some(id)).await;

        let (validated, status) = match (validated, status) {
            (Ok(validated), Ok(status)) => (validated, status),
            (Err(RegistrationError::Invalid(mut errors)), Err(status_error)) => {
                if let Some(error) = status_error.get("status") {
                    errors.push("status", error.kind, error.message.clone());
                }
                return Err(RegistrationError::Invalid(errors));
            }
            (Ok(_), Err(status_error)) => return Err(RegistrationError::Invalid(status_error)),
            (Err(e), _) => return Err(e),
        };

        let registration = Registration {
            id: Some(id),
            status: status.unwrap_or(existing.status),
            registration_date: existing.registration_date,
            last_updated: Utc::now(),
            ..validated
        };
        self.store
            .update_registration(&registration)
            .await
            .map_err(RegistrationError::into_submission_error)?;

        AdminMetrics::record_update();
        info!(%id, status = %registration.status, "Registration updated");
        Ok(registration)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_registration(id).await? {
            return Err(RegistrationError::NotFound(id));
        }
        AdminMetrics::record_delete();
        info!(%id, "Registration deleted");
        Ok(())
    }

    /// Roster of registrations matching `filter`, grouped by sport and year
    pub async fn export_roster(&self, filter: &RegistrationFilter) -> Result<Roster> {
        let registrations = self.store.list_registrations(filter).await?;
        let roster = Roster::build(&registrations, filter);
        AdminMetrics::record_export(roster.total);
        info!(total = roster.total, sports = roster.sports.len(), "Roster exported");
        Ok(roster)
    }
}

fn parse_status(raw: Option<&RawScalar>) -> std::result::Result<Option<Status>, ErrorSet> {
    let invalid = || {
        ErrorSet::single(
            "status",
            ErrorKind::InvalidFormat,
            "Status must be one of pending, approved, rejected, waitlisted",
        )
    };
    match raw {
        None | Some(RawScalar::Other(serde_json::Value::Null)) => Ok(None),
        Some(RawScalar::Text(text)) => text.trim().parse::<Status>().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
