use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::catalog::SportCatalog;
use crate::domain::Registration;
use crate::error::{ErrorKind, ErrorSet, RegistrationError, Result};
use crate::metrics::RegistrationMetrics;
use crate::normalize::{normalize, RawSubmission};
use crate::storage::RegistrationStore;
use crate::validate::Validator;

/// Use case for turning a form submission into a stored registration
pub struct SubmitUseCase {
    store: Arc<dyn RegistrationStore>,
    validator: Validator,
}

impl SubmitUseCase {
    pub fn new(store: Arc<dyn RegistrationStore>, catalog: Arc<SportCatalog>) -> Self {
        Self {
            store,
            validator: Validator::new(catalog),
        }
    }

    pub fn catalog(&self) -> &SportCatalog {
        self.validator.catalog()
    }

    /// Normalize and validate a submission without storing it.
    ///
    /// Validation failures come back as `RegistrationError::Invalid`; a store
    /// failure during the email lookup is passed through unchanged.
    pub async fn normalize_and_validate(&self, raw: &RawSubmission) -> Result<Registration> {
        let draft = normalize(raw).map_err(|e| {
            debug!("Submission shape could not be normalized: {}", e);
            RegistrationError::Invalid(ErrorSet::from(e))
        })?;
        self.validator.validate(&draft, self.store.as_ref(), None).await
    }

    /// Validate and store a submission.
    ///
    /// Nothing is written unless every check passes. A duplicate email caught
    /// by the store's write-time constraint is reported exactly like one caught
    /// by the lookup.
    pub async fn submit(&self, raw: &RawSubmission) -> Result<Registration> {
        let started = Instant::now();

        let mut registration = match self.normalize_and_validate(raw).await {
            Ok(registration) => registration,
            Err(RegistrationError::Invalid(errors)) => {
                record_rejection(&errors);
                return Err(RegistrationError::Invalid(errors));
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = self.store.create_registration(&mut registration).await {
            if matches!(e, RegistrationError::DuplicateEmail(_)) {
                warn!("Store rejected duplicate email after lookup passed");
                RegistrationMetrics::record_write_time_duplicate();
            }
            let e = e.into_submission_error();
            if let Some(errors) = e.field_errors() {
                record_rejection(errors);
            }
            return Err(e);
        }

        RegistrationMetrics::record_accepted(started.elapsed().as_secs_f64());
        info!(
            id = ?registration.id,
            sports = registration.sports.len(),
            partners = registration.partners.len(),
            "Registration stored"
        );
        Ok(registration)
    }
}

fn record_rejection(errors: &ErrorSet) {
    let kinds: Vec<ErrorKind> = errors.iter().map(|(_, e)| e.kind).collect();
    RegistrationMetrics::record_rejected(&kinds);
    info!(fields = errors.len(), "Registration rejected: {}", errors);
}
