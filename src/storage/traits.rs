use crate::domain::{Registration, RegistrationFilter};
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Storage trait for persisting registrations.
///
/// Implementations must reject a write that would give two registrations the
/// same email with `RegistrationError::DuplicateEmail`, independently of any
/// lookup a caller did beforehand.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Insert a new registration, assigning its id
    async fn create_registration(&self, registration: &mut Registration) -> Result<()>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Registration>>;
    async fn get_registration(&self, id: Uuid) -> Result<Option<Registration>>;

    /// Registrations matching `filter`, newest first
    async fn list_registrations(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>>;

    /// Replace a stored registration; fails with `NotFound` for an unknown id
    async fn update_registration(&self, registration: &Registration) -> Result<()>;

    /// Returns whether a registration was removed
    async fn delete_registration(&self, id: Uuid) -> Result<bool>;
}
