use super::traits::RegistrationStore;
use crate::domain::{Registration, RegistrationFilter};
use crate::error::{RegistrationError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// In-memory storage implementation for development/testing
#[derive(Clone, Default)]
pub struct InMemoryStore {
    registrations: Arc<Mutex<HashMap<Uuid, Registration>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Registration>>> {
        self.registrations.lock().map_err(|_| RegistrationError::Storage {
            message: "registration store lock poisoned".to_string(),
        })
    }
}

fn email_taken(
    registrations: &HashMap<Uuid, Registration>,
    email: &str,
    except: Option<Uuid>,
) -> bool {
    registrations
        .iter()
        .any(|(id, r)| Some(*id) != except && r.email.eq_ignore_ascii_case(email))
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn create_registration(&self, registration: &mut Registration) -> Result<()> {
        let mut registrations = self.lock()?;
        // Checked under the same lock as the insert, so concurrent writers cannot both pass
        if email_taken(&registrations, &registration.email, None) {
            return Err(RegistrationError::DuplicateEmail(registration.email.clone()));
        }

        let id = Uuid::new_v4();
        registration.id = Some(id);
        registrations.insert(id, registration.clone());

        debug!("Created registration: {} with id {}", registration.email, id);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Registration>> {
        let registrations = self.lock()?;
        Ok(registrations
            .values()
            .find(|r| r.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_registration(&self, id: Uuid) -> Result<Option<Registration>> {
        let registrations = self.lock()?;
        Ok(registrations.get(&id).cloned())
    }

    async fn list_registrations(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        let registrations = self.lock()?;
        let mut matching: Vec<Registration> = registrations
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.registration_date
                .cmp(&a.registration_date)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(matching)
    }

    async fn update_registration(&self, registration: &Registration) -> Result<()> {
        let id = registration.id.ok_or_else(|| RegistrationError::Storage {
            message: "Cannot update registration without ID".to_string(),
        })?;

        let mut registrations = self.lock()?;
        if !registrations.contains_key(&id) {
            return Err(RegistrationError::NotFound(id));
        }
        if email_taken(&registrations, &registration.email, Some(id)) {
            return Err(RegistrationError::DuplicateEmail(registration.email.clone()));
        }
        registrations.insert(id, registration.clone());

        debug!("Updated registration: {} with id {}", registration.email, id);
        Ok(())
    }

    async fn delete_registration(&self, id: Uuid) -> Result<bool> {
        let mut registrations = self.lock()?;
        let removed = registrations.remove(&id).is_some();
        debug!("Delete registration {}: removed={}", id, removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Status};
    use chrono::{Duration, Utc};

    fn registration(email: &str, name: &str, minutes_ago: i64) -> Registration {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        Registration {
            id: None,
            name: name.to_string(),
            email: email.to_string(),
            course: "BA".to_string(),
            year: 1,
            gender: Gender::Boy,
            sports: vec!["cricket".to_string()],
            partners: vec![],
            notes: None,
            status: Status::Pending,
            registration_date: at,
            last_updated: at,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_rejects_duplicate_email() {
        let store = InMemoryStore::new();
        let mut first = registration("a@b.co", "A", 0);
        store.create_registration(&mut first).await.unwrap();
        assert!(first.id.is_some());

        let mut second = registration("A@B.CO", "B", 0);
        match store.create_registration(&mut second).await {
            Err(RegistrationError::DuplicateEmail(email)) => assert_eq!(email, "A@B.CO"),
            other => panic!("expected duplicate email, got {:?}", other),
        }
        assert!(second.id.is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = InMemoryStore::new();
        for (email, name, ago) in [("old@x.io", "Old", 30), ("new@x.io", "New", 1), ("mid@x.io", "Mid", 10)] {
            store
                .create_registration(&mut registration(email, name, ago))
                .await
                .unwrap();
        }
        let names: Vec<String> = store
            .list_registrations(&RegistrationFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["New", "Mid", "Old"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryStore::new();
        let mut r = registration("u@x.io", "U", 0);
        store.create_registration(&mut r).await.unwrap();

        r.status = Status::Approved;
        store.update_registration(&r).await.unwrap();
        let stored = store.get_registration(r.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Approved);

        assert!(store.delete_registration(r.id.unwrap()).await.unwrap());
        assert!(!store.delete_registration(r.id.unwrap()).await.unwrap());
        assert!(matches!(
            store.update_registration(&r).await,
            Err(RegistrationError::NotFound(_))
        ));
    }
}
