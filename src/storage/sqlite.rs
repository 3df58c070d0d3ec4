use super::traits::RegistrationStore;
use crate::domain::{Partner, Registration, RegistrationFilter};
use crate::error::{RegistrationError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

const SCHEMA: &str = r#"
    PRAGMA journal_mode=WAL;
    CREATE TABLE IF NOT EXISTS registrations (
        id                TEXT PRIMARY KEY,
        name              TEXT NOT NULL,
        email             TEXT NOT NULL UNIQUE COLLATE NOCASE,
        course            TEXT NOT NULL,
        year              INTEGER NOT NULL,
        gender            TEXT NOT NULL,
        sports            TEXT NOT NULL,
        partners          TEXT NOT NULL,
        notes             TEXT,
        status            TEXT NOT NULL,
        registration_date TEXT NOT NULL,
        last_updated      TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_registrations_status ON registrations (status);
    CREATE INDEX IF NOT EXISTS idx_registrations_year ON registrations (year);
"#;

const SELECT_COLUMNS: &str = "SELECT id, name, email, course, year, gender, sports, partners, notes, \
     status, registration_date, last_updated FROM registrations";

/// SQLite-backed registration store; the `UNIQUE` email column is the
/// write-time guard against duplicate registrations.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        info!("Opened registration database at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RegistrationError::Storage {
            message: "registration database lock poisoned".to_string(),
        })
    }
}

impl From<rusqlite::Error> for RegistrationError {
    fn from(error: rusqlite::Error) -> Self {
        RegistrationError::Storage {
            message: error.to_string(),
        }
    }
}

/// Map a failed write, turning a constraint violation into a duplicate email
fn write_error(error: rusqlite::Error, email: &str) -> RegistrationError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &error {
        if failure.code == ErrorCode::ConstraintViolation {
            return RegistrationError::DuplicateEmail(email.to_string());
        }
    }
    error.into()
}

/// Columns exactly as stored, before decoding
struct StoredRow {
    id: String,
    name: String,
    email: String,
    course: String,
    year: i64,
    gender: String,
    sports: String,
    partners: String,
    notes: Option<String>,
    status: String,
    registration_date: String,
    last_updated: String,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            course: row.get(3)?,
            year: row.get(4)?,
            gender: row.get(5)?,
            sports: row.get(6)?,
            partners: row.get(7)?,
            notes: row.get(8)?,
            status: row.get(9)?,
            registration_date: row.get(10)?,
            last_updated: row.get(11)?,
        })
    }
}

impl TryFrom<StoredRow> for Registration {
    type Error = RegistrationError;

    fn try_from(row: StoredRow) -> Result<Self> {
        let corrupt = |what: &str, detail: String| RegistrationError::Storage {
            message: format!("stored registration {} has invalid {}: {}", row.id, what, detail),
        };

        let id = Uuid::parse_str(&row.id).map_err(|e| corrupt("id", e.to_string()))?;
        let year = u8::try_from(row.year).map_err(|e| corrupt("year", e.to_string()))?;
        let gender = row.gender.parse().map_err(|e| corrupt("gender", e))?;
        let status = row.status.parse().map_err(|e| corrupt("status", e))?;
        let sports: Vec<String> = serde_json::from_str(&row.sports)?;
        let partners: Vec<Partner> = serde_json::from_str(&row.partners)?;
        let registration_date = parse_timestamp(&row.registration_date)
            .map_err(|e| corrupt("registration_date", e))?;
        let last_updated =
            parse_timestamp(&row.last_updated).map_err(|e| corrupt("last_updated", e))?;

        Ok(Registration {
            id: Some(id),
            name: row.name,
            email: row.email,
            course: row.course,
            year,
            gender,
            sports,
            partners,
            notes: row.notes,
            status,
            registration_date,
            last_updated,
        })
    }
}

fn parse_timestamp(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

fn query_registrations(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Registration>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, StoredRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(Registration::try_from).collect()
}

#[async_trait]
impl RegistrationStore for SqliteStore {
    async fn create_registration(&self, registration: &mut Registration) -> Result<()> {
        let id = Uuid::new_v4();
        let sports = serde_json::to_string(&registration.sports)?;
        let partners = serde_json::to_string(&registration.partners)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO registrations (id, name, email, course, year, gender, sports, partners, \
             notes, status, registration_date, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                id.to_string(),
                registration.name,
                registration.email,
                registration.course,
                i64::from(registration.year),
                registration.gender.as_str(),
                sports,
                partners,
                registration.notes,
                registration.status.as_str(),
                registration.registration_date.to_rfc3339(),
                registration.last_updated.to_rfc3339(),
            ],
        )
        .map_err(|e| write_error(e, &registration.email))?;

        registration.id = Some(id);
        debug!("Created registration: {} with id {}", registration.email, id);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Registration>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE email = ?1 COLLATE NOCASE", SELECT_COLUMNS);
        Ok(query_registrations(&conn, &sql, params![email])?.into_iter().next())
    }

    async fn get_registration(&self, id: Uuid) -> Result<Option<Registration>> {
        let conn = self.conn()?;
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        Ok(query_registrations(&conn, &sql, params![id.to_string()])?
            .into_iter()
            .next())
    }

    async fn list_registrations(&self, filter: &RegistrationFilter) -> Result<Vec<Registration>> {
        let conn = self.conn()?;
        let sql = format!("{} ORDER BY registration_date DESC, name ASC", SELECT_COLUMNS);
        let all = query_registrations(&conn, &sql, params![])?;
        // Sports live in a JSON column, so filtering happens after decoding
        Ok(all.into_iter().filter(|r| filter.matches(r)).collect())
    }

    async fn update_registration(&self, registration: &Registration) -> Result<()> {
        let id = registration.id.ok_or_else(|| RegistrationError::Storage {
            message: "Cannot update registration without ID".to_string(),
        })?;
        let sports = serde_json::to_string(&registration.sports)?;
        let partners = serde_json::to_string(&registration.partners)?;

        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE registrations SET name = ?2, email = ?3, course = ?4, year = ?5, gender = ?6, \
                 sports = ?7, partners = ?8, notes = ?9, status = ?10, last_updated = ?11
                 WHERE id = ?1",
                params![
                    id.to_string(),
                    registration.name,
                    registration.email,
                    registration.course,
                    i64::from(registration.year),
                    registration.gender.as_str(),
                    sports,
                    partners,
                    registration.notes,
                    registration.status.as_str(),
                    registration.last_updated.to_rfc3339(),
                ],
            )
            .map_err(|e| write_error(e, &registration.email))?;

        if changed == 0 {
            return Err(RegistrationError::NotFound(id));
        }
        debug!("Updated registration: {} with id {}", registration.email, id);
        Ok(())
    }

    async fn delete_registration(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM registrations WHERE id = ?1", params![id.to_string()])?;
        debug!("Delete registration {}: removed={}", id, removed);
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, Status};
    use tempfile::tempdir;

    fn registration(email: &str) -> Registration {
        let now = Utc::now();
        Registration {
            id: None,
            name: "Meera".to_string(),
            email: email.to_string(),
            course: "BTech".to_string(),
            year: 3,
            gender: Gender::Girl,
            sports: vec!["carrom-doubles".to_string(), "poetry".to_string()],
            partners: vec![Partner::new("carrom-doubles", "Nina")],
            notes: Some("vegetarian".to_string()),
            status: Status::Pending,
            registration_date: now,
            last_updated: now,
        }
    }

    #[tokio::test]
    async fn test_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("registrations.db");

        let mut created = registration("meera@example.com");
        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_registration(&mut created).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let found = store.find_by_email("Meera@Example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.partners, created.partners);
        assert_eq!(found.sports, created.sports);
        assert_eq!(found.notes.as_deref(), Some("vegetarian"));
    }

    #[tokio::test]
    async fn test_unique_constraint_reports_duplicate_email() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .create_registration(&mut registration("dup@example.com"))
            .await
            .unwrap();

        match store.create_registration(&mut registration("dup@example.com")).await {
            Err(RegistrationError::DuplicateEmail(email)) => assert_eq!(email, "dup@example.com"),
            other => panic!("expected duplicate email, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_filter_update_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut r = registration("f@example.com");
        store.create_registration(&mut r).await.unwrap();

        let by_sport = RegistrationFilter {
            sport: Some("poetry".to_string()),
            ..Default::default()
        };
        assert_eq!(store.list_registrations(&by_sport).await.unwrap().len(), 1);
        let other_sport = RegistrationFilter {
            sport: Some("cricket".to_string()),
            ..Default::default()
        };
        assert!(store.list_registrations(&other_sport).await.unwrap().is_empty());

        r.status = Status::Waitlisted;
        store.update_registration(&r).await.unwrap();
        let stored = store.get_registration(r.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.status, Status::Waitlisted);

        assert!(store.delete_registration(r.id.unwrap()).await.unwrap());
        assert!(store.get_registration(r.id.unwrap()).await.unwrap().is_none());
    }
}
