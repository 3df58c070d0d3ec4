pub mod in_memory;
pub mod sqlite;
pub mod traits;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::RegistrationStore;

use std::sync::Arc;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;

/// Open the store selected by configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn RegistrationStore>> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory registration store");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Sqlite => Ok(Arc::new(SqliteStore::open(&config.path)?)),
    }
}
