//! Persistence collaborator boundary.
//!
//! The engine treats storage as a synchronous key-value blob store keyed by
//! logical collections. The only transactional obligation on implementations
//! is `put_all`: a multi-collection write must land atomically, so a cascade
//! (image + analysis) can never be observed half-applied.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Storage lock poisoned: {0}")]
    Poisoned(String),
}

/// Logical collections owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Images,
    Analyses,
    Notifications,
    Appointments,
    AppointmentSlots,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Images => "images",
            Self::Analyses => "analyses",
            Self::Notifications => "notifications",
            Self::Appointments => "appointments",
            Self::AppointmentSlots => "appointment_slots",
        }
    }

    pub fn all() -> &'static [Collection] {
        &[
            Self::Users,
            Self::Images,
            Self::Analyses,
            Self::Notifications,
            Self::Appointments,
            Self::AppointmentSlots,
        ]
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Synchronous key-value blob store over logical collections.
///
/// A collection that was never written reads back as empty, not as an error.
pub trait Storage: Send + Sync {
    fn get(&self, collection: Collection) -> Result<Vec<serde_json::Value>, StorageError>;

    fn put(
        &self,
        collection: Collection,
        records: Vec<serde_json::Value>,
    ) -> Result<(), StorageError>;

    /// Write several collections in one atomic step.
    fn put_all(
        &self,
        writes: Vec<(Collection, Vec<serde_json::Value>)>,
    ) -> Result<(), StorageError>;
}

/// Read a collection and decode every record.
pub fn load_all<T: DeserializeOwned>(
    store: &dyn Storage,
    collection: Collection,
) -> Result<Vec<T>, StorageError> {
    store
        .get(collection)?
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(StorageError::from))
        .collect()
}

/// Encode records for a `put`/`put_all` write.
pub fn encode_all<T: Serialize>(records: &[T]) -> Result<Vec<serde_json::Value>, StorageError> {
    records
        .iter()
        .map(|record| serde_json::to_value(record).map_err(StorageError::from))
        .collect()
}

/// Replace a collection with the given records.
pub fn store_all<T: Serialize>(
    store: &dyn Storage,
    collection: Collection,
    records: &[T],
) -> Result<(), StorageError> {
    store.put(collection, encode_all(records)?)
}
