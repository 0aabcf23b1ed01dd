//! In-memory store — test double and ephemeral backend.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Collection, Storage, StorageError};

/// HashMap-backed store. A single mutex over the whole map makes `put_all`
/// trivially atomic.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<serde_json::Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<Collection, Vec<serde_json::Value>>>, StorageError>
    {
        self.collections
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }
}

impl Storage for MemoryStore {
    fn get(&self, collection: Collection) -> Result<Vec<serde_json::Value>, StorageError> {
        let map = self.lock()?;
        Ok(map.get(&collection).cloned().unwrap_or_default())
    }

    fn put(
        &self,
        collection: Collection,
        records: Vec<serde_json::Value>,
    ) -> Result<(), StorageError> {
        let mut map = self.lock()?;
        map.insert(collection, records);
        Ok(())
    }

    fn put_all(
        &self,
        writes: Vec<(Collection, Vec<serde_json::Value>)>,
    ) -> Result<(), StorageError> {
        let mut map = self.lock()?;
        for (collection, records) in writes {
            map.insert(collection, records);
        }
        Ok(())
    }
}
