//! SQLite-backed store.
//!
//! Collections live as JSON array blobs in a single two-column table, matching
//! the blob-store contract: the engine owns record semantics, SQLite only
//! provides durability and the `put_all` transaction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};

use super::{Collection, Storage, StorageError};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a file-backed store.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory store. Contents vanish on drop.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS collections (
                name TEXT PRIMARY KEY,
                payload TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }

    fn write_one(
        conn: &Connection,
        collection: Collection,
        records: &[serde_json::Value],
    ) -> Result<(), StorageError> {
        let payload = serde_json::to_string(records)?;
        conn.execute(
            "INSERT OR REPLACE INTO collections (name, payload) VALUES (?1, ?2)",
            params![collection.as_str(), payload],
        )?;
        Ok(())
    }
}

impl Storage for SqliteStore {
    fn get(&self, collection: Collection) -> Result<Vec<serde_json::Value>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT payload FROM collections WHERE name = ?1")?;
        let mut rows = stmt.query(params![collection.as_str()])?;

        match rows.next()? {
            Some(row) => {
                let payload: String = row.get(0)?;
                Ok(serde_json::from_str(&payload)?)
            }
            None => Ok(Vec::new()),
        }
    }

    fn put(
        &self,
        collection: Collection,
        records: Vec<serde_json::Value>,
    ) -> Result<(), StorageError> {
        let conn = self.lock()?;
        Self::write_one(&conn, collection, &records)
    }

    fn put_all(
        &self,
        writes: Vec<(Collection, Vec<serde_json::Value>)>,
    ) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        for (collection, records) in &writes {
            Self::write_one(&tx, *collection, records)?;
        }
        tx.commit()?;
        Ok(())
    }
}
