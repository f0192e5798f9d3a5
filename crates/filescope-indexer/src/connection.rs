//! Read-write database connection for indexing operations

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{rebuild, schema};

/// Indexer database errors
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Folder not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

/// Options applied when opening the store
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// Try to back line content with an FTS5 index; `false` forces the plain fallback
    pub full_text: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { full_text: true }
    }
}

/// Read-write database connection for indexing
pub struct IndexStore {
    pub(crate) conn: Connection,
    path: PathBuf,
    full_text_enabled: bool,
}

impl IndexStore {
    /// Open or create the database at a specific path
    pub fn open_or_create(path: &Path, options: StoreOptions) -> Result<Self, IndexerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Self::from_connection(conn, path.to_path_buf(), options)
    }

    /// Open a private in-memory database
    pub fn open_in_memory(options: StoreOptions) -> Result<Self, IndexerError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, PathBuf::new(), options)
    }

    fn from_connection(
        mut conn: Connection,
        path: PathBuf,
        options: StoreOptions,
    ) -> Result<Self, IndexerError> {
        // The index can always be rebuilt from source files, so trade
        // durability for write throughput.
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = 10000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = OFF;",
        )?;

        let full_text_enabled = schema::init_schema(&mut conn, options.full_text)?;
        tracing::debug!(
            path = %path.display(),
            full_text_enabled,
            "opened index store"
        );

        Ok(Self {
            conn,
            path,
            full_text_enabled,
        })
    }

    /// Get the database path (empty for in-memory stores)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether line content is backed by the FTS5 index
    pub fn full_text_enabled(&self) -> bool {
        self.full_text_enabled
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Get a mutable reference to the underlying connection
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Drop every indexed file and line, keeping the schema current
    pub fn clear(&mut self) -> Result<(), IndexerError> {
        self.full_text_enabled = rebuild::clear_index(&mut self.conn, self.full_text_enabled)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("dir").join("index.db");

        let store = IndexStore::open_or_create(&path, StoreOptions::default()).unwrap();
        assert!(path.exists());
        assert_eq!(store.path(), path.as_path());
        assert!(store.full_text_enabled());
    }

    #[test]
    fn test_forced_fallback_mode() {
        let store = IndexStore::open_in_memory(StoreOptions { full_text: false }).unwrap();
        assert!(!store.full_text_enabled());
    }
}
