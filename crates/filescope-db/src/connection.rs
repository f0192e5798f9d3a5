//! Read-only database connection

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Index not found at {0} (run: filescope index build <ROOT>)")]
    NotFound(PathBuf),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Index not initialized (run: filescope index build <ROOT>)")]
    NotInitialized,

    #[error("Index version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },

    #[error("Search keyword is empty")]
    EmptyQuery,

    #[error("Invalid regular expression: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Expected database version
pub const DB_VERSION: i32 = 2;

/// Default database path
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("~"))
        .join(".filescope")
        .join("index.db")
}

/// Read-only connection to the index
pub struct IndexReader {
    pub(crate) conn: Connection,
    path: PathBuf,
    full_text_enabled: bool,
    version: i32,
}

impl IndexReader {
    /// Open the index at a specific path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(DbError::NotFound(path));
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        let version = check_version(&conn)?;
        let full_text_enabled = detect_full_text(&conn)?;
        tracing::debug!(path = %path.display(), full_text_enabled, "opened index reader");

        Ok(Self {
            conn,
            path,
            full_text_enabled,
            version,
        })
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the underlying connection (for custom queries)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Whether literal searches can use the FTS5 index
    pub fn full_text_enabled(&self) -> bool {
        self.full_text_enabled
    }

    /// Schema version recorded in the store
    pub fn version(&self) -> i32 {
        self.version
    }
}

fn check_version(conn: &Connection) -> Result<i32, DbError> {
    let has_metadata: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'metadata')",
        [],
        |row| row.get(0),
    )?;
    if !has_metadata {
        return Err(DbError::NotInitialized);
    }

    let version: Option<i32> = conn
        .query_row(
            "SELECT CAST(value AS INTEGER) FROM metadata WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match version {
        None => Err(DbError::NotInitialized),
        Some(v) if v < DB_VERSION => Err(DbError::VersionMismatch {
            expected: DB_VERSION,
            found: v,
        }),
        Some(v) => Ok(v),
    }
}

fn detect_full_text(conn: &Connection) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'file_contents_fts')",
        [],
        |row| row.get(0),
    )
}
