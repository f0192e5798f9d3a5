//! Database schema creation and migration
//!
//! Schema history:
//! - v1: `files` without `file_hash`/`modified_time`, as written by early
//!   releases that had no `metadata` table.
//! - v2: adds the fingerprint and modification-time columns and the
//!   versioned `metadata` table.

use rusqlite::{Connection, OptionalExtension};

use crate::connection::IndexerError;

/// Current database schema version
pub const DB_VERSION: i32 = 2;

/// Name of the FTS5 table shadowing `file_contents`
pub const FTS_TABLE: &str = "file_contents_fts";

/// Initialize the database schema (create tables + run migrations)
///
/// Returns whether line content is backed by the full-text index. When
/// `want_full_text` is false, or FTS5 cannot be created, the content table
/// gets a plain index on its text column instead.
pub fn init_schema(conn: &mut Connection, want_full_text: bool) -> Result<bool, IndexerError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT
        )",
    )?;

    let found_version = stored_version(conn)?;
    if let Some(version) = found_version.filter(|v| *v > DB_VERSION) {
        return Err(IndexerError::Migration(format!(
            "index schema v{} is newer than supported v{}",
            version, DB_VERSION
        )));
    }

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS files (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_path TEXT UNIQUE NOT NULL,
            file_name TEXT NOT NULL,
            file_size INTEGER,
            file_ext TEXT,
            file_hash TEXT,
            modified_time REAL,
            indexed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS file_contents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_id INTEGER NOT NULL,
            line_number INTEGER NOT NULL,
            content TEXT NOT NULL
        );",
    )?;

    if let Some(version) = found_version {
        if version < DB_VERSION {
            migrate_schema(conn, version)?;
        }
    }

    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_files_ext ON files(file_ext);
         CREATE INDEX IF NOT EXISTS idx_files_hash ON files(file_hash);
         CREATE INDEX IF NOT EXISTS idx_file_contents_file_id ON file_contents(file_id, line_number);",
    )?;

    let full_text_enabled = if want_full_text {
        match enable_full_text(conn) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "FTS5 unavailable, using plain content search");
                enable_fallback(conn)?;
                false
            }
        }
    } else {
        enable_fallback(conn)?;
        false
    };

    if found_version != Some(DB_VERSION) {
        conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('version', ?1)",
            [&DB_VERSION.to_string()],
        )?;
    }

    Ok(full_text_enabled)
}

/// Version recorded in `metadata`; a bare `files` table counts as v1, an empty database as `None`
fn stored_version(conn: &Connection) -> Result<Option<i32>, IndexerError> {
    let version: Option<i32> = conn
        .query_row(
            "SELECT CAST(value AS INTEGER) FROM metadata WHERE key = 'version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    if version.is_some() {
        return Ok(version);
    }

    if table_exists(conn, "files")? {
        Ok(Some(1))
    } else {
        Ok(None)
    }
}

/// Migrate schema from older versions to current
pub fn migrate_schema(conn: &Connection, from_version: i32) -> Result<(), IndexerError> {
    let mut version = from_version;

    // Migration v1 -> v2: fingerprint + modification time, plain content table
    if version == 1 {
        tracing::info!("migrating index schema from v1 to v2");

        let columns = table_columns(conn, "files")?;
        for (name, definition) in [
            ("file_hash", "file_hash TEXT"),
            ("modified_time", "modified_time REAL"),
        ] {
            if !columns.iter().any(|c| c == name) {
                conn.execute(&format!("ALTER TABLE files ADD COLUMN {}", definition), [])?;
                tracing::info!(column = name, "added column to files");
            }
        }

        // Early releases could create file_contents as an FTS5 table without
        // a rowid alias; move its rows into the plain table layout.
        if is_virtual_table(conn, "file_contents")? {
            tracing::info!("converting virtual file_contents table to plain table");
            conn.execute_batch(
                "CREATE TABLE file_contents_v2 (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    file_id INTEGER NOT NULL,
                    line_number INTEGER NOT NULL,
                    content TEXT NOT NULL
                );
                INSERT INTO file_contents_v2 (file_id, line_number, content)
                    SELECT CAST(file_id AS INTEGER), CAST(line_number AS INTEGER), content
                    FROM file_contents;
                DROP TABLE file_contents;
                ALTER TABLE file_contents_v2 RENAME TO file_contents;",
            )?;
        }

        version = 2;
    }

    if version != DB_VERSION {
        return Err(IndexerError::Migration(format!(
            "no migration path from v{} to v{}",
            from_version, DB_VERSION
        )));
    }

    Ok(())
}

/// Create the FTS5 shadow table and its sync triggers
fn enable_full_text(conn: &Connection) -> Result<(), rusqlite::Error> {
    let existed = table_exists(conn, FTS_TABLE)?;

    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS file_contents_fts USING fts5(
            content,
            content='file_contents',
            content_rowid='id',
            tokenize='trigram'
        )",
    )?;

    conn.execute_batch(
        "CREATE TRIGGER IF NOT EXISTS file_contents_ai AFTER INSERT ON file_contents BEGIN
            INSERT INTO file_contents_fts(rowid, content) VALUES (new.id, new.content);
        END;

        CREATE TRIGGER IF NOT EXISTS file_contents_ad AFTER DELETE ON file_contents BEGIN
            INSERT INTO file_contents_fts(file_contents_fts, rowid, content)
            VALUES ('delete', old.id, old.content);
        END;

        CREATE TRIGGER IF NOT EXISTS file_contents_au AFTER UPDATE ON file_contents BEGIN
            INSERT INTO file_contents_fts(file_contents_fts, rowid, content)
            VALUES ('delete', old.id, old.content);
            INSERT INTO file_contents_fts(rowid, content) VALUES (new.id, new.content);
        END;

        DROP INDEX IF EXISTS idx_file_contents_content;",
    )?;

    if !existed {
        let has_lines: bool =
            conn.query_row("SELECT EXISTS(SELECT 1 FROM file_contents)", [], |row| {
                row.get(0)
            })?;
        if has_lines {
            tracing::info!("populating {} from existing lines", FTS_TABLE);
            conn.execute_batch("INSERT INTO file_contents_fts(file_contents_fts) VALUES ('rebuild')")?;
        }
    }

    Ok(())
}

/// Plain-table mode: drop any FTS shadow and index the text column directly
fn enable_fallback(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "DROP TRIGGER IF EXISTS file_contents_ai;
         DROP TRIGGER IF EXISTS file_contents_ad;
         DROP TRIGGER IF EXISTS file_contents_au;
         DROP TABLE IF EXISTS file_contents_fts;
         CREATE INDEX IF NOT EXISTS idx_file_contents_content ON file_contents(content);",
    )
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        [name],
        |row| row.get(0),
    )
}

fn is_virtual_table(conn: &Connection, name: &str) -> Result<bool, rusqlite::Error> {
    let sql: Option<String> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(sql
        .map(|s| s.trim_start().to_uppercase().starts_with("CREATE VIRTUAL TABLE"))
        .unwrap_or(false))
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}
