//! On-disk index fixture for read-side tests
//!
//! Mirrors the v2 layout written by `filescope-indexer`.

use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::connection::{IndexReader, DB_VERSION};

pub(crate) struct Fixture {
    _dir: TempDir,
    path: PathBuf,
    writer: Connection,
}

impl Fixture {
    pub(crate) fn new(full_text: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let writer = Connection::open(&path).unwrap();

        writer
            .execute_batch(
                "CREATE TABLE metadata (key TEXT PRIMARY KEY, value TEXT);
                 CREATE TABLE files (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    file_path TEXT UNIQUE NOT NULL,
                    file_name TEXT NOT NULL,
                    file_size INTEGER,
                    file_ext TEXT,
                    file_hash TEXT,
                    modified_time REAL,
                    indexed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                 );
                 CREATE TABLE file_contents (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    file_id INTEGER NOT NULL,
                    line_number INTEGER NOT NULL,
                    content TEXT NOT NULL
                 );",
            )
            .unwrap();

        if full_text {
            writer
                .execute_batch(
                    "CREATE VIRTUAL TABLE file_contents_fts USING fts5(
                        content, content='file_contents', content_rowid='id', tokenize='trigram'
                     );
                     CREATE TRIGGER file_contents_ai AFTER INSERT ON file_contents BEGIN
                        INSERT INTO file_contents_fts(rowid, content) VALUES (new.id, new.content);
                     END;",
                )
                .unwrap();
        } else {
            writer
                .execute_batch("CREATE INDEX idx_file_contents_content ON file_contents(content)")
                .unwrap();
        }

        writer
            .execute(
                "INSERT INTO metadata (key, value) VALUES ('version', ?1)",
                [DB_VERSION.to_string()],
            )
            .unwrap();

        Self {
            _dir: dir,
            path,
            writer,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn writer(&self) -> &Connection {
        &self.writer
    }

    pub(crate) fn reader(&self) -> IndexReader {
        IndexReader::open(&self.path).unwrap()
    }

    /// Add a file whose lines are numbered from 1
    pub(crate) fn add_file(&self, path: &str, size: u64, lines: &[&str]) -> i64 {
        let name = path.rsplit('/').next().unwrap_or(path);
        let ext = name
            .rfind('.')
            .map(|i| name[i..].to_lowercase())
            .unwrap_or_default();

        self.writer
            .execute(
                "INSERT INTO files (file_path, file_name, file_size, file_ext, file_hash, modified_time, indexed_at)
                 VALUES (?1, ?2, ?3, ?4, 'hash', 0.0, '2024-05-01 12:00:00')",
                params![path, name, size as i64, ext],
            )
            .unwrap();
        let id = self.writer.last_insert_rowid();

        for (i, line) in lines.iter().enumerate() {
            self.writer
                .execute(
                    "INSERT INTO file_contents (file_id, line_number, content) VALUES (?1, ?2, ?3)",
                    params![id, i as i64 + 1, line],
                )
                .unwrap();
        }
        id
    }
}
