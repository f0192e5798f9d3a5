//! Low-level write primitives over `files` and `file_contents`
//!
//! None of these functions open or commit transactions; the indexing run
//! wraps them in its own batches.

use filescope_core::Subtree;
use rusqlite::{params, Connection, ToSql};
use std::collections::HashMap;

use crate::connection::IndexerError;
use crate::extract::ContentLine;

/// Metadata written for one indexed file
#[derive(Debug, Clone)]
pub struct FileRecord<'a> {
    pub path: &'a str,
    pub name: &'a str,
    pub size: u64,
    pub extension: &'a str,
    pub fingerprint: &'a str,
    pub modified_time: f64,
}

/// Prior state of an indexed path, used to diff against a live walk
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub id: i64,
    pub fingerprint: Option<String>,
    pub modified_time: Option<f64>,
}

impl SnapshotEntry {
    /// Same fingerprint and a modification time within `tolerance_secs`
    pub fn matches(&self, fingerprint: &str, modified_time: f64, tolerance_secs: f64) -> bool {
        let same_hash = self.fingerprint.as_deref() == Some(fingerprint);
        let same_mtime = self
            .modified_time
            .map(|prior| (prior - modified_time).abs() < tolerance_secs)
            .unwrap_or(false);
        same_hash && same_mtime
    }
}

pub type Snapshot = HashMap<String, SnapshotEntry>;

/// Timestamp format shared with SQLite's `CURRENT_TIMESTAMP`
fn now_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Insert a file row, or update the existing row for the same path in place
///
/// Returns the file id, which is stable across updates.
pub fn upsert_file(conn: &Connection, record: &FileRecord<'_>) -> Result<i64, IndexerError> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO files (file_path, file_name, file_size, file_ext, file_hash, modified_time, indexed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(file_path) DO UPDATE SET
            file_name = excluded.file_name,
            file_size = excluded.file_size,
            file_ext = excluded.file_ext,
            file_hash = excluded.file_hash,
            modified_time = excluded.modified_time,
            indexed_at = excluded.indexed_at
         RETURNING id",
    )?;

    let id = stmt.query_row(
        params![
            record.path,
            record.name,
            record.size as i64,
            record.extension,
            record.fingerprint,
            record.modified_time,
            now_timestamp(),
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Replace every stored line of a file with `lines`
///
/// Rows are written with multi-row INSERTs of at most `batch_size` lines.
pub fn replace_content_lines(
    conn: &Connection,
    file_id: i64,
    lines: &[ContentLine],
    batch_size: usize,
) -> Result<usize, IndexerError> {
    conn.prepare_cached("DELETE FROM file_contents WHERE file_id = ?1")?
        .execute([file_id])?;

    let batch_size = batch_size.max(1);
    for chunk in lines.chunks(batch_size) {
        let placeholders = vec!["(?, ?, ?)"; chunk.len()].join(", ");
        let sql = format!(
            "INSERT INTO file_contents (file_id, line_number, content) VALUES {}",
            placeholders
        );

        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() * 3);
        for line in chunk {
            values.push(&file_id);
            values.push(&line.line_number);
            values.push(&line.text);
        }

        conn.prepare_cached(&sql)?.execute(values.as_slice())?;
    }

    Ok(lines.len())
}

/// Remove a file row together with all of its lines
pub fn delete_file(conn: &Connection, file_id: i64) -> Result<(), IndexerError> {
    conn.prepare_cached("DELETE FROM file_contents WHERE file_id = ?1")?
        .execute([file_id])?;
    conn.prepare_cached("DELETE FROM files WHERE id = ?1")?
        .execute([file_id])?;
    Ok(())
}

/// Current state of every indexed path inside `root`
pub fn snapshot(conn: &Connection, root: &str) -> Result<Snapshot, IndexerError> {
    let tree = Subtree::new(root);
    let sql = format!(
        "SELECT id, file_path, file_hash, modified_time FROM files WHERE {}",
        Subtree::sql_predicate("file_path")
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![tree.exact(), tree.prefix(), tree.prefix()], |row| {
        Ok((
            row.get::<_, String>(1)?,
            SnapshotEntry {
                id: row.get(0)?,
                fingerprint: row.get(2)?,
                modified_time: row.get(3)?,
            },
        ))
    })?;

    let mut snapshot = HashMap::new();
    for row in rows {
        let (path, entry) = row?;
        snapshot.insert(path, entry);
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    fn setup_db(full_text: bool) -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        schema::init_schema(&mut conn, full_text).unwrap();
        conn
    }

    fn record<'a>(path: &'a str, fingerprint: &'a str) -> FileRecord<'a> {
        FileRecord {
            path,
            name: "main.rs",
            size: 42,
            extension: ".rs",
            fingerprint,
            modified_time: 1_700_000_000.5,
        }
    }

    fn lines(texts: &[&str]) -> Vec<ContentLine> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| ContentLine {
                line_number: i as i64 + 1,
                text: t.to_string(),
            })
            .collect()
    }

    fn line_texts(conn: &Connection, file_id: i64) -> Vec<String> {
        conn.prepare("SELECT content FROM file_contents WHERE file_id = ?1 ORDER BY line_number")
            .unwrap()
            .query_map([file_id], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_upsert_keeps_identity() {
        let conn = setup_db(true);
        let first = upsert_file(&conn, &record("/p/main.rs", "aaa")).unwrap();
        let second = upsert_file(&conn, &record("/p/main.rs", "bbb")).unwrap();
        assert_eq!(first, second);

        let hash: String = conn
            .query_row("SELECT file_hash FROM files WHERE id = ?1", [first], |row| row.get(0))
            .unwrap();
        assert_eq!(hash, "bbb");
    }

    #[test]
    fn test_replace_content_lines_fully_replaces() {
        let conn = setup_db(true);
        let id = upsert_file(&conn, &record("/p/main.rs", "aaa")).unwrap();

        replace_content_lines(&conn, id, &lines(&["one", "two", "three"]), 2).unwrap();
        assert_eq!(line_texts(&conn, id), vec!["one", "two", "three"]);

        replace_content_lines(&conn, id, &lines(&["only"]), 2).unwrap();
        assert_eq!(line_texts(&conn, id), vec!["only"]);
    }

    #[test]
    fn test_replaced_lines_leave_fts_in_sync() {
        let conn = setup_db(true);
        let id = upsert_file(&conn, &record("/p/main.rs", "aaa")).unwrap();
        replace_content_lines(&conn, id, &lines(&["alpha beta"]), 10).unwrap();
        replace_content_lines(&conn, id, &lines(&["gamma delta"]), 10).unwrap();

        let stale: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM file_contents_fts WHERE file_contents_fts MATCH '\"alpha\"'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stale, 0);
    }

    #[test]
    fn test_delete_file_cascades_to_lines() {
        let conn = setup_db(false);
        let id = upsert_file(&conn, &record("/p/main.rs", "aaa")).unwrap();
        replace_content_lines(&conn, id, &lines(&["a", "b"]), 10).unwrap();

        delete_file(&conn, id).unwrap();

        let files: i64 = conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
            .unwrap();
        assert_eq!(files, 0);
        assert!(line_texts(&conn, id).is_empty());
    }

    #[test]
    fn test_snapshot_is_scoped_to_subtree() {
        let conn = setup_db(true);
        upsert_file(&conn, &record("/p/app/main.rs", "a")).unwrap();
        upsert_file(&conn, &record("/p/application/main.rs", "b")).unwrap();
        upsert_file(&conn, &record("/q/main.rs", "c")).unwrap();

        let snapshot = snapshot(&conn, "/p/app").unwrap();
        assert_eq!(snapshot.len(), 1);
        let entry = &snapshot["/p/app/main.rs"];
        assert_eq!(entry.fingerprint.as_deref(), Some("a"));
        assert_eq!(entry.modified_time, Some(1_700_000_000.5));
    }

    #[test]
    fn test_snapshot_entry_matches() {
        let entry = SnapshotEntry {
            id: 1,
            fingerprint: Some("abc".to_string()),
            modified_time: Some(100.0),
        };
        assert!(entry.matches("abc", 100.4, 1.0));
        assert!(!entry.matches("abc", 101.5, 1.0));
        assert!(!entry.matches("abd", 100.0, 1.0));

        let legacy = SnapshotEntry {
            id: 2,
            fingerprint: None,
            modified_time: None,
        };
        assert!(!legacy.matches("abc", 100.0, 1.0));
    }
}
