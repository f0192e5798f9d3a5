//! Index statistics

use filescope_core::{FileTypeStat, IndexInfo, IndexedFile};
use rusqlite::OptionalExtension;
use std::path::{Path, PathBuf};

use crate::connection::{DbError, IndexReader};

/// Number of extension groups reported in [`IndexInfo::file_types`]
pub const TOP_FILE_TYPES: usize = 10;

impl IndexReader {
    /// Summarize the index contents
    pub fn index_info(&self) -> Result<IndexInfo, DbError> {
        let (file_count, total_size): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(file_size), 0) FROM files",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let line_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM file_contents", [], |row| row.get(0))?;

        let last_indexed: Option<String> =
            self.conn
                .query_row("SELECT MAX(indexed_at) FROM files", [], |row| row.get(0))?;

        Ok(IndexInfo {
            file_count,
            line_count,
            total_size: total_size.max(0) as u64,
            file_types: self.file_types(TOP_FILE_TYPES)?,
            index_size: store_footprint(self.path()),
            last_indexed,
            full_text_enabled: self.full_text_enabled(),
            version: self.version(),
        })
    }

    /// Largest extension groups by file count, ties broken by extension
    pub fn file_types(&self, limit: usize) -> Result<Vec<FileTypeStat>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT COALESCE(file_ext, '') AS ext, COUNT(*) AS count, COALESCE(SUM(file_size), 0)
             FROM files
             GROUP BY ext
             ORDER BY count DESC, ext ASC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok(FileTypeStat {
                extension: row.get(0)?,
                count: row.get(1)?,
                total_size: row.get::<_, i64>(2)?.max(0) as u64,
            })
        })?;

        let mut types = Vec::new();
        for row in rows {
            types.push(row?);
        }
        Ok(types)
    }

    /// Stored metadata for one indexed path
    pub fn indexed_file(&self, path: &str) -> Result<Option<IndexedFile>, DbError> {
        let file = self
            .conn
            .query_row(
                "SELECT id, file_path, file_name, file_size, COALESCE(file_ext, ''),
                        file_hash, modified_time, indexed_at
                 FROM files WHERE file_path = ?1",
                [path],
                |row| {
                    Ok(IndexedFile {
                        id: row.get(0)?,
                        path: row.get(1)?,
                        name: row.get(2)?,
                        size: row.get::<_, Option<i64>>(3)?.unwrap_or(0).max(0) as u64,
                        extension: row.get(4)?,
                        fingerprint: row.get(5)?,
                        modified_time: row.get(6)?,
                        indexed_at: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(file)
    }
}

/// Size of the database file plus its write-ahead log
fn store_footprint(path: &Path) -> u64 {
    let mut wal = path.as_os_str().to_owned();
    wal.push("-wal");

    [path.to_path_buf(), PathBuf::from(wal)]
        .iter()
        .filter_map(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use crate::fixture::Fixture;

    #[test]
    fn test_empty_index_info() {
        let fixture = Fixture::new(true);
        let info = fixture.reader().index_info().unwrap();

        assert_eq!(info.file_count, 0);
        assert_eq!(info.line_count, 0);
        assert_eq!(info.total_size, 0);
        assert!(info.file_types.is_empty());
        assert!(info.last_indexed.is_none());
        assert!(info.index_size > 0);
        assert_eq!(info.ratio_display(), "N/A");
    }

    #[test]
    fn test_index_info_totals() {
        let fixture = Fixture::new(false);
        fixture.add_file("/p/a.rs", 100, &["fn a() {}", "fn b() {}"]);
        fixture.add_file("/p/b.rs", 50, &["fn c() {}"]);
        fixture.add_file("/p/Makefile", 10, &["all:"]);

        let info = fixture.reader().index_info().unwrap();
        assert_eq!(info.file_count, 3);
        assert_eq!(info.line_count, 4);
        assert_eq!(info.total_size, 160);
        assert_eq!(info.last_indexed.as_deref(), Some("2024-05-01 12:00:00"));
        assert!(!info.full_text_enabled);
        assert_eq!(info.version, crate::DB_VERSION);

        assert_eq!(info.file_types.len(), 2);
        assert_eq!(info.file_types[0].extension, ".rs");
        assert_eq!(info.file_types[0].count, 2);
        assert_eq!(info.file_types[0].total_size, 150);
        assert_eq!(info.file_types[1].display_extension(), "(none)");
    }

    #[test]
    fn test_indexed_file_lookup() {
        let fixture = Fixture::new(true);
        let id = fixture.add_file("/p/Main.RS", 77, &["fn main() {}"]);
        let reader = fixture.reader();

        let file = reader.indexed_file("/p/Main.RS").unwrap().unwrap();
        assert_eq!(file.id, id);
        assert_eq!(file.name, "Main.RS");
        assert_eq!(file.extension, ".rs");
        assert_eq!(file.size, 77);
        assert_eq!(file.fingerprint.as_deref(), Some("hash"));
        assert!(reader.indexed_file("/p/other.rs").unwrap().is_none());
    }

    #[test]
    fn test_file_types_limit_and_tie_order() {
        let fixture = Fixture::new(true);
        for (i, ext) in ["c", "b", "a", "d"].iter().enumerate() {
            fixture.add_file(&format!("/p/f{}.{}", i, ext), 1, &["x"]);
        }

        let types = fixture.reader().file_types(3).unwrap();
        let exts: Vec<_> = types.iter().map(|t| t.extension.as_str()).collect();
        assert_eq!(exts, vec![".a", ".b", ".c"]);
    }
}
