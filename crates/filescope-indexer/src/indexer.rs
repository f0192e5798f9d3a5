//! Directory tree indexer
//!
//! Walks a root directory, classifies and fingerprints every file, diffs the
//! result against what the store already holds for that root and writes the
//! difference in bounded transactions.
//!
//! A run reports through an [`EventSink`]: progress messages while walking,
//! then exactly one terminal event.

use filescope_core::{format_size, EngineEvent, EventSink};
use rusqlite::{Connection, Transaction};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::connection::{IndexStore, IndexerError};
use crate::discovery::{walk_tree, WalkEntry};
use crate::eligibility::{extension_of, Classifier, Eligibility, SkipReason, DEFAULT_MAX_FILE_SIZE};
use crate::extract::{self, ExtractLimits, DEFAULT_MAX_LINES, DEFAULT_MAX_LINE_CHARS};
use crate::hasher;
use crate::store::{self, FileRecord, SnapshotEntry};

/// Tunables for an indexing run
#[derive(Debug, Clone, PartialEq)]
pub struct IndexerConfig {
    /// Files larger than this are skipped as too large
    pub max_file_size: u64,
    /// Modification times closer than this (exclusive) count as equal
    pub mtime_tolerance_secs: f64,
    /// New plus updated files written per transaction
    pub commit_every: usize,
    /// Changed files above which the store is compacted after the run
    pub maintenance_threshold: usize,
    pub max_lines_per_file: usize,
    pub max_line_chars: usize,
    /// Rows per multi-row INSERT
    pub insert_batch_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            mtime_tolerance_secs: 1.0,
            commit_every: 100,
            maintenance_threshold: 100,
            max_lines_per_file: DEFAULT_MAX_LINES,
            max_line_chars: DEFAULT_MAX_LINE_CHARS,
            insert_batch_size: 500,
        }
    }
}

impl IndexerConfig {
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_mtime_tolerance(mut self, secs: f64) -> Self {
        self.mtime_tolerance_secs = secs;
        self
    }

    pub fn with_commit_every(mut self, files: usize) -> Self {
        self.commit_every = files.max(1);
        self
    }

    pub fn with_maintenance_threshold(mut self, files: usize) -> Self {
        self.maintenance_threshold = files;
        self
    }

    pub fn with_line_limits(mut self, max_lines: usize, max_line_chars: usize) -> Self {
        self.max_lines_per_file = max_lines;
        self.max_line_chars = max_line_chars;
        self
    }

    pub fn extract_limits(&self) -> ExtractLimits {
        ExtractLimits {
            max_lines: self.max_lines_per_file,
            max_line_chars: self.max_line_chars,
        }
    }
}

/// Counters collected during one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub new: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Bytes of content written by this run
    pub total_size: u64,
    pub skip_reasons: BTreeMap<SkipReason, usize>,
}

impl IndexReport {
    /// Files that are current in the store after the run
    pub fn current_count(&self) -> usize {
        self.new + self.updated + self.unchanged
    }

    /// Files whose rows were written or removed
    pub fn changed_count(&self) -> usize {
        self.new + self.updated + self.deleted
    }

    fn record_skip(&mut self, reason: SkipReason) {
        self.skipped += 1;
        *self.skip_reasons.entry(reason).or_insert(0) += 1;
    }

    /// One-line human summary of the run
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Index complete: {} new, {} updated, {} deleted, {} unchanged, {} skipped",
            self.new, self.updated, self.deleted, self.unchanged, self.skipped
        );
        if !self.skip_reasons.is_empty() {
            let reasons: Vec<String> = self
                .skip_reasons
                .iter()
                .map(|(reason, count)| format!("{}: {}", reason.label(), count))
                .collect();
            out.push_str(&format!(" ({})", reasons.join(", ")));
        }
        out.push_str(&format!(
            ", {} errors, {} indexed",
            self.errors,
            format_size(self.total_size)
        ));
        out
    }
}

impl fmt::Display for IndexReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// What happened to a single eligible file
#[derive(Debug, Clone, PartialEq)]
enum FileOutcome {
    New,
    Updated,
    Unchanged,
    Failed(String),
}

/// Discard everything in the store, then index `root` from scratch
pub fn index_folder(
    store: &mut IndexStore,
    root: &Path,
    config: &IndexerConfig,
    sink: &mut dyn EventSink,
) -> Result<IndexReport, IndexerError> {
    let result = canonical_root(root).and_then(|root| {
        store.clear()?;
        sink.progress("Previous index cleared");
        run(store, &root, config, sink)
    });
    finish(result, sink)
}

/// Bring the store in line with the current contents of `root`
pub fn update_index(
    store: &mut IndexStore,
    root: &Path,
    config: &IndexerConfig,
    sink: &mut dyn EventSink,
) -> Result<IndexReport, IndexerError> {
    let result = canonical_root(root).and_then(|root| run(store, &root, config, sink));
    finish(result, sink)
}

/// Emit the terminal event for a run
fn finish(
    result: Result<IndexReport, IndexerError>,
    sink: &mut dyn EventSink,
) -> Result<IndexReport, IndexerError> {
    match &result {
        Ok(report) => {
            tracing::info!(
                new = report.new,
                updated = report.updated,
                deleted = report.deleted,
                unchanged = report.unchanged,
                skipped = report.skipped,
                errors = report.errors,
                "indexing finished"
            );
            sink.progress(&report.summary());
            sink.emit(EngineEvent::Finished(report.current_count()));
        }
        Err(e) => {
            tracing::warn!(error = %e, "indexing aborted");
            sink.emit(EngineEvent::Error(e.to_string()));
        }
    }
    result
}

fn canonical_root(root: &Path) -> Result<PathBuf, IndexerError> {
    match root.canonicalize() {
        Ok(path) if path.is_dir() => Ok(path),
        _ => Err(IndexerError::RootNotFound(root.to_path_buf())),
    }
}

/// The update algorithm shared by both entry points
///
/// Dropping an uncommitted transaction rolls it back, so any `?` below
/// discards only the in-flight batch.
fn run(
    store: &mut IndexStore,
    root: &Path,
    config: &IndexerConfig,
    sink: &mut dyn EventSink,
) -> Result<IndexReport, IndexerError> {
    let full_text = store.full_text_enabled();
    let conn = store.connection_mut();
    let root_str = root.to_string_lossy().into_owned();

    let prior = store::snapshot(conn, &root_str)?;
    tracing::debug!(root = %root_str, known = prior.len(), "loaded index snapshot");

    let classifier = Classifier::new(config.max_file_size);
    let limits = config.extract_limits();
    let mut report = IndexReport::default();
    let mut observed: HashSet<String> = HashSet::with_capacity(prior.len());
    let mut pending = 0usize;

    let mut tx = conn.transaction()?;

    for entry in walk_tree(root, &classifier) {
        let path = match entry {
            WalkEntry::Directory(dir) => {
                let rel = dir.strip_prefix(root).unwrap_or(&dir);
                sink.progress(&format!("Scanning {}", rel.display()));
                continue;
            }
            WalkEntry::File(path) => path,
        };

        let path_str = path.to_string_lossy().into_owned();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let check = classifier.classify(&name, &path, std::fs::metadata(&path).map(|m| m.len()));
        if let Eligibility::Skip(reason) = check.eligibility {
            report.record_skip(reason);
            // An unreadable size says nothing about whether the file still belongs
            if reason == SkipReason::Error {
                observed.insert(path_str);
            }
            continue;
        }

        let outcome = process_file(
            &tx,
            &path,
            &FileMeta {
                path: &path_str,
                name: &name,
                size: check.size,
            },
            prior.get(&path_str),
            config,
            &limits,
        )?;
        observed.insert(path_str);

        match outcome {
            FileOutcome::New => {
                report.new += 1;
                report.total_size += check.size;
                pending += 1;
                sink.progress(&format!("New: {}", name));
            }
            FileOutcome::Updated => {
                report.updated += 1;
                report.total_size += check.size;
                pending += 1;
                sink.progress(&format!("Updated: {}", name));
            }
            FileOutcome::Unchanged => {
                report.unchanged += 1;
                sink.progress(&format!("Unchanged: {}", name));
            }
            FileOutcome::Failed(reason) => {
                report.errors += 1;
                tracing::warn!(path = %path.display(), error = %reason, "failed to index file");
                sink.progress(&format!("Failed: {}: {}", name, reason));
            }
        }

        if pending >= config.commit_every {
            tx.commit()?;
            tracing::debug!(files = pending, "committed batch");
            pending = 0;
            tx = conn.transaction()?;
        }
    }

    let mut gone: Vec<(&String, &SnapshotEntry)> = prior
        .iter()
        .filter(|(path, _)| !observed.contains(*path))
        .collect();
    gone.sort_by(|a, b| a.0.cmp(b.0));

    for (path, entry) in gone {
        store::delete_file(&tx, entry.id)?;
        report.deleted += 1;
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        sink.progress(&format!("Deleted: {}", name));
    }

    tx.commit()?;

    if report.changed_count() > config.maintenance_threshold {
        sink.progress("Optimizing index...");
        if let Err(e) = maintain(conn, full_text) {
            tracing::warn!(error = %e, "index maintenance failed");
        }
    }

    Ok(report)
}

/// Identity of a file as seen by the walk
struct FileMeta<'a> {
    path: &'a str,
    name: &'a str,
    size: u64,
}

/// Fingerprint one eligible file and write it if it is new or changed
///
/// Filesystem failures become [`FileOutcome::Failed`]; store failures abort the run.
fn process_file(
    tx: &Transaction<'_>,
    path: &Path,
    meta: &FileMeta<'_>,
    prior: Option<&SnapshotEntry>,
    config: &IndexerConfig,
    limits: &ExtractLimits,
) -> Result<FileOutcome, IndexerError> {
    let fingerprint = match hasher::fingerprint(path) {
        Ok(fp) => fp,
        Err(e) => return Ok(FileOutcome::Failed(e.to_string())),
    };
    let modified_time = match modified_secs(path) {
        Ok(t) => t,
        Err(e) => return Ok(FileOutcome::Failed(e.to_string())),
    };

    if let Some(entry) = prior {
        if entry.matches(&fingerprint, modified_time, config.mtime_tolerance_secs) {
            return Ok(FileOutcome::Unchanged);
        }
    }

    let lines = match extract::read_lines(path, limits) {
        Ok(lines) => lines,
        Err(e) => return Ok(FileOutcome::Failed(e.to_string())),
    };

    let extension = extension_of(meta.name);
    let file_id = store::upsert_file(
        tx,
        &FileRecord {
            path: meta.path,
            name: meta.name,
            size: meta.size,
            extension: &extension,
            fingerprint: &fingerprint,
            modified_time,
        },
    )?;
    store::replace_content_lines(tx, file_id, &lines, config.insert_batch_size)?;

    Ok(if prior.is_some() {
        FileOutcome::Updated
    } else {
        FileOutcome::New
    })
}

/// Modification time in seconds since the Unix epoch
fn modified_secs(path: &Path) -> std::io::Result<f64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    })
}

/// Merge FTS segments, reclaim free pages and refresh planner statistics
fn maintain(conn: &Connection, full_text: bool) -> Result<(), rusqlite::Error> {
    if full_text {
        conn.execute_batch("INSERT INTO file_contents_fts(file_contents_fts) VALUES ('optimize')")?;
    }
    conn.execute_batch("VACUUM; ANALYZE;")?;
    tracing::debug!("index maintenance complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::StoreOptions;
    use filescope_core::CollectingSink;
    use std::fs;

    fn store() -> IndexStore {
        IndexStore::open_in_memory(StoreOptions::default()).unwrap()
    }

    fn file_count(store: &IndexStore) -> i64 {
        store
            .connection()
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))
            .unwrap()
    }

    fn sample_tree() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("target")).unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {\n    println!(\"hi\");\n}\n").unwrap();
        fs::write(root.join("README.md"), "# Sample\n\nSome docs\n").unwrap();
        fs::write(root.join("target/out.rs"), "fn skipped() {}\n").unwrap();
        fs::write(root.join("app.exe"), "MZ").unwrap();
        fs::write(root.join("empty.txt"), "").unwrap();
        fs::write(root.join(".secret"), "token").unwrap();
        tmp
    }

    #[test]
    fn test_index_folder_counts() {
        let tmp = sample_tree();
        let mut store = store();
        let mut sink = CollectingSink::new();

        let report = index_folder(&mut store, tmp.path(), &IndexerConfig::default(), &mut sink).unwrap();

        assert_eq!(report.new, 2);
        assert_eq!(report.updated, 0);
        assert_eq!(report.skipped, 3);
        assert_eq!(report.skip_reasons[&SkipReason::SkipExt], 1);
        assert_eq!(report.skip_reasons[&SkipReason::Empty], 1);
        assert_eq!(report.skip_reasons[&SkipReason::Hidden], 1);
        assert_eq!(file_count(&store), 2);
        assert_eq!(sink.terminal_events(), vec![&EngineEvent::Finished(2)]);
    }

    #[test]
    fn test_second_update_is_idempotent() {
        let tmp = sample_tree();
        let mut store = store();
        let config = IndexerConfig::default();

        let first = update_index(&mut store, tmp.path(), &config, &mut filescope_core::NullSink).unwrap();
        let second = update_index(&mut store, tmp.path(), &config, &mut filescope_core::NullSink).unwrap();

        assert_eq!(second.new, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.deleted, 0);
        assert_eq!(second.unchanged, first.current_count());
    }

    #[test]
    fn test_update_detects_content_change() {
        let tmp = sample_tree();
        let mut store = store();
        let config = IndexerConfig::default();
        update_index(&mut store, tmp.path(), &config, &mut filescope_core::NullSink).unwrap();

        let id_before: i64 = store
            .connection()
            .query_row("SELECT id FROM files WHERE file_name = 'README.md'", [], |row| row.get(0))
            .unwrap();

        // Same length, different bytes
        fs::write(tmp.path().join("README.md"), "# Simple\n\nSome docs\n").unwrap();
        let report = update_index(&mut store, tmp.path(), &config, &mut filescope_core::NullSink).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 1);

        let (id_after, first_line): (i64, String) = store
            .connection()
            .query_row(
                "SELECT f.id, c.content FROM files f JOIN file_contents c ON c.file_id = f.id
                 WHERE f.file_name = 'README.md' AND c.line_number = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(id_after, id_before);
        assert_eq!(first_line, "# Simple");
    }

    #[test]
    fn test_update_removes_deleted_files() {
        let tmp = sample_tree();
        let mut store = store();
        let config = IndexerConfig::default();
        update_index(&mut store, tmp.path(), &config, &mut filescope_core::NullSink).unwrap();

        fs::remove_file(tmp.path().join("src/main.rs")).unwrap();
        let mut sink = CollectingSink::new();
        let report = update_index(&mut store, tmp.path(), &config, &mut sink).unwrap();

        assert_eq!(report.deleted, 1);
        assert_eq!(file_count(&store), 1);
        assert!(sink.progress_messages().contains(&"Deleted: main.rs"));

        let orphans: i64 = store
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM file_contents WHERE file_id NOT IN (SELECT id FROM files)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_file_growing_past_ceiling_is_removed() {
        let tmp = sample_tree();
        let mut store = store();
        update_index(&mut store, tmp.path(), &IndexerConfig::default(), &mut filescope_core::NullSink).unwrap();

        let tight = IndexerConfig::default().with_max_file_size(50);
        fs::write(tmp.path().join("README.md"), "x".repeat(100)).unwrap();
        let report = update_index(&mut store, tmp.path(), &tight, &mut filescope_core::NullSink).unwrap();

        assert_eq!(report.skip_reasons[&SkipReason::TooLarge], 1);
        assert_eq!(report.deleted, 1);
    }

    #[test]
    fn test_sibling_root_is_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("app")).unwrap();
        fs::create_dir_all(tmp.path().join("application")).unwrap();
        fs::write(tmp.path().join("app/a.txt"), "alpha\n").unwrap();
        fs::write(tmp.path().join("application/b.txt"), "beta\n").unwrap();

        let mut store = store();
        let config = IndexerConfig::default();
        update_index(&mut store, &tmp.path().join("application"), &config, &mut filescope_core::NullSink).unwrap();
        let report = update_index(&mut store, &tmp.path().join("app"), &config, &mut filescope_core::NullSink).unwrap();

        assert_eq!(report.deleted, 0);
        assert_eq!(file_count(&store), 2);
    }

    #[test]
    fn test_commit_every_file() {
        let tmp = sample_tree();
        let mut store = store();
        let config = IndexerConfig::default().with_commit_every(1);

        let report = update_index(&mut store, tmp.path(), &config, &mut filescope_core::NullSink).unwrap();
        assert_eq!(report.new, 2);
        assert_eq!(file_count(&store), 2);
    }

    #[test]
    fn test_store_failure_keeps_committed_batches() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"] {
            fs::write(tmp.path().join(name), format!("line in {}\n", name)).unwrap();
        }

        let mut store = store();
        store
            .connection()
            .execute_batch(
                "CREATE TRIGGER reject_d BEFORE INSERT ON files
                 WHEN NEW.file_name = 'd.txt'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let config = IndexerConfig::default().with_commit_every(2);
        let mut sink = CollectingSink::new();
        let result = update_index(&mut store, tmp.path(), &config, &mut sink);
        assert!(result.is_err());

        // a and b were committed, c was in the batch that failed
        let names: Vec<String> = store
            .connection()
            .prepare("SELECT file_name FROM files ORDER BY file_name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);

        let lines: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM file_contents", [], |row| row.get(0))
            .unwrap();
        assert_eq!(lines, 2);

        let terminal = sink.terminal_events();
        assert_eq!(terminal.len(), 1);
        assert!(matches!(terminal[0], EngineEvent::Error(m) if m.contains("rejected")));
    }

    #[test]
    fn test_maintenance_runs_above_threshold() {
        let tmp = sample_tree();
        let mut store = store();
        let config = IndexerConfig::default().with_maintenance_threshold(0);
        let mut sink = CollectingSink::new();

        update_index(&mut store, tmp.path(), &config, &mut sink).unwrap();
        assert!(sink.progress_messages().contains(&"Optimizing index..."));
        assert_eq!(sink.terminal_events().len(), 1);
    }

    #[test]
    fn test_missing_root_emits_single_error() {
        let mut store = store();
        let mut sink = CollectingSink::new();

        let result = update_index(
            &mut store,
            Path::new("/nonexistent/filescope/root"),
            &IndexerConfig::default(),
            &mut sink,
        );

        assert!(matches!(result, Err(IndexerError::RootNotFound(_))));
        let terminal = sink.terminal_events();
        assert_eq!(terminal.len(), 1);
        assert!(matches!(terminal[0], EngineEvent::Error(_)));
    }

    #[test]
    fn test_progress_reports_directories() {
        let tmp = sample_tree();
        let mut store = store();
        let mut sink = CollectingSink::new();
        update_index(&mut store, tmp.path(), &IndexerConfig::default(), &mut sink).unwrap();

        let messages = sink.progress_messages();
        assert!(messages.contains(&"Scanning src"));
        assert!(!messages.iter().any(|m| m.contains("target")));
        assert!(messages.last().unwrap().starts_with("Index complete"));
    }

    #[test]
    fn test_summary_lists_skip_labels() {
        let mut report = IndexReport {
            new: 3,
            total_size: 2048,
            ..Default::default()
        };
        report.record_skip(SkipReason::Hidden);
        report.record_skip(SkipReason::Hidden);
        report.record_skip(SkipReason::TooLarge);

        assert_eq!(
            report.summary(),
            "Index complete: 3 new, 0 updated, 0 deleted, 0 unchanged, 3 skipped \
             (hidden files: 2, too large: 1), 0 errors, 2.00 KB indexed"
        );
    }
}
