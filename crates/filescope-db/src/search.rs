//! Line search over the index
//!
//! Literal queries go through the FTS5 trigram index when the store has one
//! and the keyword is long enough to form a trigram. Every other query scans
//! the candidate lines in order and matches them in process with the same
//! Unicode case folding, so literal and regex modes agree on every store.

use filescope_core::{EngineEvent, EventSink, SearchHit, Subtree};
use regex::{Regex, RegexBuilder};
use rusqlite::ToSql;

use crate::connection::{DbError, IndexReader};

/// Upper bound on hits returned by a single search
pub const MAX_RESULTS: usize = 10_000;

/// Trigram tokens need at least this many characters to match anything
const MIN_FTS_CHARS: usize = 3;

/// A single search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    /// Restrict hits to files inside this directory
    pub scope: Option<String>,
    pub use_regex: bool,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            scope: None,
            use_regex: false,
            limit: MAX_RESULTS,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_regex(mut self, use_regex: bool) -> Self {
        self.use_regex = use_regex;
        self
    }

    /// Cap the number of hits; values above [`MAX_RESULTS`] are clamped
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_RESULTS);
        self
    }
}

/// Quote a keyword as a single FTS5 phrase
fn fts_phrase(keyword: &str) -> String {
    format!("\"{}\"", keyword.replace('"', "\"\""))
}

/// Case-insensitive matcher for a keyword taken literally
fn literal_matcher(keyword: &str) -> Result<Regex, DbError> {
    Ok(RegexBuilder::new(&regex::escape(keyword))
        .case_insensitive(true)
        .build()?)
}

impl IndexReader {
    /// Run a search, returning hits ordered by path then line number
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, DbError> {
        if query.keyword.is_empty() {
            return Err(DbError::EmptyQuery);
        }
        let limit = query.limit.min(MAX_RESULTS);

        if query.use_regex {
            self.search_regex(query, limit)
        } else {
            self.search_literal(query, limit)
        }
    }

    fn search_literal(&self, query: &SearchQuery, limit: usize) -> Result<Vec<SearchHit>, DbError> {
        let use_fts =
            self.full_text_enabled() && query.keyword.chars().count() >= MIN_FTS_CHARS;
        tracing::debug!(use_fts, keyword = %query.keyword, "literal search");

        if !use_fts {
            let matcher = literal_matcher(&query.keyword)?;
            return self.scan_lines(query.scope.as_deref(), &matcher, limit);
        }

        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(fts_phrase(&query.keyword))];
        let mut sql = String::from(
            "SELECT f.file_path, c.line_number, c.content
             FROM file_contents_fts
             JOIN file_contents c ON c.id = file_contents_fts.rowid
             JOIN files f ON f.id = c.file_id
             WHERE file_contents_fts MATCH ?",
        );
        push_scope(&mut sql, &mut params, query.scope.as_deref());
        sql.push_str(" ORDER BY f.file_path, c.line_number LIMIT ?");
        params.push(Box::new(limit as i64));

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_hit)?;

        let mut hits = Vec::new();
        for row in rows {
            hits.push(row?);
        }
        Ok(hits)
    }

    fn search_regex(&self, query: &SearchQuery, limit: usize) -> Result<Vec<SearchHit>, DbError> {
        let pattern = RegexBuilder::new(&query.keyword)
            .case_insensitive(true)
            .build()?;
        tracing::debug!(pattern = %query.keyword, "regex search");

        self.scan_lines(query.scope.as_deref(), &pattern, limit)
    }

    /// Walk stored lines in path/line order, keeping those `pattern` matches
    fn scan_lines(
        &self,
        scope: Option<&str>,
        pattern: &Regex,
        limit: usize,
    ) -> Result<Vec<SearchHit>, DbError> {
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        let mut sql = String::from(
            "SELECT f.file_path, c.line_number, c.content
             FROM file_contents c
             JOIN files f ON f.id = c.file_id
             WHERE 1=1",
        );
        push_scope(&mut sql, &mut params, scope);
        sql.push_str(" ORDER BY f.file_path, c.line_number");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt.query_map(param_refs.as_slice(), row_to_hit)?;

        let mut hits = Vec::new();
        for row in rows {
            let hit = row?;
            if pattern.is_match(&hit.line) {
                hits.push(hit);
                if hits.len() >= limit {
                    break;
                }
            }
        }
        Ok(hits)
    }
}

fn push_scope(sql: &mut String, params: &mut Vec<Box<dyn ToSql>>, scope: Option<&str>) {
    if let Some(scope) = scope {
        let tree = Subtree::new(scope);
        sql.push_str(" AND ");
        sql.push_str(&Subtree::sql_predicate("f.file_path"));
        params.push(Box::new(tree.exact().to_string()));
        params.push(Box::new(tree.prefix().to_string()));
        params.push(Box::new(tree.prefix().to_string()));
    }
}

fn row_to_hit(row: &rusqlite::Row) -> rusqlite::Result<SearchHit> {
    Ok(SearchHit {
        path: row.get(0)?,
        line_number: row.get(1)?,
        line: row.get(2)?,
    })
}

/// Run a search and report it through `sink`
///
/// Emits a progress message, then `Finished(hit count)` or a single `Error`.
pub fn run_search(
    reader: &IndexReader,
    query: &SearchQuery,
    sink: &mut dyn EventSink,
) -> Result<Vec<SearchHit>, DbError> {
    let mode = if query.use_regex {
        "regex"
    } else if reader.full_text_enabled() {
        "full-text"
    } else {
        "substring"
    };
    sink.progress(&format!("Searching for '{}' ({})", query.keyword, mode));

    match reader.search(query) {
        Ok(hits) => {
            sink.emit(EngineEvent::Finished(hits.len()));
            Ok(hits)
        }
        Err(e) => {
            sink.emit(EngineEvent::Error(format!("Search failed: {}", e)));
            Err(e)
        }
    }
}
