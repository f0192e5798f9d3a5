//! Human-readable output formatting

use filescope_core::{format_size, IndexInfo, SearchHit};
use filescope_indexer::IndexReport;
use regex::{Regex, RegexBuilder};
use std::ops::Range;
use std::path::Path;

use super::colors::*;

/// Marks the first match of a search inside a result line
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    /// Literal keywords match case-insensitively, like the search itself
    pub fn new(keyword: &str, use_regex: bool) -> Self {
        let source = if use_regex {
            keyword.to_string()
        } else {
            regex::escape(keyword)
        };
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .ok();
        Self { pattern }
    }

    /// Byte range of the first non-empty match
    pub fn find(&self, line: &str) -> Option<Range<usize>> {
        self.pattern
            .as_ref()?
            .find(line)
            .filter(|m| !m.is_empty())
            .map(|m| m.range())
    }

    pub fn apply(&self, line: &str) -> String {
        match self.find(line) {
            Some(range) => format!(
                "{}{}{}",
                &line[..range.start],
                highlight(&line[range.clone()]),
                &line[range.end..]
            ),
            None => line.to_string(),
        }
    }
}

/// Format a search hit below its file heading
pub fn format_hit(hit: &SearchHit, highlighter: &Highlighter) -> String {
    format!(
        "{}: {}",
        colored_line_num(hit.line_number),
        highlighter.apply(&hit.line)
    )
}

/// Format the result of an indexing run
pub fn format_report(report: &IndexReport, root: &Path) -> String {
    let mut lines = vec![
        format!("  {}: {}", label("Root"), value(&root.display().to_string())),
        format!("  {}: {}", label("New"), format_count(report.new as i64)),
        format!("  {}: {}", label("Updated"), format_count(report.updated as i64)),
        format!("  {}: {}", label("Deleted"), format_count(report.deleted as i64)),
        format!("  {}: {}", label("Unchanged"), format_count(report.unchanged as i64)),
        format!("  {}: {}", label("Skipped"), format_count(report.skipped as i64)),
    ];

    for (reason, count) in &report.skip_reasons {
        lines.push(format!(
            "    {}: {}",
            label(reason.label()),
            format_count(*count as i64)
        ));
    }

    lines.push(format!("  {}: {}", label("Errors"), format_count(report.errors as i64)));
    lines.push(format!(
        "  {}: {}",
        label("Content indexed"),
        value(&format_size(report.total_size))
    ));
    lines.join("\n")
}

/// Format index statistics
pub fn format_info(info: &IndexInfo, db_path: &Path) -> String {
    let mode = if info.full_text_enabled {
        "full-text (FTS5)"
    } else {
        "substring (fallback)"
    };

    let mut lines = vec![
        format!("  {}: {}", label("Database"), db_path.display()),
        format!("  {}: {}", label("Version"), value(&info.version.to_string())),
        format!("  {}: {}", label("Search mode"), value(mode)),
        String::new(),
        format!("  {}: {}", label("Files"), format_count(info.file_count)),
        format!("  {}: {}", label("Lines"), format_count(info.line_count)),
        format!("  {}: {}", label("Content size"), value(&format_size(info.total_size))),
        format!("  {}: {}", label("Index size"), value(&format_size(info.index_size))),
        format!("  {}: {}", label("Ratio"), value(&info.ratio_display())),
        format!(
            "  {}: {}",
            label("Last indexed"),
            value(info.last_indexed.as_deref().unwrap_or("never"))
        ),
    ];

    if !info.file_types.is_empty() {
        lines.push(String::new());
        lines.push(header("File types"));
        lines.push(String::new());
        for stat in &info.file_types {
            lines.push(format!(
                "  {:<12} {:>8}  {}",
                stat.display_extension(),
                format_count(stat.count),
                format_size(stat.total_size)
            ));
        }
    }

    lines.join("\n")
}
