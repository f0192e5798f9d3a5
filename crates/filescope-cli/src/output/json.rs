//! JSON output formatting

use filescope_core::{IndexInfo, SearchHit};
use filescope_indexer::IndexReport;
use serde::Serialize;
use std::path::Path;

fn render<T: Serialize>(value: &T, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}

/// Output a search hit as JSON
pub fn format_hit(hit: &SearchHit, pretty: bool) -> String {
    render(hit, pretty)
}

/// Output an indexing run as JSON
pub fn format_report(mode: &str, root: &Path, report: &IndexReport, pretty: bool) -> String {
    let output = serde_json::json!({
        "status": "ok",
        "mode": mode,
        "root": root.to_string_lossy(),
        "current": report.current_count(),
        "report": report,
    });
    render(&output, pretty)
}

/// Output index statistics as JSON
pub fn format_info(info: &IndexInfo, db_path: &Path, pretty: bool) -> String {
    let output = serde_json::json!({
        "db_path": db_path.to_string_lossy(),
        "version": info.version,
        "full_text_enabled": info.full_text_enabled,
        "file_count": info.file_count,
        "line_count": info.line_count,
        "total_size": info.total_size,
        "index_size": info.index_size,
        "ratio": info.ratio(),
        "last_indexed": info.last_indexed,
        "file_types": info.file_types,
    });
    render(&output, pretty)
}
