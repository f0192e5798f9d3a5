//! Search command - literal or regex search across indexed lines

use anyhow::Result;
use colored::Colorize;
use filescope_core::{EngineEvent, FnSink};
use filescope_db::{run_search, IndexReader, SearchQuery};
use std::path::Path;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, human, json};

pub fn run(
    cli: &Cli,
    keyword: &str,
    scope: Option<&Path>,
    use_regex: bool,
    limit: usize,
) -> Result<()> {
    let reader = IndexReader::open(cli.db_path())?;

    let mut query = SearchQuery::new(keyword)
        .with_regex(use_regex)
        .with_limit(limit);
    if let Some(scope) = scope {
        // Stored paths are canonical; fall back to the literal text for vanished dirs
        let resolved = scope.canonicalize().unwrap_or_else(|_| scope.to_path_buf());
        query = query.with_scope(resolved.to_string_lossy());
    }

    let mut sink = FnSink(|event: EngineEvent| {
        if let EngineEvent::Progress(message) = event {
            tracing::debug!("{}", message);
        }
    });
    let hits = run_search(&reader, &query, &mut sink)?;

    match cli.format {
        OutputFormat::Human => {
            if hits.is_empty() {
                println!("No results found for: {}", keyword.cyan());
                return Ok(());
            }

            println!(
                "{}",
                colors::header(&format!("Search results for '{}' ({})", keyword, hits.len()))
            );
            if hits.len() >= query.limit {
                println!(
                    "{}",
                    colors::warning(&format!("Showing the first {} hits", query.limit))
                );
            }

            let highlighter = human::Highlighter::new(keyword, use_regex);
            let mut current_path: Option<&str> = None;
            for hit in &hits {
                if current_path != Some(hit.path.as_str()) {
                    println!();
                    println!("{}", colors::colored_path(&hit.path));
                    current_path = Some(hit.path.as_str());
                }
                println!("{}", human::format_hit(hit, &highlighter));
            }
        }

        OutputFormat::Json => {
            for hit in &hits {
                println!("{}", json::format_hit(hit, cli.pretty));
            }
        }

        OutputFormat::Minimal => {
            for hit in &hits {
                println!("{}:{}:{}", hit.path, hit.line_number, hit.line);
            }
        }
    }

    Ok(())
}
