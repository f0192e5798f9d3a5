//! Index command - build, update and clear the index

use anyhow::{anyhow, bail, Result};
use filescope_core::EngineEvent;
use filescope_indexer::{
    index_folder, update_index, IndexReport, IndexStore, IndexerConfig, StoreOptions,
};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use crate::cli::{Cli, IndexArgs, IndexCommand, OutputFormat};
use crate::output::{colors, human, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Build,
    Update,
}

impl Mode {
    fn as_str(&self) -> &'static str {
        match self {
            Mode::Build => "build",
            Mode::Update => "update",
        }
    }
}

pub fn run(cli: &Cli, command: &IndexCommand) -> Result<()> {
    match command {
        IndexCommand::Build(args) => index(cli, args, Mode::Build),
        IndexCommand::Update(args) => index(cli, args, Mode::Update),
        IndexCommand::Clear { no_fts } => clear(cli, *no_fts),
    }
}

/// Run the indexer on a worker thread and render its events as they arrive
fn index(cli: &Cli, args: &IndexArgs, mode: Mode) -> Result<()> {
    let db_path = cli.db_path();
    let root: PathBuf = args.root().to_path_buf();
    let options = StoreOptions {
        full_text: !args.no_fts,
    };
    let config = IndexerConfig::default().with_max_file_size(args.max_file_size);

    let (tx, rx) = mpsc::channel::<EngineEvent>();
    let worker_root = root.clone();
    let worker = thread::spawn(move || -> Option<IndexReport> {
        let mut sink = tx;
        let mut store = match IndexStore::open_or_create(&db_path, options) {
            Ok(store) => store,
            Err(e) => {
                let _ = sink.send(EngineEvent::Error(format!("Failed to open index: {}", e)));
                return None;
            }
        };

        let result = match mode {
            Mode::Build => index_folder(&mut store, &worker_root, &config, &mut sink),
            Mode::Update => update_index(&mut store, &worker_root, &config, &mut sink),
        };
        result.ok()
    });

    let mut failure: Option<String> = None;
    for event in rx {
        match event {
            EngineEvent::Progress(message) => {
                if cli.format == OutputFormat::Human && show_progress(&message, cli.verbose) {
                    eprintln!("{}", colors::progress(&message));
                }
            }
            EngineEvent::Finished(count) => {
                tracing::debug!(count, "indexing run finished");
            }
            EngineEvent::Error(message) => failure = Some(message),
        }
    }

    let report = worker
        .join()
        .map_err(|_| anyhow!("indexing worker panicked"))?;
    if let Some(message) = failure {
        bail!(message);
    }
    let report = report.ok_or_else(|| anyhow!("indexing ended without a result"))?;

    match cli.format {
        OutputFormat::Human => {
            let title = match mode {
                Mode::Build => "Index Built",
                Mode::Update => "Index Updated",
            };
            println!("{}", colors::header(title));
            println!();
            println!("{}", human::format_report(&report, &root));
            println!();
            if report.errors > 0 {
                println!(
                    "{}",
                    colors::warning(&format!("{} files could not be read", report.errors))
                );
            } else {
                println!(
                    "{}",
                    colors::success(&format!("{} files current", report.current_count()))
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", json::format_report(mode.as_str(), &root, &report, cli.pretty));
        }
        OutputFormat::Minimal => {
            println!("{}", report.current_count());
        }
    }

    Ok(())
}

/// Per-file "Unchanged" chatter only shows with --verbose
fn show_progress(message: &str, verbose: bool) -> bool {
    verbose || !message.starts_with("Unchanged: ")
}

fn clear(cli: &Cli, no_fts: bool) -> Result<()> {
    let db_path = cli.db_path();
    let mut store = IndexStore::open_or_create(&db_path, StoreOptions { full_text: !no_fts })?;
    store.clear()?;

    match cli.format {
        OutputFormat::Human => {
            println!("{}", colors::success(&format!("Index cleared ({})", db_path.display())));
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "status": "cleared",
                "db_path": db_path.to_string_lossy(),
                "full_text_enabled": store.full_text_enabled(),
            });
            if cli.pretty {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", serde_json::to_string(&output)?);
            }
        }
        OutputFormat::Minimal => {
            println!("cleared");
        }
    }

    Ok(())
}
