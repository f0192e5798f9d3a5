//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use filescope_db::{default_db_path, MAX_RESULTS};
use filescope_indexer::eligibility::DEFAULT_MAX_FILE_SIZE;
use std::path::{Path, PathBuf};

/// Index directory trees and search their lines
#[derive(Parser, Debug)]
#[command(name = "filescope")]
#[command(version)]
#[command(about = "Index directory trees and search their lines")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Custom database path
    #[arg(long, global = true, env = "FILESCOPE_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Database path from the flag or environment, else the default location
    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(default_db_path)
    }
}

/// Output format for commands
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output (one object per line for lists)
    Json,
    /// Minimal text output
    Minimal,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Index management subcommands
    #[command(subcommand)]
    Index(IndexCommand),

    /// Search indexed lines
    Search {
        /// Keyword, or a pattern with --regex
        keyword: String,

        /// Only search files inside this directory
        #[arg(long, short)]
        scope: Option<PathBuf>,

        /// Treat the keyword as a case-insensitive regular expression
        #[arg(long, short)]
        regex: bool,

        /// Maximum number of hits
        #[arg(short = 'n', long, default_value_t = MAX_RESULTS)]
        limit: usize,
    },

    /// Show index statistics
    Info,

    /// Diagnose the index database
    Doctor,
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// Discard the index and rebuild it from ROOT
    Build(IndexArgs),

    /// Incrementally update the index for ROOT
    Update(IndexArgs),

    /// Remove every indexed file
    Clear {
        /// Recreate the store without the full-text index
        #[arg(long)]
        no_fts: bool,
    },
}

#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Directory to index
    pub root: PathBuf,

    /// Skip files larger than this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: u64,

    /// Use plain substring search instead of the full-text index
    #[arg(long)]
    pub no_fts: bool,
}

impl IndexArgs {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::parse_from(["filescope", "search", "foo", "--scope", "/src", "-r", "-n", "5"]);
        match cli.command {
            Command::Search {
                keyword,
                scope,
                regex,
                limit,
            } => {
                assert_eq!(keyword, "foo");
                assert_eq!(scope, Some(PathBuf::from("/src")));
                assert!(regex);
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_index_build_defaults() {
        let cli = Cli::parse_from(["filescope", "--format", "json", "index", "build", "."]);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Index(IndexCommand::Build(args)) => {
                assert_eq!(args.root(), Path::new("."));
                assert_eq!(args.max_file_size, DEFAULT_MAX_FILE_SIZE);
                assert!(!args.no_fts);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
