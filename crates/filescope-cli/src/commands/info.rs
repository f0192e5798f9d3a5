//! Info command - show index statistics

use anyhow::Result;
use filescope_db::IndexReader;

use crate::cli::{Cli, OutputFormat};
use crate::output::{colors, human, json};

pub fn run(cli: &Cli) -> Result<()> {
    let db_path = cli.db_path();
    let reader = IndexReader::open(&db_path)?;
    let info = reader.index_info()?;

    match cli.format {
        OutputFormat::Human => {
            println!("{}", colors::header("Index Info"));
            println!();
            println!("{}", human::format_info(&info, &db_path));
        }

        OutputFormat::Json => {
            println!("{}", json::format_info(&info, &db_path, cli.pretty));
        }

        OutputFormat::Minimal => {
            println!("{}", info.file_count);
        }
    }

    Ok(())
}
