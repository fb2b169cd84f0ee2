//! Refresh the bundled template catalog from a published spreadsheet.
//!
//! ```bash
//! subplanner-sync https://docs.google.com/spreadsheets/d/SHEET_ID/edit#gid=GID
//! ```

use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process;
use subplanner::templates::sync_templates;
use subplanner::StoreConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

const EXAMPLE_URL: &str = "https://docs.google.com/spreadsheets/d/YOUR_ID/edit#gid=GID";

#[derive(Parser)]
#[command(name = "subplanner-sync")]
#[command(about = "Sync subscription templates from a published spreadsheet", long_about = None)]
#[command(version)]
struct Cli {
    /// Spreadsheet URL containing /d/{id}/ and optionally #gid={gid}
    #[arg(value_name = "SPREADSHEET_URL")]
    url: String,

    /// Where to write the templates (defaults to the configured templates path)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// TOML config file to read the templates path from
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn usage() {
    eprintln!("Usage: subplanner-sync <spreadsheet-url>");
    eprintln!("Example: subplanner-sync {}", EXAMPLE_URL);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            process::exit(0);
        }
        Err(e) => {
            let _ = e.print();
            usage();
            process::exit(1);
        }
    };

    let config = match &cli.config {
        Some(path) => match StoreConfig::from_toml_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config: {}", e);
                process::exit(1);
            }
        },
        None => StoreConfig::default(),
    };
    let dest = cli.output.unwrap_or(config.templates_path);

    match sync_templates(&cli.url, &dest) {
        Ok(report) => {
            println!(
                "Synced {} templates to {}",
                report.rows,
                report.path.display()
            );
        }
        Err(subplanner::StoreError::InvalidSpreadsheetUrl(url)) => {
            eprintln!("Invalid spreadsheet URL: {}", url);
            eprintln!("Expected format: https://docs.google.com/spreadsheets/d/{{ID}}/edit#gid={{GID}}");
            usage();
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to sync templates: {}", e);
            process::exit(1);
        }
    }
}
