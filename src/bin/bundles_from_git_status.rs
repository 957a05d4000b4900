//! Derive changed data bundles from a git status report.
//!
//! Reads the report, keeps added/modified/renamed files in the workspace
//! folder, maps them to `catalog/schema/name` bundles, validates the names and
//! writes `view_bundles.json` and `table_bundles.json` into the destination
//! directory. Logs go to stderr (`RUST_LOG` controls verbosity); stdout carries
//! a one-line summary.

use anyhow::{Context, Result};
use changed_bundles::{RunConfig, run};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "changed_bundles=info";

#[derive(Debug, Parser)]
#[command(name = "bundles-from-git-status")]
#[command(about = "Derive changed view/table bundles from a git status report")]
struct Cli {
    /// File containing list of changed files.
    git_status_file: PathBuf,
    /// Path to the destination folder.
    changed_bundles_path: PathBuf,
    /// Name of the workspace folder.
    workspace_folder: String,
    /// Whether or not to ignore case when validating table names.
    #[arg(short = 'i', long = "ignore-case", alias = "ignore_case")]
    ignore_case: bool,
    /// Required name of the folder four levels above each changed file.
    #[arg(long)]
    environment: Option<String>,
    /// Directory the paths in the status report are relative to.
    #[arg(long, env = "CHANGED_BUNDLES_REPO_ROOT", default_value = ".")]
    repo_root: PathBuf,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            status_file: self.git_status_file,
            output_dir: self.changed_bundles_path,
            workspace_folder: self.workspace_folder,
            ignore_case: self.ignore_case,
            expected_environment: self.environment,
            repo_root: self.repo_root,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(err) = run_cli(cli) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_cli(cli: Cli) -> Result<()> {
    let config = cli.into_config();
    let summary = run(&config).with_context(|| {
        format!(
            "failed to derive bundles from {}",
            config.status_file.display()
        )
    })?;
    println!(
        "{} changed file(s): {} view bundle(s), {} table bundle(s) written to {}",
        summary.changed_files,
        summary.views,
        summary.tables,
        config.output_dir.display()
    );
    Ok(())
}
