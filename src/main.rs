//! depsync - Python dependency constraint synchronizer CLI tool
//!
//! Keeps the `>=` / `~=` floors in pyproject.toml and requirements*.txt
//! in step with the latest releases on the package index.

use clap::Parser;
use depsync::cli::{CliArgs, Command};
use depsync::config::SyncConfig;
use depsync::logging;
use depsync::output::create_formatter;
use depsync::sync::Synchronizer;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if let Err(e) = logging::init(args.output_config().verbosity) {
        eprintln!("Error: failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let command = args.command();
    let output_config = args.output_config();
    let upgrade_request = args.upgrade_request();
    debug!("depsync v{} ({:?})", env!("CARGO_PKG_VERSION"), command);

    let config = SyncConfig::resolve(&args.overrides())?;

    // Only a real upgrade refuses to touch a global interpreter
    if matches!(command, Command::Upgrade { dry_run: false, .. }) {
        config.ensure_isolated()?;
    } else if !config.is_isolated() {
        warn!("no virtualenv, conda env or .venv detected; installed versions are unavailable");
    }

    let synchronizer = Synchronizer::new(&config)?.with_progress(output_config.shows_progress());
    let formatter = create_formatter(output_config);
    let mut stdout = io::stdout().lock();

    match command {
        Command::Show { offline } => {
            let report = synchronizer.show(&config, offline).await?;
            formatter.format_show(&report, &mut stdout)?;
        }
        Command::Upgrade { .. } => {
            let request = upgrade_request.unwrap_or_default();
            let report = synchronizer.upgrade(&config, &request).await?;
            formatter.format_sync(&report, &mut stdout)?;
        }
        Command::UpdateComments { dry_run } => {
            let report = synchronizer.update_comments(&config, dry_run)?;
            formatter.format_comments(&report, &mut stdout)?;
        }
    }

    stdout.flush()?;
    Ok(ExitCode::SUCCESS)
}
