use anyhow::{Context, Result};
use clap::Parser;
use save::engine::Engine;
use save::plugin::RunOptions;
use save::report::{write_json, write_summary};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

fn main() -> Result<ExitCode> {
    let args = cli::Args::parse();
    init_logging(args.verbose);

    let test_root = args
        .test_root
        .canonicalize()
        .with_context(|| format!("resolve test root {}", args.test_root.display()))?;
    if let Some(path) = &args.redirect_to {
        // Executions append, so start each run from an empty file.
        std::fs::File::create(path)
            .with_context(|| format!("truncate redirect target {}", path.display()))?;
    }
    let options = RunOptions {
        test_files: args.tests,
        redirect_to: args.redirect_to,
    };
    let report = Engine::new(options).run(&test_root)?;

    let stdout = std::io::stdout();
    write_summary(&report, Some(test_root.as_path()), &mut stdout.lock())?;
    if let Some(path) = &args.report {
        write_json(&report, path)?;
        tracing::info!(path = %path.display(), "wrote report");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Logs go to stderr so stdout stays the report channel.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
