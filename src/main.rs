//! sqlite-exporter - Forensic SQLite-to-CSV Exporter
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use sqlite_exporter::config::{CliArgs, ExportConfig, InputSource};
use sqlite_exporter::discover::resolve_sources;
use sqlite_exporter::export::ExportRun;
use sqlite_exporter::progress::{print_header, print_summary, ProgressReporter};
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = ExportConfig::from_args(args).context("Invalid configuration")?;

    // Resolve inputs into a concrete ordered list of source files
    let sources = resolve_sources(&config).context("Failed to resolve input files")?;
    if sources.is_empty() {
        warn!("No SQLite files found under the given input");
    }

    // Print header
    if config.show_progress {
        print_header(
            &input_display(&config.input),
            &config.output_dir.display().to_string(),
        );
    }

    let exporter = ExportRun::new(config.clone());

    // Setup signal handler for graceful shutdown; the flag is observed
    // between batches so partial CSVs stay intact
    let shutdown_flag = exporter.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, finishing current batch...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    // Create progress reporter
    let progress = if config.show_progress {
        Some(ProgressReporter::new())
    } else {
        None
    };

    // Run the export
    let summary = exporter
        .run(&sources, progress.as_ref())
        .context("Export failed")?;

    // Finish progress
    if let Some(ref p) = progress {
        if summary.interrupted {
            p.finish("Export interrupted");
        } else {
            p.finish("Export completed");
        }
    }

    // Print summary
    print_summary(&summary, &config.output_dir.display().to_string());

    // Unit failures are visible in the log and summary but partial
    // success is not a fatal condition
    if summary.error_count() > 0 {
        info!(errors = summary.error_count(), "Export completed with errors");
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("sqlite_exporter=debug,warn")
    } else {
        EnvFilter::new("sqlite_exporter=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}

fn input_display(input: &InputSource) -> String {
    match input {
        InputSource::File(path) => path.display().to_string(),
        InputSource::Folder { path, recursive } => {
            if *recursive {
                format!("{} (recursive)", path.display())
            } else {
                path.display().to_string()
            }
        }
    }
}
