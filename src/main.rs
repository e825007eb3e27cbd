use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use bd_accessioner::cli::{Args, Commands};
use bd_accessioner::config::{load_or_create_config, PipelineConfig};
use bd_accessioner::models::ItemStatus;
use bd_accessioner::processing::{process_batch, process_item, BatchReport, ItemOutcome};
use bd_accessioner::tools::SystemRunner;

fn main() -> Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    initialize_logging(args.verbose)?;

    // Handle subcommands
    if let Some(cmd) = &args.command {
        return handle_subcommand(cmd);
    }

    let kind = args.item_kind()?;
    let batch = args.batch_mode()?;
    let source = args.source_dir()?;
    if !source.is_dir() {
        anyhow::bail!("Source {} is not a directory", source.display());
    }

    let mut config = load_or_create_config(args.config.as_deref())?;
    if args.keep_image {
        config.keep_image = true;
    }
    let runner = SystemRunner::new(config.tool_timeout());

    info!("Starting accession of {} ({})", source.display(), kind);
    if batch {
        let report = process_batch(source, kind, &config, &runner)?;
        log_batch_report(&report);
    } else {
        let outcome = process_item(source, kind, &config, &runner)?;
        log_item_outcome(&outcome);
    }

    info!("Accession completed");
    Ok(())
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ).context("Failed to initialize logger")?;
    Ok(())
}

fn handle_subcommand(cmd: &Commands) -> Result<()> {
    match cmd {
        Commands::InitConfig { path } => {
            info!("Creating default configuration file at {}", path.display());
            PipelineConfig::create_default_config_file(path)?;
            info!("Configuration created successfully");
            Ok(())
        }
    }
}

fn log_item_outcome(outcome: &ItemOutcome) {
    match outcome.status {
        ItemStatus::Success => info!(
            "{}: success ({} provenance events)",
            outcome.item_dir.display(),
            outcome.provenance.len()
        ),
        status => warn!(
            "{}: {} ({})",
            outcome.item_dir.display(),
            status,
            outcome.message.as_deref().unwrap_or("no message")
        ),
    }
}

fn log_batch_report(report: &BatchReport) {
    for item in &report.items {
        log_item_outcome(item);
    }
    for (status, items) in report.items_by_status() {
        if status != ItemStatus::Success && !items.is_empty() {
            warn!("{} item(s) {}; review them before the next run", items.len(), status);
        }
    }
}
