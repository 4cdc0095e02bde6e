// SPDX-License-Identifier: MIT

//! taxis CLI: sort a directory, show history, undo the last session

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use taxis::config::{default_config_path, AppConfig};
use taxis::history::{default_history_path, Ledger};
use taxis::media::human_size;
use taxis::metadata::show_metadata;
use taxis::model::ModelClient;
use taxis::rules::{default_rules_path, RuleSet};
use taxis::sorter::{RunReport, SortOptions, Sorter};
use taxis::undo::{undo_latest, UndoOutcome};

/// taxis - AI-assisted directory organizer
#[derive(Parser, Debug)]
#[command(name = "taxis")]
#[command(version)]
#[command(about = "Sort a directory into category folders, with undo", long_about = None)]
struct Cli {
    /// Source directory to sort
    source: Option<PathBuf>,

    /// Output directory (default: SOURCE/sorted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sort files in subdirectories recursively (the default)
    #[arg(short, long)]
    recursive: bool,

    /// Only sort files in the top level of the source directory
    #[arg(long, conflicts_with = "recursive")]
    no_recursive: bool,

    /// Preview the sort without moving anything
    #[arg(long)]
    dry_run: bool,

    /// Show sorting history grouped by session date
    #[arg(long)]
    history: bool,

    /// Undo the most recent sorting session
    #[arg(long)]
    undo: bool,

    /// Show detailed metadata for a file or directory
    #[arg(long, value_name = "PATH")]
    metadata: Option<PathBuf>,

    /// Path to the engine configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if cli.history {
        return show_history();
    }

    if cli.undo {
        return run_undo();
    }

    if let Some(path) = cli.metadata {
        return show_metadata(&path).map_err(Into::into);
    }

    let source = cli
        .source
        .clone()
        .context("Source directory is required (see --help)")?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };
    let config = AppConfig::load(&config_path)?;
    let rules = RuleSet::load(&default_rules_path()?)?;
    let mut ledger = Ledger::load(default_history_path()?)?;

    let model = ModelClient::from_env(&config);
    if !model.has_credentials() {
        info!(
            "{} not set; sorting deterministically without model assistance",
            taxis::config::API_KEY_ENV
        );
    }

    let sorter = Sorter::new(
        &rules,
        &model,
        SortOptions {
            source,
            dest: cli.output.clone(),
            recursive: !cli.no_recursive,
            dry_run: cli.dry_run,
        },
    );

    let report = sorter.run(&mut ledger).await?;

    if report.dry_run {
        print_preview(&report);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn show_history() -> anyhow::Result<()> {
    let ledger = Ledger::load(default_history_path()?)?;
    if ledger.is_empty() {
        println!("No history found.");
        return Ok(());
    }

    println!("Sorting History");
    println!("{:<12} {:>14} {:>10}", "Date", "Files Sorted", "Renamed");

    let mut total_files = 0;
    let mut total_renamed = 0;
    for (date, entries) in ledger.sessions().iter().rev() {
        let renamed = entries.iter().filter(|e| e.ai_renamed).count();
        println!("{:<12} {:>14} {:>10}", date, entries.len(), renamed);
        total_files += entries.len();
        total_renamed += renamed;
    }

    println!();
    println!("Total files sorted: {}", total_files);
    println!("Total files renamed: {}", total_renamed);
    Ok(())
}

fn run_undo() -> anyhow::Result<()> {
    let mut ledger = Ledger::load(default_history_path()?)?;

    match undo_latest(&mut ledger)? {
        UndoOutcome::NothingToUndo => {
            println!("No history found; nothing to undo.");
        }
        UndoOutcome::Undone { date, restored, skipped } => {
            println!("Undoing sorting for date: {}", date);
            for (dest, original) in &restored {
                println!(
                    "  Moved back: {} -> {}",
                    dest.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
                    original.display()
                );
            }
            if skipped > 0 {
                println!("  Skipped {} entries (destination missing)", skipped);
            }
            println!("Undo complete: {} restored.", restored.len());
        }
    }

    Ok(())
}

fn print_preview(report: &RunReport) {
    println!("DRY RUN MODE - No files will be moved\n");

    if report.preview.is_empty() {
        println!("Nothing to sort.");
        return;
    }

    for planned in &report.preview {
        println!(
            "  {:<40} -> {:<10} ({})",
            planned.name,
            planned.category,
            planned.destination.display()
        );
    }

    println!();
    println!("Summary:");
    println!("  Files to sort: {}", report.preview.len());
    println!("  Total size:    {}", human_size(report.stats.total_bytes));
    println!("  Destination:   {}", report.dest.display());
    println!();
    println!("Run without --dry-run to actually move files");
}

fn print_summary(report: &RunReport) {
    let stats = &report.stats;

    println!();
    println!("Successfully sorted: {} files", stats.sorted);
    if stats.errors > 0 {
        println!("Errors: {} files", stats.errors);
    }
    if stats.skipped > 0 {
        println!("Skipped: {} files", stats.skipped);
    }
    if stats.ai_renamed > 0 {
        println!("AI renamed: {} files", stats.ai_renamed);
    }
    println!("Total size: {}", human_size(stats.total_bytes));

    if !stats.by_category.is_empty() {
        println!();
        println!("Files by Category:");
        let mut counts: Vec<_> = stats.by_category.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (category, count) in counts {
            let percentage = if stats.sorted > 0 {
                *count as f64 / stats.sorted as f64 * 100.0
            } else {
                0.0
            };
            println!("  {:<12} {:>6} {:>7.1}%", category, count, percentage);
        }
    }
}
