//! # fru CLI - What changed since the last backup?
//!
//! Command-line front end for the fru diffing library.
//!
//! ## Usage
//! ```bash
//! # List changes between the last backup and the live folder
//! fru diff /backup/docs /exchange/docs
//!
//! # Same, as JSON, on 8 workers, ignoring temp files
//! fru diff /backup/docs /exchange/docs --json --jobs 8 --exclude '*.tmp'
//!
//! # What an incremental snapshot has to copy and remove
//! fru plan /backup/docs /exchange/docs
//! ```
//!
//! ## Exit codes
//! - 0: success (whether or not anything changed)
//! - 1: configuration or other errors
//! - 2: unsupported file type (symlink, socket, pipe, device)
//! - 3: I/O error
//! - 130: cancelled

use clap::{Parser, Subcommand};
use colored::*;
use fru::{
    ChangeKind, ChangeRecord, ChangeSummary, ContentComparison, DiffConfig, FsTree,
    IncrementalPlan, Result, TracingObserver, TreeDiffer, TreeDifferBuilder,
};
use humantime::format_duration;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// fru CLI - Recursive folder diffing for incremental backups
#[derive(Parser)]
#[command(name = "fru")]
#[command(version)]
#[command(about = "Compare two folder trees and report what an incremental backup must capture")]
#[command(long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that runs a diff
#[derive(clap::Args)]
struct DiffArgs {
    /// Previously backed-up tree
    original: PathBuf,

    /// Tree as it is now
    current: PathBuf,

    /// Worker threads (0 = one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Glob pattern of relative paths to ignore (repeatable)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Always read whole files instead of comparing lengths first
    #[arg(long)]
    full_compare: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List changed paths
    Diff {
        #[command(flatten)]
        args: DiffArgs,

        /// Print records as JSON
        #[arg(long)]
        json: bool,

        /// Print only the summary line
        #[arg(long)]
        summary: bool,
    },

    /// Show what an incremental snapshot must copy and remove
    Plan {
        #[command(flatten)]
        args: DiffArgs,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging; stdout is reserved for results
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    // Run command
    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        std::process::exit(e.exit_code());
    }
}

/// Main command runner
fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => DiffConfig::from_json_file(path)?,
        None => DiffConfig::default(),
    };

    match cli.command {
        Commands::Diff { args, json, summary } => {
            cmd_diff(&config, args, json, summary, cli.verbose)
        }
        Commands::Plan { args, json } => cmd_plan(&config, args, json, cli.verbose),
    }
}

/// List the change records between two trees
fn cmd_diff(
    config: &DiffConfig,
    args: DiffArgs,
    json: bool,
    summary_only: bool,
    verbose: bool,
) -> Result<()> {
    let records = run_diff(config, &args, verbose)?;
    let summary = ChangeSummary::from_records(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if !summary_only {
        for record in &records {
            println!("{}", format_record(record));
        }
    }

    if summary_only || verbose {
        print_summary(&summary);
    }

    Ok(())
}

/// Show the copy and remove sets of an incremental snapshot
fn cmd_plan(config: &DiffConfig, args: DiffArgs, json: bool, verbose: bool) -> Result<()> {
    let records = run_diff(config, &args, verbose)?;
    let plan = IncrementalPlan::from_records(&records);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    if plan.is_empty() {
        println!("{}", "Nothing to back up".green());
        return Ok(());
    }

    println!("{}", "Copy:".bold());
    for path in &plan.copy {
        println!("  {}", path.display().to_string().green());
    }

    println!("{}", "Remove:".bold());
    for path in &plan.remove {
        println!("  {}", path.display().to_string().red());
    }

    print_summary(&plan.summary);
    Ok(())
}

/// Build the differ from config plus command-line overrides and run it
fn run_diff(config: &DiffConfig, args: &DiffArgs, verbose: bool) -> Result<Vec<ChangeRecord>> {
    let original = FsTree::open(&args.original)?;
    let current = FsTree::open(&args.current)?;
    let differ = build_differ(config, args, verbose)?;

    let start = Instant::now();
    let records = differ.diff(&original, &current)?;

    if verbose {
        eprintln!(
            "{} {} vs {} in {}",
            "Compared".blue().bold(),
            display(&args.original),
            display(&args.current),
            format_duration(start.elapsed())
        );
    }

    Ok(records)
}

fn build_differ(config: &DiffConfig, args: &DiffArgs, verbose: bool) -> Result<TreeDiffer> {
    let mut exclude = config.exclude.clone();
    exclude.extend(args.exclude.iter().cloned());

    let mut builder = TreeDifferBuilder::from_config(config).exclude_patterns(exclude);
    if let Some(jobs) = args.jobs {
        builder = builder.parallel_workers(jobs);
    }
    if args.full_compare {
        builder = builder.comparison(ContentComparison::Bytes);
    }
    if verbose {
        builder = builder.observer(Arc::new(TracingObserver));
    }
    builder.build()
}

fn format_record(record: &ChangeRecord) -> String {
    let tag = record.kind.tag().to_string();
    let tag = match record.kind {
        ChangeKind::Added => tag.green().bold(),
        ChangeKind::Deleted => tag.red().bold(),
        ChangeKind::Modified => tag.yellow().bold(),
    };
    format!("{} {}", tag, record.path.display())
}

fn print_summary(summary: &ChangeSummary) {
    if summary.has_changes() {
        println!("{}", summary.to_string().cyan());
    } else {
        println!("{}", "No changes".green());
    }
}

fn display(path: &Path) -> ColoredString {
    path.display().to_string().cyan()
}
