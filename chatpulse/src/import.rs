//! chatpulse-import - CLI tool to load raw export files into the record store
//!
//! Accepts JSON arrays, `{"records": [...]}` wrappers and JSON Lines. Records
//! are stored verbatim; validation happens when a report reads them.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/chatpulse/records.db (~/.local/share/chatpulse/records.db)
//! - Logs: $XDG_STATE_HOME/chatpulse/chatpulse.log (~/.local/state/chatpulse/chatpulse.log)
//! - Config: $XDG_CONFIG_HOME/chatpulse/config.toml (~/.config/chatpulse/config.toml)

mod import_lock;

use anyhow::{Context, Result};
use chatpulse_core::db::{ImportStats, RecordKind};
use chatpulse_core::ingest::{expand_patterns, read_export_file};
use chatpulse_core::{Config, Database};
use clap::{ArgAction, Parser};
use import_lock::acquire_import_guard;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatpulse-import")]
#[command(about = "Load raw interaction and content exports into the record store")]
#[command(version)]
struct Args {
    /// Interaction export file or glob (repeatable)
    #[arg(short, long)]
    interactions: Vec<String>,

    /// Content export file or glob (repeatable)
    #[arg(short, long)]
    content: Vec<String>,

    /// Verbose output (-v per-file counts)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Dry run - read and count records but don't write
    #[arg(long)]
    dry_run: bool,
}

#[derive(Debug, Default)]
struct ImportSummary {
    files: usize,
    records_read: usize,
    interactions: ImportStats,
    content: ImportStats,
}

impl ImportSummary {
    fn add(&mut self, kind: RecordKind, stats: ImportStats) {
        let target = match kind {
            RecordKind::Interaction => &mut self.interactions,
            RecordKind::Content => &mut self.content,
        };
        target.written += stats.written;
        target.undated += stats.undated;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.interactions.is_empty() && args.content.is_empty() {
        anyhow::bail!("nothing to import: pass --interactions and/or --content");
    }

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        chatpulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("chatpulse-import starting");

    let mut files: Vec<(RecordKind, PathBuf)> = Vec::new();
    for (kind, patterns) in [
        (RecordKind::Interaction, &args.interactions),
        (RecordKind::Content, &args.content),
    ] {
        let paths = expand_patterns(patterns).context("failed to resolve export files")?;
        files.extend(paths.into_iter().map(|p| (kind, p)));
    }

    println!("Found {} export file(s)", files.len());

    if args.dry_run {
        for (kind, path) in &files {
            let records = read_export_file(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            println!("  - {} ({:?}): {} record(s)", path.display(), kind, records.len());
        }
        println!("\nDry run - nothing written");
        tracing::info!("Dry run complete");
        return Ok(());
    }

    let db_path = config.database_path();
    let _import_guard = acquire_import_guard(&db_path).context("failed to acquire import lock")?;

    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    println!("Database: {}", db_path.display());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut summary = ImportSummary::default();
    for (kind, path) in &files {
        pb.set_message(
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("...")
                .to_string(),
        );

        let records = read_export_file(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let stats = match kind {
            RecordKind::Interaction => db.insert_raw_interactions(&records),
            RecordKind::Content => db.insert_raw_content(&records),
        }
        .with_context(|| format!("failed to import {}", path.display()))?;

        if args.verbose > 0 {
            pb.println(format!(
                "  {}: {} read, {} written",
                path.display(),
                records.len(),
                stats.written
            ));
        }
        tracing::debug!(path = %path.display(), written = stats.written, "Imported file");

        summary.files += 1;
        summary.records_read += records.len();
        summary.add(*kind, stats);
        pb.inc(1);
    }
    pb.finish_and_clear();

    print_summary(&summary, &db)?;

    tracing::info!(
        files = summary.files,
        interactions = summary.interactions.written,
        content = summary.content.written,
        "chatpulse-import complete"
    );

    Ok(())
}

fn print_summary(summary: &ImportSummary, db: &Database) -> Result<()> {
    println!("\nImport complete:");
    println!("  Files processed:       {}", summary.files);
    println!("  Records read:          {}", summary.records_read);
    println!("  Interactions written:  {}", summary.interactions.written);
    println!("  Content written:       {}", summary.content.written);

    let undated = summary.interactions.undated + summary.content.undated;
    if undated > 0 {
        println!("  Without timestamp:     {}", undated);
    }

    println!(
        "  Store totals:          {} interaction(s), {} content item(s)",
        db.count_interactions()?,
        db.count_content()?
    );
    Ok(())
}
