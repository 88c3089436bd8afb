//! chatpulse-report - CLI tool to print analytics reports
//!
//! Reads raw records from export files (`--input`/`--content`) or, when none
//! are given, from the SQLite record store filled by `chatpulse-import`.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/chatpulse/records.db (~/.local/share/chatpulse/records.db)
//! - Logs: $XDG_STATE_HOME/chatpulse/chatpulse.log (~/.local/state/chatpulse/chatpulse.log)
//! - Config: $XDG_CONFIG_HOME/chatpulse/config.toml (~/.config/chatpulse/config.toml)

mod render;

use anyhow::{Context, Result};
use chatpulse_core::{
    Config, Database, DateRange, JsonFileSource, RecordSource, ReportMode, ReportRequest,
    ReportService, SqliteSource,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, ValueEnum};
use render::Style;
use std::sync::Arc;

/// Days covered when no range is given.
const DEFAULT_RANGE_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Md,
    Text,
}

#[derive(Parser)]
#[command(name = "chatpulse-report")]
#[command(about = "Print an analytics report over chat interactions and content")]
#[command(version)]
struct Args {
    /// Report mode: metrics, activity, topics, platforms, questions, conversations, overview
    #[arg(short, long, default_value = "overview", value_parser = parse_mode)]
    mode: ReportMode,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day of the range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Interaction export file or glob (repeatable)
    #[arg(short, long)]
    input: Vec<String>,

    /// Content export file or glob (repeatable)
    #[arg(short, long)]
    content: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Fixed clock (RFC 3339) for reproducible output
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

fn parse_mode(s: &str) -> std::result::Result<ReportMode, String> {
    s.parse::<ReportMode>().map_err(|e| e.to_string())
}

/// Resolve `--from`/`--to` into a range; a missing bound is filled from the other.
fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Result<DateRange> {
    let span = Duration::days(i64::from(DEFAULT_RANGE_DAYS) - 1);
    let range = match (from, to) {
        (None, None) => DateRange::last_days(now, DEFAULT_RANGE_DAYS),
        (Some(start), None) => DateRange::new(start, now.date_naive().max(start))?,
        (None, Some(end)) => DateRange::new(end - span, end)?,
        (Some(start), Some(end)) => DateRange::new(start, end)?,
    };
    Ok(range)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        chatpulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let now = args.now.unwrap_or_else(Utc::now);
    let range = resolve_range(args.from, args.to, now).context("invalid date range")?;

    let source: Arc<dyn RecordSource> = if args.input.is_empty() && args.content.is_empty() {
        let db_path = config.database_path();
        tracing::info!(path = %db_path.display(), "Reading records from database");
        let db = Database::open(&db_path).context("failed to open database")?;
        db.migrate().context("failed to run database migrations")?;
        Arc::new(SqliteSource::new(Arc::new(db)))
    } else {
        Arc::new(JsonFileSource::new(args.input.clone(), args.content.clone()))
    };

    let service = ReportService::new(source, &config);
    let outcome = service
        .generate(ReportRequest {
            mode: args.mode,
            range,
            now: Some(now),
        })
        .await;

    let rendered = match args.format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(&outcome).context("failed to serialize report")?
        }
        OutputFormat::Md => render::render(&outcome, Style::Markdown)?,
        OutputFormat::Text => render::render(&outcome, Style::Text)?,
    };
    println!("{}", rendered);

    if let Some(error) = &outcome.error {
        anyhow::bail!("report built without data: {}", error);
    }

    tracing::info!(mode = %args.mode, range = %range, "chatpulse-report complete");
    Ok(())
}
