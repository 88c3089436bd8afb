//! # chatpulse-core
//!
//! Core library for chatpulse - analytics over chat interactions and
//! content records.
//!
//! This library provides:
//! - Domain types for raw and normalized records
//! - Defensive normalization and keyword classification
//! - Metrics, activity heatmaps, trend comparisons and content statistics
//! - A rule-based insight generator
//! - Record sources (in-memory, JSON export files, SQLite store)
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Raw:** untyped JSON records as delivered by a [`RecordSource`]
//! - **Normalized:** validated [`InteractionRecord`]s and [`ContentRecord`]s
//! - **Derived:** aggregates, insights and report payloads, recomputed per request
//!
//! Nothing derived is persisted.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatpulse_core::{Config, Database, DateRange, ReportMode, ReportRequest, ReportService, SqliteSource};
//! use std::sync::Arc;
//!
//! # async fn run() -> chatpulse_core::Result<()> {
//! let config = Config::load()?;
//! let db = Database::open(&config.database_path())?;
//! db.migrate()?;
//!
//! let service = ReportService::new(Arc::new(SqliteSource::new(Arc::new(db))), &config);
//! let outcome = service
//!     .generate(ReportRequest {
//!         mode: ReportMode::Overview,
//!         range: DateRange::last_days(chrono::Utc::now(), 30),
//!         now: None,
//!     })
//!     .await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{Insight, ReportMode, ReportPayload};
pub use config::Config;
pub use db::{Database, SqliteSource};
pub use error::{Error, Result};
pub use ingest::{InMemorySource, JsonFileSource, RecordSource};
pub use pipeline::{ReportOutcome, ReportRequest, ReportService};
pub use types::*;

// Public modules
pub mod analytics;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod types;
