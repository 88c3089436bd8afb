//! Database layer for chatpulse
//!
//! SQLite record store with:
//! - Schema migrations
//! - Raw record import (upsert by record id)
//! - Date-window queries, exposed to the pipeline as a [`RecordSource`](crate::ingest::RecordSource)

pub mod repo;
pub mod schema;

pub use repo::{Database, ImportStats, RecordKind, SqliteSource};
