//! Ingestion: raw store records in, canonical records out.
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌──────────────────────┐
//! │  RecordSource   │ ──► │    Normalizer    │ ──► │ InteractionRecord[]  │
//! │ (sqlite, json,  │     │ (drops unusable  │     │ ContentRecord[]      │
//! │  in-memory)     │     │  records)        │     │                      │
//! └─────────────────┘     └──────────────────┘     └──────────────────────┘
//! ```
//!
//! Sources only filter by date range. The normalizer is the only place that
//! looks inside a [`RawRecord`](crate::types::RawRecord) to decide whether it
//! is usable.

mod normalize;
mod source;

pub use normalize::{
    normalize_content, normalize_interactions, parse_timestamp, raw_timestamp, DropStats,
    NormalizeResult, NEUTRAL_SENTIMENT,
};
pub(crate) use normalize::raw_id;
pub use source::{
    expand_patterns, read_export_file, InMemorySource, JsonFileSource, RecordSource,
};
