//! Record sources
//!
//! A [`RecordSource`] is the repository the report pipeline is handed at
//! call time. It delivers the raw records of a date window and nothing
//! more: no validation, no coercion.

use super::normalize::raw_timestamp;
use crate::error::{Error, Result};
use crate::types::{DateRange, RawRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Supplies raw records for a `[start, end]` window.
///
/// Records whose timestamp the source cannot place are passed through so
/// the normalizer makes the final call on them.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn fetch_interactions(&self, range: DateRange) -> Result<Vec<RawRecord>>;

    async fn fetch_content(&self, range: DateRange) -> Result<Vec<RawRecord>>;
}

/// Keep records inside `range`, plus the ones without a usable timestamp.
fn within_range(records: &[RawRecord], range: &DateRange) -> Vec<RawRecord> {
    records
        .iter()
        .filter(|record| raw_timestamp(record).map_or(true, |ts| range.contains(ts)))
        .cloned()
        .collect()
}

// ============================================
// In-memory
// ============================================

/// Source backed by records held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    interactions: Vec<RawRecord>,
    content: Vec<RawRecord>,
}

impl InMemorySource {
    pub fn new(interactions: Vec<RawRecord>, content: Vec<RawRecord>) -> Self {
        Self {
            interactions,
            content,
        }
    }

    /// Build from JSON values (non-objects become empty records).
    pub fn from_values(interactions: Vec<Value>, content: Vec<Value>) -> Self {
        Self::new(
            interactions.into_iter().map(RawRecord::from_value).collect(),
            content.into_iter().map(RawRecord::from_value).collect(),
        )
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_interactions(&self, range: DateRange) -> Result<Vec<RawRecord>> {
        Ok(within_range(&self.interactions, &range))
    }

    async fn fetch_content(&self, range: DateRange) -> Result<Vec<RawRecord>> {
        Ok(within_range(&self.content, &range))
    }
}

// ============================================
// JSON export files
// ============================================

/// Source reading JSON / JSONL export files on every fetch.
///
/// Each pattern is either a path or a glob (`exports/2024-*.jsonl`).
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    interaction_patterns: Vec<String>,
    content_patterns: Vec<String>,
}

impl JsonFileSource {
    pub fn new(interaction_patterns: Vec<String>, content_patterns: Vec<String>) -> Self {
        Self {
            interaction_patterns,
            content_patterns,
        }
    }

    async fn load(&self, patterns: &[String], range: &DateRange) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        for path in expand_patterns(patterns)? {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Fetch(format!("failed to read {}: {}", path.display(), e)))?;
            let parsed = parse_export(&contents, &path);
            tracing::debug!(path = %path.display(), records = parsed.len(), "Loaded export file");
            records.extend(parsed);
        }
        Ok(within_range(&records, range))
    }
}

#[async_trait]
impl RecordSource for JsonFileSource {
    fn name(&self) -> &str {
        "json-files"
    }

    async fn fetch_interactions(&self, range: DateRange) -> Result<Vec<RawRecord>> {
        self.load(&self.interaction_patterns, &range).await
    }

    async fn fetch_content(&self, range: DateRange) -> Result<Vec<RawRecord>> {
        self.load(&self.content_patterns, &range).await
    }
}

/// Resolve paths and globs into a sorted, de-duplicated file list.
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let is_glob = pattern.contains(['*', '?', '[']);
        if !is_glob {
            let path = PathBuf::from(pattern);
            if !path.exists() {
                return Err(Error::Fetch(format!("export file not found: {}", pattern)));
            }
            paths.push(path);
            continue;
        }

        let matches = glob::glob(pattern).map_err(|e| Error::Glob(format!("{}: {}", pattern, e)))?;
        let before = paths.len();
        for entry in matches {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(e) => tracing::warn!(pattern = %pattern, error = %e, "Skipping unreadable glob match"),
            }
        }
        if paths.len() == before {
            tracing::warn!(pattern = %pattern, "Pattern matched no files");
        }
    }
    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Read one export file from disk.
pub fn read_export_file(path: &Path) -> Result<Vec<RawRecord>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_export(&contents, path))
}

/// Parse an export: a JSON array, an object wrapping one under
/// `records`/`data`, or JSON Lines. Unparseable lines are skipped.
fn parse_export(contents: &str, path: &Path) -> Vec<RawRecord> {
    let trimmed = contents.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(contents) {
            match value {
                Value::Array(items) => return items.into_iter().map(RawRecord::from_value).collect(),
                Value::Object(mut map) => {
                    for key in ["records", "data"] {
                        if let Some(Value::Array(items)) = map.remove(key) {
                            return items.into_iter().map(RawRecord::from_value).collect();
                        }
                    }
                    return vec![RawRecord(map)];
                }
                _ => {}
            }
        }
    }

    let mut records = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => records.push(RawRecord::from_value(value)),
            Err(e) => tracing::warn!(
                path = %path.display(),
                line = line_no + 1,
                error = %e,
                "Skipping malformed JSONL line"
            ),
        }
    }
    records
}
