//! Raw record validation and coercion.
//!
//! A record whose timestamp cannot be parsed, or whose primary text field
//! is missing, empty, or not a string, is excluded. Exclusion is never an
//! error: it shows up as a counter in [`NormalizeResult`] and a debug log
//! line, and downstream counts simply do not include it.

use crate::classify::{categorize_question, detect_language};
use crate::types::{ContentRecord, InteractionRecord, Platform, RawRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

const ID_KEYS: &[&str] = &["id", "_id"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "createdAt", "created_at", "date"];
const INPUT_KEYS: &[&str] = &["text_in", "question", "input", "message"];
const OUTPUT_KEYS: &[&str] = &["text_out", "answer", "response", "output"];
const PLATFORM_KEYS: &[&str] = &["platform", "source"];

/// Epoch values above this are treated as milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Sentiment assumed when a content record carries none.
pub const NEUTRAL_SENTIMENT: f64 = 0.5;

/// Why records were excluded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropStats {
    /// Timestamp missing or unparseable
    pub bad_timestamp: usize,
    /// Primary text field missing, empty, or not a string
    pub missing_text: usize,
}

impl DropStats {
    pub fn total(&self) -> usize {
        self.bad_timestamp + self.missing_text
    }
}

/// Output of a normalization pass.
#[derive(Debug, Clone)]
pub struct NormalizeResult<T> {
    /// Records that survived, in input order
    pub records: Vec<T>,
    /// Excluded record counts by reason
    pub dropped: DropStats,
}

impl<T> Default for NormalizeResult<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            dropped: DropStats::default(),
        }
    }
}

/// Normalize a window of raw chat interactions.
pub fn normalize_interactions(raw: &[RawRecord]) -> NormalizeResult<InteractionRecord> {
    let mut result = NormalizeResult::default();

    for (index, record) in raw.iter().enumerate() {
        let Some(timestamp) = raw_timestamp(record) else {
            tracing::debug!(index, "Dropping interaction: unparseable timestamp");
            result.dropped.bad_timestamp += 1;
            continue;
        };
        let Some(input) = non_empty_str(record.first_of(INPUT_KEYS)) else {
            tracing::debug!(index, "Dropping interaction: missing question text");
            result.dropped.missing_text += 1;
            continue;
        };

        let output = record
            .first_of(OUTPUT_KEYS)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let platform = record
            .first_of(PLATFORM_KEYS)
            .and_then(Value::as_str)
            .map(Platform::from_raw)
            .unwrap_or(Platform::Web);
        let id = raw_id(record).unwrap_or_else(|| derive_id(timestamp, input));

        result.records.push(InteractionRecord {
            id,
            timestamp,
            input: input.to_string(),
            output,
            platform,
            language: detect_language(Some(input)),
            category: categorize_question(Some(input)),
        });
    }

    if result.dropped.total() > 0 {
        tracing::debug!(
            kept = result.records.len(),
            bad_timestamp = result.dropped.bad_timestamp,
            missing_text = result.dropped.missing_text,
            "Normalized interaction window"
        );
    }

    result
}

/// Normalize a window of raw content records.
///
/// The channel is the primary text field. Scores default to neutral
/// sentiment / zero harm and are clamped to `[0, 1]`.
pub fn normalize_content(raw: &[RawRecord]) -> NormalizeResult<ContentRecord> {
    let mut result = NormalizeResult::default();

    for (index, record) in raw.iter().enumerate() {
        let Some(timestamp) = raw_timestamp(record) else {
            tracing::debug!(index, "Dropping content: unparseable timestamp");
            result.dropped.bad_timestamp += 1;
            continue;
        };
        let Some(channel) = non_empty_str(record.first_of(&["channel"])) else {
            tracing::debug!(index, "Dropping content: missing channel");
            result.dropped.missing_text += 1;
            continue;
        };

        let creator = non_empty_str(record.first_of(&["creator", "author"]))
            .unwrap_or(channel)
            .to_string();
        let language = match non_empty_str(record.first_of(&["language", "lang"])) {
            Some(lang) => lang.to_lowercase(),
            None => {
                let text = non_empty_str(record.first_of(&["title"])).unwrap_or(channel);
                detect_language(Some(text)).as_str().to_string()
            }
        };
        let id = raw_id(record).unwrap_or_else(|| derive_id(timestamp, channel));

        result.records.push(ContentRecord {
            id,
            timestamp,
            channel: channel.to_string(),
            creator,
            language,
            sentiment: as_score(record.first_of(&["sentiment"]), NEUTRAL_SENTIMENT),
            harm: as_score(record.first_of(&["harm", "harm_score"]), 0.0),
            views: as_count(record.first_of(&["views"])),
            likes: as_count(record.first_of(&["likes"])),
            comments: as_count(record.first_of(&["comments"])),
        });
    }

    if result.dropped.total() > 0 {
        tracing::debug!(
            kept = result.records.len(),
            bad_timestamp = result.dropped.bad_timestamp,
            missing_text = result.dropped.missing_text,
            "Normalized content window"
        );
    }

    result
}

/// Timestamp of a raw record, if it has a parseable one.
///
/// Record sources use this to apply their date-range filter; the accepted
/// formats are the same ones the normalizer accepts.
pub fn raw_timestamp(record: &RawRecord) -> Option<DateTime<Utc>> {
    record.first_of(TIMESTAMP_KEYS).and_then(parse_timestamp)
}

/// Parse a timestamp from any of the supported JSON shapes.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(from_epoch),
        Value::Object(map) => map
            .get("$date")
            .or_else(|| map.get("$numberLong"))
            .and_then(parse_timestamp),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    s.parse::<i64>().ok().and_then(from_epoch)
}

fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value.unsigned_abs() > EPOCH_MILLIS_THRESHOLD.unsigned_abs() {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

/// A string field with non-whitespace content.
fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Id carried by the record itself, if any.
pub(crate) fn raw_id(record: &RawRecord) -> Option<String> {
    match record.first_of(ID_KEYS)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("$oid")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Stable id for records the store delivered without one.
fn derive_id(timestamp: DateTime<Utc>, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_rfc3339().as_bytes());
    hasher.update(b"|");
    hasher.update(text.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

fn as_score(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => default,
    }
}

fn as_count(value: Option<&Value>) -> u64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.max(0.0) as u64))
        }
        _ => None,
    };
    parsed.unwrap_or(0)
}
