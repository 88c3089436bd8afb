//! Core domain types for chatpulse
//!
//! These types represent the canonical data model that every analytics
//! component consumes. Raw records arrive untyped from the record store and
//! are turned into [`InteractionRecord`] / [`ContentRecord`] by the
//! normalizer in [`crate::ingest`].
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Interaction** | One question/answer exchange between a person and the chat assistant |
//! | **Content** | A published video/post tracked for content analytics |
//! | **Platform** | The surface an interaction arrived through (web, mobile app, API, ...) |
//! | **Category** | Keyword-derived topic label of a question |
//! | **Window** | The `[start, end]` date range a computation runs over |

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Raw records
// ============================================

/// A record exactly as supplied by the record store.
///
/// Nothing about its shape is trusted: fields may be missing, empty, or of
/// an unexpected JSON type. Only the normalizer looks inside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub serde_json::Map<String, serde_json::Value>);

impl RawRecord {
    /// Wrap a JSON value; anything other than an object becomes an empty record.
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => RawRecord(map),
            _ => RawRecord::default(),
        }
    }

    /// First present, non-null field among `keys`.
    pub fn first_of(&self, keys: &[&str]) -> Option<&serde_json::Value> {
        keys.iter()
            .filter_map(|k| self.0.get(*k))
            .find(|v| !v.is_null())
    }

    pub fn as_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.clone())
    }
}

impl From<serde_json::Value> for RawRecord {
    fn from(value: serde_json::Value) -> Self {
        RawRecord::from_value(value)
    }
}

// ============================================
// Platform
// ============================================

/// Surface an interaction arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Web,
    Mobile,
    Api,
    Extension,
    Crossx,
}

/// Raw platform spellings and what they resolve to.
///
/// Matching is case-insensitive on the trimmed value. Anything not listed
/// resolves to [`Platform::Web`]; adding a new spelling is a table change.
pub const PLATFORM_ALIASES: &[(&str, Platform)] = &[
    ("web", Platform::Web),
    ("website", Platform::Web),
    ("browser", Platform::Web),
    ("desktop", Platform::Web),
    ("mobile", Platform::Mobile),
    ("mobile-web", Platform::Mobile),
    ("mweb", Platform::Mobile),
    ("api", Platform::Api),
    ("ios", Platform::Api),
    ("android", Platform::Api),
    ("app", Platform::Api),
    ("sdk", Platform::Api),
    ("extension", Platform::Extension),
    ("chrome-extension", Platform::Extension),
    ("crossx", Platform::Crossx),
    ("cross-x", Platform::Crossx),
];

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Web,
        Platform::Mobile,
        Platform::Api,
        Platform::Extension,
        Platform::Crossx,
    ];

    /// Resolve a raw platform string through [`PLATFORM_ALIASES`].
    pub fn from_raw(raw: &str) -> Platform {
        let needle = raw.trim().to_lowercase();
        PLATFORM_ALIASES
            .iter()
            .find(|(alias, _)| *alias == needle)
            .map(|(_, platform)| *platform)
            .unwrap_or(Platform::Web)
    }

    /// Distribution bucket this platform is reported under.
    pub fn bucket(&self) -> PlatformBucket {
        match self {
            Platform::Web | Platform::Crossx => PlatformBucket::Web,
            Platform::Mobile | Platform::Extension => PlatformBucket::Mobile,
            Platform::Api => PlatformBucket::Api,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Mobile => "mobile",
            Platform::Api => "api",
            Platform::Extension => "extension",
            Platform::Crossx => "crossx",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The three buckets platform distributions are reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformBucket {
    Web,
    Mobile,
    Api,
}

impl PlatformBucket {
    pub const ALL: [PlatformBucket; 3] =
        [PlatformBucket::Web, PlatformBucket::Mobile, PlatformBucket::Api];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformBucket::Web => "web",
            PlatformBucket::Mobile => "mobile",
            PlatformBucket::Api => "api",
        }
    }
}

impl std::fmt::Display for PlatformBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Language & Category
// ============================================

/// Language of a piece of text, as decided by [`crate::classify::detect_language`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Ko, Language::En];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
        }
    }

    /// Returns the display name for this language
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Ko => "Korean",
            Language::En => "English",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ko" | "kr" | "korean" => Ok(Language::Ko),
            "en" | "english" => Ok(Language::En),
            _ => Err(format!("unknown language: {}", s)),
        }
    }
}

/// Topic label of a question, as decided by [`crate::classify::categorize_question`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Price,
    Dex,
    Bridge,
    Wallet,
    Support,
    General,
}

impl Category {
    /// All categories in rule-evaluation order; `General` is the fallback.
    pub const ALL: [Category; 6] = [
        Category::Price,
        Category::Dex,
        Category::Bridge,
        Category::Wallet,
        Category::Support,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Price => "price",
            Category::Dex => "dex",
            Category::Bridge => "bridge",
            Category::Wallet => "wallet",
            Category::Support => "support",
            Category::General => "general",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Price => "Price & market",
            Category::Dex => "DEX & swaps",
            Category::Bridge => "Bridge",
            Category::Wallet => "Wallet",
            Category::Support => "Support",
            Category::General => "General",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

// ============================================
// Normalized records
// ============================================

/// A validated chat interaction.
///
/// Created by the normalizer, never mutated, dropped at the end of the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Question text (never empty)
    pub input: String,
    /// Answer text (may be empty)
    pub output: String,
    pub platform: Platform,
    pub language: Language,
    pub category: Category,
}

/// A validated content item (video/post) for content analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub channel: String,
    pub creator: String,
    pub language: String,
    /// 0.0 = negative, 1.0 = positive
    pub sentiment: f64,
    /// 0.0 = harmless, 1.0 = harmful
    pub harm: f64,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
}

impl ContentRecord {
    /// Likes + comments.
    pub fn engagement(&self) -> u64 {
        self.likes.saturating_add(self.comments)
    }
}

// ============================================
// Date range
// ============================================

/// Inclusive `[start, end]` calendar window requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> crate::Result<Self> {
        if start > end {
            return Err(crate::Error::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days`-long range ending on the date of `now`.
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        let end = now.date_naive();
        let start = end - Duration::days(i64::from(days.max(1)) - 1);
        Self { start, end }
    }

    /// First instant of the range.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// First instant after the range (exclusive bound).
    pub fn end_instant(&self) -> DateTime<Utc> {
        (self.end + Duration::days(1))
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start_instant() && ts < self.end_instant()
    }

    /// Number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Instant trend windows end at: the earlier of `now` and the last
    /// millisecond of the range.
    pub fn trend_anchor(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.min(self.end_instant() - Duration::milliseconds(1))
    }

    /// Same range widened backwards so both trend windows ending at the
    /// anchor, `(anchor - 2w, anchor]`, are fully covered.
    pub fn with_trend_lookback(&self, window_days: u32, now: DateTime<Utc>) -> Self {
        let window_days = window_days.clamp(1, crate::config::MAX_TREND_WINDOW_DAYS);
        let reach = self
            .trend_anchor(now)
            .checked_sub_signed(Duration::days(2 * i64::from(window_days)))
            .map_or(NaiveDate::MIN, |t| t.date_naive());
        Self {
            start: self.start.min(reach),
            end: self.end,
        }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_platform_alias_table() {
        assert_eq!(Platform::from_raw("crossx"), Platform::Crossx);
        assert_eq!(Platform::from_raw("  iOS "), Platform::Api);
        assert_eq!(Platform::from_raw("Android"), Platform::Api);
        assert_eq!(Platform::from_raw("app"), Platform::Api);
        assert_eq!(Platform::from_raw("extension"), Platform::Extension);
        assert_eq!(Platform::from_raw("smart-fridge"), Platform::Web);
        assert_eq!(Platform::from_raw(""), Platform::Web);
    }

    #[test]
    fn test_platform_buckets() {
        assert_eq!(Platform::Crossx.bucket(), PlatformBucket::Web);
        assert_eq!(Platform::Extension.bucket(), PlatformBucket::Mobile);
        assert_eq!(Platform::from_raw("ios").bucket(), PlatformBucket::Api);
        for platform in Platform::ALL {
            assert!(PlatformBucket::ALL.contains(&platform.bucket()));
        }
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_value(Language::Ko).unwrap(), json!("ko"));
        assert_eq!(serde_json::to_value(Category::Dex).unwrap(), json!("dex"));
        assert_eq!(
            serde_json::to_value(Platform::Crossx).unwrap(),
            json!("crossx")
        );
        assert_eq!("wallet".parse::<Category>().unwrap(), Category::Wallet);
        assert!("nft".parse::<Category>().is_err());
        assert_eq!("Korean".parse::<Language>().unwrap(), Language::Ko);
    }

    #[test]
    fn test_raw_record_first_of() {
        let raw = RawRecord::from_value(json!({"question": null, "input": "hi"}));
        assert_eq!(raw.first_of(&["question", "input"]), Some(&json!("hi")));
        assert!(raw.first_of(&["missing"]).is_none());

        let not_object = RawRecord::from_value(json!([1, 2, 3]));
        assert!(not_object.0.is_empty());
    }

    #[test]
    fn test_date_range() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let range = DateRange::new(d("2024-03-01"), d("2024-03-07")).unwrap();
        assert_eq!(range.days(), 7);
        assert!(range.contains(d("2024-03-07").and_hms_opt(23, 59, 59).unwrap().and_utc()));
        assert!(!range.contains(d("2024-03-08").and_hms_opt(0, 0, 0).unwrap().and_utc()));
        let after = d("2024-04-02").and_hms_opt(0, 0, 0).unwrap().and_utc();
        assert_eq!(range.with_trend_lookback(7, after).start, d("2024-02-22"));

        assert!(DateRange::new(d("2024-03-08"), d("2024-03-01")).is_err());

        let now = d("2024-03-31").and_hms_opt(12, 0, 0).unwrap().and_utc();
        let last = DateRange::last_days(now, 30);
        assert_eq!(last.start, d("2024-03-02"));
        assert_eq!(last.end, d("2024-03-31"));
    }

    #[test]
    fn test_trend_lookback_covers_both_windows_for_short_ranges() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let now = d("2024-03-31").and_hms_opt(18, 0, 0).unwrap().and_utc();
        let one_day = DateRange::new(d("2024-03-31"), d("2024-03-31")).unwrap();

        assert_eq!(one_day.trend_anchor(now), now);
        let lookback = one_day.with_trend_lookback(7, now);
        assert_eq!(lookback.start, d("2024-03-17"));
        assert_eq!(lookback.end, d("2024-03-31"));

        // A long range already reaches past both windows
        let month = DateRange::new(d("2024-01-01"), d("2024-03-31")).unwrap();
        assert_eq!(month.with_trend_lookback(7, now).start, d("2024-01-01"));
    }

    #[test]
    fn test_trend_lookback_clamps_huge_windows() {
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let now = d("2024-03-31").and_hms_opt(0, 0, 0).unwrap().and_utc();
        let range = DateRange::new(d("2024-03-01"), d("2024-03-31")).unwrap();

        let lookback = range.with_trend_lookback(u32::MAX, now);
        assert_eq!(lookback.start, d("2022-03-30"));
    }
}
