//! Analytics over normalized record windows
//!
//! Every computation here is a pure function of the records handed to it
//! plus a single "now" captured once per request:
//! - [`metrics`]: counts and distributions
//! - [`activity`]: 7×24 day/hour heatmap
//! - [`trends`]: period-over-period deltas
//! - [`content`]: per-channel content statistics
//! - [`insights`]: rule-based findings over the above
//! - [`report`]: per-mode payload assembly
//!
//! ## Data flow
//!
//! ```text
//!                ┌──► MetricsAggregator ──┐
//!                ├──► ActivityEngine ─────┤
//! records ───────┼──► TrendEngine ────────┼──► InsightGenerator ──► ReportAssembler
//!                └──► ContentSummary ─────┘
//! ```

pub mod activity;
pub mod content;
pub mod insights;
pub mod metrics;
pub mod report;
pub mod trends;

pub use activity::{ActivityEngine, ActivityHeatmap, ActivitySummary, DayPattern, WeeklyPattern};
pub use content::{ChannelGroup, ContentSummary, CreatorStat};
pub use insights::{
    create_default_generator, fallback_insight, Insight, InsightGenerator, InsightInputs,
    InsightPriority, InsightRule, InsightType, SupportingData,
};
pub use metrics::{
    Distribution, DistributionEntry, MetricsAggregator, MetricsSnapshot, PlatformDistribution,
    RecentActivity,
};
pub use report::{
    question_key, AnalysisParts, CategoryBreakdown, CategoryTopic, ConversationPage,
    MetricsReport, OverallSentiment, Overview, PlatformBreakdown, PlatformCount, QuestionDigest,
    RecordWindow, RepeatedQuestion, ReportAssembler, ReportMode, ReportPayload,
    NEGATIVE_SENTIMENT_THRESHOLD, POSITIVE_SENTIMENT_THRESHOLD,
};
pub use trends::{change_pct, compare_values, TrendComparison, TrendEngine, TrendWindows};

/// `part / whole * 100` rounded to one decimal; 0 when `whole` is 0.
pub(crate) fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Score averages snapped to 1e-9 so float noise cannot cross a threshold.
pub(crate) fn round_score(value: f64) -> f64 {
    (value * 1e9).round() / 1e9
}

/// Mean of `values`, `None` when there are none.
pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
