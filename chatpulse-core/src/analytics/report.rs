//! Per-mode report assembly
//!
//! [`ReportAssembler`] is the one place that decides which records feed
//! which aggregate:
//!
//! - records inside the requested range feed metrics, activity, content and
//!   every listing mode (topics, platforms, questions, conversations)
//! - records in the look-back-extended range feed the trend windows, which
//!   are anchored at the earlier of "now" and the end of the range
//!
//! Each mode produces one [`ReportPayload`] variant. `overview` bundles all
//! of them with the insight list.

use super::activity::{ActivityEngine, ActivityHeatmap};
use super::content::ContentSummary;
use super::insights::{create_default_generator, Insight, InsightGenerator, InsightInputs};
use super::metrics::{MetricsAggregator, MetricsSnapshot, PlatformDistribution};
use super::percentage;
use super::trends::{TrendComparison, TrendEngine, TrendWindows};
use crate::config::AnalyticsConfig;
use crate::error::{Error, Result};
use crate::types::{
    Category, ContentRecord, DateRange, InteractionRecord, Language, Platform, PlatformBucket,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================
// Modes
// ============================================

/// Report variant requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    Metrics,
    Activity,
    Topics,
    Platforms,
    Questions,
    Conversations,
    Overview,
}

impl ReportMode {
    pub const ALL: [ReportMode; 7] = [
        ReportMode::Metrics,
        ReportMode::Activity,
        ReportMode::Topics,
        ReportMode::Platforms,
        ReportMode::Questions,
        ReportMode::Conversations,
        ReportMode::Overview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportMode::Metrics => "metrics",
            ReportMode::Activity => "activity",
            ReportMode::Topics => "topics",
            ReportMode::Platforms => "platforms",
            ReportMode::Questions => "questions",
            ReportMode::Conversations => "conversations",
            ReportMode::Overview => "overview",
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        ReportMode::ALL
            .into_iter()
            .find(|m| m.as_str() == needle)
            .ok_or_else(|| Error::InvalidMode(s.to_string()))
    }
}

// ============================================
// Sentiment
// ============================================

/// Average sentiment above which the window reads as positive.
pub const POSITIVE_SENTIMENT_THRESHOLD: f64 = 0.6;
/// Average sentiment below which the window reads as negative.
pub const NEGATIVE_SENTIMENT_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallSentiment {
    Positive,
    Neutral,
    Negative,
}

impl OverallSentiment {
    /// Label an average sentiment score in `[0, 1]`.
    pub fn from_average(average: f64) -> Self {
        if average > POSITIVE_SENTIMENT_THRESHOLD {
            OverallSentiment::Positive
        } else if average < NEGATIVE_SENTIMENT_THRESHOLD {
            OverallSentiment::Negative
        } else {
            OverallSentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallSentiment::Positive => "positive",
            OverallSentiment::Neutral => "neutral",
            OverallSentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for OverallSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Question grouping
// ============================================

/// Grouping key for repeated questions: trimmed, lowercased, inner
/// whitespace collapsed.
pub fn question_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

struct QuestionGroup {
    key: String,
    /// Lexicographically smallest original spelling
    text: String,
    count: u64,
    category: Category,
    language: Language,
}

/// Group records by [`question_key`]; most frequent first, ties by key.
fn group_questions<'a>(records: impl Iterator<Item = &'a InteractionRecord>) -> Vec<QuestionGroup> {
    let mut groups: BTreeMap<String, QuestionGroup> = BTreeMap::new();
    for record in records {
        let text = record.input.trim();
        let key = question_key(text);
        let group = groups.entry(key.clone()).or_insert_with(|| QuestionGroup {
            key,
            text: text.to_string(),
            count: 0,
            category: record.category,
            language: record.language,
        });
        group.count += 1;
        if text < group.text.as_str() {
            group.text = text.to_string();
            group.category = record.category;
            group.language = record.language;
        }
    }

    let mut groups: Vec<QuestionGroup> = groups.into_values().collect();
    // Stable: BTreeMap yields key order for equal counts
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

// ============================================
// Listing payloads
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTopic {
    pub category: Category,
    pub display_name: String,
    pub count: u64,
    pub percentage: f64,
    /// Most frequent questions of this category
    pub samples: Vec<String>,
}

/// Per-category counts with sample questions, every category in fixed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    pub total: u64,
    pub categories: Vec<CategoryTopic>,
}

impl CategoryBreakdown {
    pub fn build(records: &[InteractionRecord], samples_per_category: usize) -> Self {
        let total = records.len() as u64;
        let categories = Category::ALL
            .into_iter()
            .map(|category| {
                let groups =
                    group_questions(records.iter().filter(|r| r.category == category));
                let count = groups.iter().map(|g| g.count).sum();
                CategoryTopic {
                    category,
                    display_name: category.display_name().to_string(),
                    count,
                    percentage: percentage(count, total),
                    samples: groups
                        .into_iter()
                        .take(samples_per_category)
                        .map(|g| g.text)
                        .collect(),
                }
            })
            .collect();
        Self { total, categories }
    }

    pub fn get(&self, category: Category) -> Option<&CategoryTopic> {
        self.categories.iter().find(|c| c.category == category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCount {
    pub platform: Platform,
    pub bucket: PlatformBucket,
    pub count: u64,
    pub percentage: f64,
}

/// Bucketed distribution plus the raw per-platform counts behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformBreakdown {
    pub total: u64,
    pub distribution: PlatformDistribution,
    pub platforms: Vec<PlatformCount>,
}

impl PlatformBreakdown {
    pub fn build(records: &[InteractionRecord], distribution: PlatformDistribution) -> Self {
        let total = records.len() as u64;
        let platforms = Platform::ALL
            .into_iter()
            .map(|platform| {
                let count = records.iter().filter(|r| r.platform == platform).count() as u64;
                PlatformCount {
                    platform,
                    bucket: platform.bucket(),
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect();
        Self {
            total,
            distribution,
            platforms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatedQuestion {
    pub question: String,
    pub count: u64,
    pub category: Category,
    pub language: Language,
}

/// Most asked questions of the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDigest {
    pub total_questions: u64,
    pub unique_questions: u64,
    pub top: Vec<RepeatedQuestion>,
}

impl QuestionDigest {
    pub fn build(records: &[InteractionRecord], top_n: usize) -> Self {
        let groups = group_questions(records.iter());
        Self {
            total_questions: records.len() as u64,
            unique_questions: groups.len() as u64,
            top: groups
                .into_iter()
                .take(top_n)
                .map(|g| RepeatedQuestion {
                    question: g.text,
                    count: g.count,
                    category: g.category,
                    language: g.language,
                })
                .collect(),
        }
    }
}

/// Most recent interactions, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    pub total: u64,
    pub page_size: usize,
    pub conversations: Vec<InteractionRecord>,
}

impl ConversationPage {
    pub fn build(records: &[InteractionRecord], page_size: usize) -> Self {
        let mut sorted: Vec<&InteractionRecord> = records.iter().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        Self {
            total: records.len() as u64,
            page_size,
            conversations: sorted.into_iter().take(page_size).cloned().collect(),
        }
    }
}

// ============================================
// Composite payloads
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub metrics: MetricsSnapshot,
    pub trends: Vec<TrendComparison>,
    pub insights: Vec<Insight>,
}

/// Everything at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    /// In-range interaction count
    pub total_records: u64,
    pub date_range: DateRange,
    pub generated_at: DateTime<Utc>,
    pub metrics: MetricsSnapshot,
    pub activity: ActivityHeatmap,
    pub topics: CategoryBreakdown,
    pub platforms: PlatformBreakdown,
    pub trends: Vec<TrendComparison>,
    pub content_trends: Vec<TrendComparison>,
    pub content: ContentSummary,
    pub insights: Vec<Insight>,
    /// `None` when no content carries sentiment
    pub overall_sentiment: Option<OverallSentiment>,
    /// Not tracked by any record source; always `null`
    pub satisfaction_score: Option<f64>,
    /// Not tracked by any record source; always `null`
    pub average_response_time_ms: Option<f64>,
}

/// JSON body of a report, one shape per [`ReportMode`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportPayload {
    Metrics(MetricsReport),
    Activity(ActivityHeatmap),
    Topics(CategoryBreakdown),
    Platforms(PlatformBreakdown),
    Questions(QuestionDigest),
    Conversations(ConversationPage),
    Overview(Box<Overview>),
}

impl ReportPayload {
    pub fn mode(&self) -> ReportMode {
        match self {
            ReportPayload::Metrics(_) => ReportMode::Metrics,
            ReportPayload::Activity(_) => ReportMode::Activity,
            ReportPayload::Topics(_) => ReportMode::Topics,
            ReportPayload::Platforms(_) => ReportMode::Platforms,
            ReportPayload::Questions(_) => ReportMode::Questions,
            ReportPayload::Conversations(_) => ReportMode::Conversations,
            ReportPayload::Overview(_) => ReportMode::Overview,
        }
    }
}

// ============================================
// Assembly
// ============================================

/// Records of one request, split by the requested range.
#[derive(Debug, Clone)]
pub struct RecordWindow {
    pub range: DateRange,
    /// Trend anchor: the earlier of "now" and the end of the range
    pub anchor: DateTime<Utc>,
    pub interactions: Vec<InteractionRecord>,
    pub content: Vec<ContentRecord>,
    /// In-range plus look-back records, for trend windows only
    pub lookback_interactions: Vec<InteractionRecord>,
    pub lookback_content: Vec<ContentRecord>,
}

impl RecordWindow {
    /// Partition fetched records. Records after the range, or before the
    /// look-back, are discarded.
    pub fn partition(
        interactions: Vec<InteractionRecord>,
        content: Vec<ContentRecord>,
        range: DateRange,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let lookback = range.with_trend_lookback(window_days, now);
        let anchor = range.trend_anchor(now);

        let lookback_interactions: Vec<InteractionRecord> = interactions
            .into_iter()
            .filter(|r| lookback.contains(r.timestamp))
            .collect();
        let lookback_content: Vec<ContentRecord> = content
            .into_iter()
            .filter(|r| lookback.contains(r.timestamp))
            .collect();

        Self {
            range,
            anchor,
            interactions: lookback_interactions
                .iter()
                .filter(|r| range.contains(r.timestamp))
                .cloned()
                .collect(),
            content: lookback_content
                .iter()
                .filter(|r| range.contains(r.timestamp))
                .cloned()
                .collect(),
            lookback_interactions,
            lookback_content,
        }
    }
}

/// Aggregates computed once per request and shared by every mode.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParts {
    pub metrics: MetricsSnapshot,
    pub activity: ActivityHeatmap,
    pub trends: Vec<TrendComparison>,
    pub content_trends: Vec<TrendComparison>,
    pub content: ContentSummary,
}

/// Turns a record window into a payload. Holds the shared insight generator.
pub struct ReportAssembler {
    config: AnalyticsConfig,
    generator: InsightGenerator,
}

impl ReportAssembler {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            config,
            generator: create_default_generator(),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn generator(&self) -> &InsightGenerator {
        &self.generator
    }

    pub fn metrics(&self, window: &RecordWindow, now: DateTime<Utc>) -> MetricsSnapshot {
        MetricsAggregator::new(now).aggregate(&window.interactions)
    }

    pub fn activity(&self, window: &RecordWindow) -> ActivityHeatmap {
        ActivityEngine::new(self.config.offset()).build(&window.interactions)
    }

    pub fn trends(&self, window: &RecordWindow) -> Vec<TrendComparison> {
        let windows = TrendWindows::split(
            &window.lookback_interactions,
            window.anchor,
            self.config.trend_window_days,
        );
        TrendEngine::new().compare(&windows)
    }

    pub fn content_trends(&self, window: &RecordWindow) -> Vec<TrendComparison> {
        let windows = TrendWindows::split(
            &window.lookback_content,
            window.anchor,
            self.config.trend_window_days,
        );
        TrendEngine::new().compare_content(&windows)
    }

    pub fn content(&self, window: &RecordWindow) -> ContentSummary {
        ContentSummary::build(&window.content, self.config.top_creators)
    }

    /// Compute every aggregate on the calling thread.
    pub fn analyze(&self, window: &RecordWindow, now: DateTime<Utc>) -> AnalysisParts {
        AnalysisParts {
            metrics: self.metrics(window, now),
            activity: self.activity(window),
            trends: self.trends(window),
            content_trends: self.content_trends(window),
            content: self.content(window),
        }
    }

    /// Run the insight rules over computed aggregates.
    pub fn insights(&self, parts: &AnalysisParts, now: DateTime<Utc>) -> Vec<Insight> {
        let trends: Vec<TrendComparison> = parts
            .trends
            .iter()
            .chain(parts.content_trends.iter())
            .cloned()
            .collect();
        self.generator.generate(&InsightInputs {
            metrics: Some(&parts.metrics),
            content: Some(&parts.content),
            trends: &trends,
            now,
        })
    }

    /// Shape the payload for `mode`.
    pub fn build(
        &self,
        mode: ReportMode,
        window: &RecordWindow,
        parts: AnalysisParts,
        insights: Vec<Insight>,
        now: DateTime<Utc>,
    ) -> ReportPayload {
        let interactions = &window.interactions;
        match mode {
            ReportMode::Metrics => ReportPayload::Metrics(MetricsReport {
                metrics: parts.metrics,
                trends: parts.trends,
                insights,
            }),
            ReportMode::Activity => ReportPayload::Activity(parts.activity),
            ReportMode::Topics => ReportPayload::Topics(CategoryBreakdown::build(
                interactions,
                self.config.samples_per_category,
            )),
            ReportMode::Platforms => ReportPayload::Platforms(PlatformBreakdown::build(
                interactions,
                parts.metrics.platform_distribution,
            )),
            ReportMode::Questions => ReportPayload::Questions(QuestionDigest::build(
                interactions,
                self.config.top_questions,
            )),
            ReportMode::Conversations => ReportPayload::Conversations(ConversationPage::build(
                interactions,
                self.config.conversation_page_size,
            )),
            ReportMode::Overview => ReportPayload::Overview(Box::new(Overview {
                total_records: interactions.len() as u64,
                date_range: window.range,
                generated_at: now,
                topics: CategoryBreakdown::build(interactions, self.config.samples_per_category),
                platforms: PlatformBreakdown::build(
                    interactions,
                    parts.metrics.platform_distribution,
                ),
                overall_sentiment: parts
                    .content
                    .average_sentiment
                    .map(OverallSentiment::from_average),
                metrics: parts.metrics,
                activity: parts.activity,
                trends: parts.trends,
                content_trends: parts.content_trends,
                content: parts.content,
                insights,
                satisfaction_score: None,
                average_response_time_ms: None,
            })),
        }
    }

    /// Partition, analyze and build in one call.
    ///
    /// `interactions` and `content` may include look-back records; only those
    /// inside `range` reach the snapshot, heatmap and listings.
    pub fn assemble(
        &self,
        mode: ReportMode,
        interactions: &[InteractionRecord],
        content: &[ContentRecord],
        range: DateRange,
        now: DateTime<Utc>,
    ) -> ReportPayload {
        let window = RecordWindow::partition(
            interactions.to_vec(),
            content.to_vec(),
            range,
            self.config.trend_window_days,
            now,
        );
        let parts = self.analyze(&window, now);
        let insights = self.insights(&parts, now);
        self.build(mode, &window, parts, insights, now)
    }
}
