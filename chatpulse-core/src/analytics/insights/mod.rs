//! Rule-based insight generator
//!
//! Rules read the aggregates of one request and each emit at most one
//! [`Insight`]. They are independent: every rule sees the same inputs and
//! none sees another rule's output.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     INSIGHT GENERATOR                        │
//! │                                                              │
//! │  ┌───────────┐ ┌─────────┐ ┌───────────────┐ ┌────────┐      │
//! │  │ dominance │ │  harm   │ │ concentration │ │ growth │ ...  │
//! │  └─────┬─────┘ └────┬────┘ └───────┬───────┘ └───┬────┘      │
//! │        ▼            ▼              ▼             ▼           │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ InsightGenerator::generate()                           │  │
//! │  │  - no data → single fallback insight                   │  │
//! │  │  - runs each rule, logs and skips failures             │  │
//! │  │  - sorts by priority, stable in rule order             │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chatpulse_core::analytics::{create_default_generator, InsightInputs};
//!
//! let generator = create_default_generator();
//! let insights = generator.generate(&InsightInputs {
//!     metrics: Some(&snapshot),
//!     content: Some(&content),
//!     trends: &trends,
//!     now,
//! });
//! ```

pub mod rules;

pub use rules::create_default_generator;

use super::content::ContentSummary;
use super::metrics::MetricsSnapshot;
use super::trends::TrendComparison;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confidence of the no-data fallback insight.
pub const FALLBACK_CONFIDENCE: u8 = 20;

// ============================================
// Insight types
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Trend,
    Alert,
    Opportunity,
    Summary,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::Trend => "trend",
            InsightType::Alert => "alert",
            InsightType::Opportunity => "opportunity",
            InsightType::Summary => "summary",
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "trend" => Ok(InsightType::Trend),
            "alert" => Ok(InsightType::Alert),
            "opportunity" => Ok(InsightType::Opportunity),
            "summary" => Ok(InsightType::Summary),
            _ => Err(format!("Unknown insight type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    High,
    Medium,
    Low,
}

impl InsightPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightPriority::High => "high",
            InsightPriority::Medium => "medium",
            InsightPriority::Low => "low",
        }
    }

    /// Sort rank (lower = shown first)
    pub fn rank(&self) -> u8 {
        match self {
            InsightPriority::High => 0,
            InsightPriority::Medium => 1,
            InsightPriority::Low => 2,
        }
    }
}

impl fmt::Display for InsightPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightPriority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "high" => Ok(InsightPriority::High),
            "medium" => Ok(InsightPriority::Medium),
            "low" => Ok(InsightPriority::Low),
            _ => Err(format!("Unknown insight priority: {}", s)),
        }
    }
}

/// A named value backing an insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportingData {
    pub metric: String,
    pub value: serde_json::Value,
}

/// A finding emitted by a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    /// `<rule>-<YYYYMMDDHHMMSS>`, deterministic for a given "now"
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub priority: InsightPriority,
    pub title: String,
    pub description: String,
    /// Fixed per rule, 0..=100
    pub confidence: u8,
    pub supporting_data: Vec<SupportingData>,
    pub timestamp: DateTime<Utc>,
}

impl Insight {
    pub fn new(
        rule: &str,
        insight_type: InsightType,
        priority: InsightPriority,
        confidence: u8,
        title: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("{}-{}", rule, now.format("%Y%m%d%H%M%S")),
            insight_type,
            priority,
            title: title.into(),
            description: description.into(),
            confidence: confidence.min(100),
            supporting_data: Vec::new(),
            timestamp: now,
        }
    }

    /// Attach a supporting value
    pub fn with_data(mut self, metric: &str, value: impl Into<serde_json::Value>) -> Self {
        self.supporting_data.push(SupportingData {
            metric: metric.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn data(&self, metric: &str) -> Option<&serde_json::Value> {
        self.supporting_data
            .iter()
            .find(|d| d.metric == metric)
            .map(|d| &d.value)
    }
}

/// The single insight returned when there is nothing to analyze.
pub fn fallback_insight(now: DateTime<Utc>) -> Insight {
    Insight::new(
        "fallback",
        InsightType::Summary,
        InsightPriority::Low,
        FALLBACK_CONFIDENCE,
        "Insufficient data",
        "There is not enough data in the selected window to generate insights.",
        now,
    )
}

// ============================================
// Rule trait
// ============================================

/// Aggregates a rule may read. `None` marks an aggregate that could not be
/// computed for this request.
#[derive(Debug, Clone, Copy)]
pub struct InsightInputs<'a> {
    pub metrics: Option<&'a MetricsSnapshot>,
    pub content: Option<&'a ContentSummary>,
    pub trends: &'a [TrendComparison],
    pub now: DateTime<Utc>,
}

impl InsightInputs<'_> {
    /// True when neither interactions nor content carry any record.
    pub fn has_no_data(&self) -> bool {
        let no_interactions = self.metrics.map_or(true, |m| m.is_empty());
        let no_content = self.content.map_or(true, |c| c.is_empty());
        no_interactions && no_content
    }
}

/// Trait implemented by every insight rule.
///
/// Rules are stateless and deterministic: the same inputs produce the same
/// insight, including its id.
pub trait InsightRule: Send + Sync {
    /// Unique name. Convention: `core.<rule>`; the part after the dot
    /// prefixes insight ids.
    fn name(&self) -> &str;

    fn evaluate(&self, inputs: &InsightInputs<'_>) -> Result<Option<Insight>>;

    /// Id prefix for insights from this rule.
    fn short_name(&self) -> &str {
        let name = self.name();
        name.rsplit('.').next().unwrap_or(name)
    }
}

// ============================================
// Generator
// ============================================

/// Ordered set of rules shared by every report caller.
pub struct InsightGenerator {
    rules: Vec<Box<dyn InsightRule>>,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightGenerator {
    /// Create a generator with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule; evaluation follows registration order.
    pub fn register(&mut self, rule: Box<dyn InsightRule>) {
        tracing::debug!(rule = rule.name(), "Registered insight rule");
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.iter().any(|r| r.name() == name)
    }

    /// Evaluate every rule. Never empty.
    pub fn generate(&self, inputs: &InsightInputs<'_>) -> Vec<Insight> {
        if inputs.metrics.is_none() || inputs.has_no_data() {
            tracing::debug!("No data to analyze; returning fallback insight");
            return vec![fallback_insight(inputs.now)];
        }

        let mut insights = Vec::new();
        for rule in &self.rules {
            match rule.evaluate(inputs) {
                Ok(Some(insight)) => {
                    tracing::debug!(rule = rule.name(), id = %insight.id, "Rule fired");
                    insights.push(insight);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(rule = rule.name(), error = %e, "Insight rule failed");
                }
            }
        }

        if insights.is_empty() {
            return vec![fallback_insight(inputs.now)];
        }

        insights.sort_by_key(|i| i.priority.rank());
        insights
    }
}
