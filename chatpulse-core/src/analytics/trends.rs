//! Period-over-period comparisons.
//!
//! Two adjacent, equal-length windows ending at an anchor instant:
//!
//! ```text
//!   previous = (anchor - 2w, anchor - w]    recent = (anchor - w, anchor]
//! ──────────┬──────────────────────────────┬──────────────────────────────┬──►
//!      anchor - 2w                     anchor - w                     anchor
//! ```
//!
//! A metric is only compared when both windows hold records and its previous
//! value is a usable denominator. Anything else is left out of the result
//! rather than reported as 0, NaN or infinity.

use super::metrics::{MetricsAggregator, MetricsSnapshot};
use super::round1;
use crate::config::MAX_TREND_WINDOW_DAYS;
use crate::types::{Category, ContentRecord, InteractionRecord, PlatformBucket};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Something with an instant that can be placed into a window.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Timestamped for InteractionRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl Timestamped for ContentRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// A compared metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendComparison {
    /// Metric name, e.g. `totalInteractions` or `category.price`
    pub metric: String,
    /// Percentage change, one decimal
    pub change_pct: f64,
    /// Window length label, e.g. `7d`
    pub timeframe: String,
    pub recent: f64,
    pub previous: f64,
}

impl TrendComparison {
    /// Format delta for display (e.g., "+23.0%" or "-15.5%").
    pub fn format_delta(&self) -> String {
        if self.change_pct >= 0.0 {
            format!("+{:.1}%", self.change_pct)
        } else {
            format!("{:.1}%", self.change_pct)
        }
    }
}

/// `(recent - previous) / previous * 100`, one decimal.
///
/// `None` when `previous` is zero or either value is not finite.
pub fn change_pct(recent: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 || !previous.is_finite() || !recent.is_finite() {
        return None;
    }
    let pct = round1((recent - previous) / previous * 100.0);
    pct.is_finite().then_some(pct)
}

/// Compare one named metric, applying the omission rules.
pub fn compare_values(
    metric: &str,
    recent: f64,
    previous: f64,
    timeframe: &str,
) -> Option<TrendComparison> {
    change_pct(recent, previous).map(|change_pct| TrendComparison {
        metric: metric.to_string(),
        change_pct,
        timeframe: timeframe.to_string(),
        recent,
        previous,
    })
}

/// Records split into the recent and previous windows.
#[derive(Debug, Clone)]
pub struct TrendWindows<T> {
    pub recent: Vec<T>,
    pub previous: Vec<T>,
    pub anchor: DateTime<Utc>,
    pub window_days: u32,
}

impl<T: Timestamped + Clone> TrendWindows<T> {
    /// Split `records` around `anchor`. Records outside both windows are ignored.
    pub fn split(records: &[T], anchor: DateTime<Utc>, window_days: u32) -> Self {
        let window_days = window_days.clamp(1, MAX_TREND_WINDOW_DAYS);
        let window = Duration::days(i64::from(window_days));
        let recent_start = anchor - window;
        let previous_start = recent_start - window;

        let mut recent = Vec::new();
        let mut previous = Vec::new();
        for record in records {
            let ts = record.timestamp();
            if ts > recent_start && ts <= anchor {
                recent.push(record.clone());
            } else if ts > previous_start && ts <= recent_start {
                previous.push(record.clone());
            }
        }

        Self {
            recent,
            previous,
            anchor,
            window_days,
        }
    }

    /// Both windows hold at least one record.
    pub fn comparable(&self) -> bool {
        !self.recent.is_empty() && !self.previous.is_empty()
    }

    pub fn timeframe(&self) -> String {
        format!("{}d", self.window_days)
    }
}

/// Compares trend windows metric by metric.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendEngine;

impl TrendEngine {
    pub fn new() -> Self {
        Self
    }

    /// Interaction metrics: totals, daily average, active days, then every
    /// category and platform bucket.
    pub fn compare(&self, windows: &TrendWindows<InteractionRecord>) -> Vec<TrendComparison> {
        if !windows.comparable() {
            return Vec::new();
        }

        let window = Duration::days(i64::from(windows.window_days));
        let recent = MetricsAggregator::new(windows.anchor).aggregate(&windows.recent);
        let previous = MetricsAggregator::new(windows.anchor - window).aggregate(&windows.previous);
        let timeframe = windows.timeframe();

        interaction_metrics(&recent)
            .into_iter()
            .zip(interaction_metrics(&previous))
            .filter_map(|((metric, r), (_, p))| compare_values(&metric, r, p, &timeframe))
            .collect()
    }

    /// Content metrics: item count, views, engagement.
    pub fn compare_content(&self, windows: &TrendWindows<ContentRecord>) -> Vec<TrendComparison> {
        if !windows.comparable() {
            return Vec::new();
        }

        let timeframe = windows.timeframe();
        content_metrics(&windows.recent)
            .into_iter()
            .zip(content_metrics(&windows.previous))
            .filter_map(|((metric, r), (_, p))| compare_values(metric, r, p, &timeframe))
            .collect()
    }
}

fn interaction_metrics(snapshot: &MetricsSnapshot) -> Vec<(String, f64)> {
    let mut metrics = vec![
        ("totalInteractions".to_string(), snapshot.total_count as f64),
        ("dailyAverage".to_string(), snapshot.daily_average as f64),
        ("activeDays".to_string(), snapshot.unique_date_count as f64),
    ];
    for category in Category::ALL {
        metrics.push((
            format!("category.{}", category.as_str()),
            snapshot.category_distribution.count(category) as f64,
        ));
    }
    for bucket in PlatformBucket::ALL {
        metrics.push((
            format!("platform.{}", bucket.as_str()),
            snapshot.platform_distribution.get(bucket) as f64,
        ));
    }
    metrics
}

fn content_metrics(records: &[ContentRecord]) -> [(&'static str, f64); 3] {
    [
        ("totalContent", records.len() as f64),
        ("totalViews", records.iter().map(|r| r.views as f64).sum()),
        (
            "totalEngagement",
            records.iter().map(|r| r.engagement() as f64).sum(),
        ),
    ]
}
