//! Growth rule: window-over-window volume moved sharply.

use crate::analytics::insights::{Insight, InsightInputs, InsightPriority, InsightRule, InsightType};
use crate::analytics::trends::TrendComparison;
use crate::Result;

/// Absolute change (percent) that must be exceeded.
pub const GROWTH_THRESHOLD_PCT: f64 = 10.0;
const CONFIDENCE: u8 = 90;

/// Volume metrics checked in order; the first present one is used.
const VOLUME_METRICS: [(&str, &str); 2] = [
    ("totalInteractions", "Question volume"),
    ("totalContent", "Content volume"),
];

pub struct GrowthRule {
    threshold_pct: f64,
}

impl GrowthRule {
    pub fn new() -> Self {
        Self {
            threshold_pct: GROWTH_THRESHOLD_PCT,
        }
    }
}

impl Default for GrowthRule {
    fn default() -> Self {
        Self::new()
    }
}

fn find<'a>(trends: &'a [TrendComparison], metric: &str) -> Option<&'a TrendComparison> {
    trends.iter().find(|t| t.metric == metric)
}

impl InsightRule for GrowthRule {
    fn name(&self) -> &str {
        "core.growth"
    }

    fn evaluate(&self, inputs: &InsightInputs<'_>) -> Result<Option<Insight>> {
        let Some((trend, label)) = VOLUME_METRICS
            .iter()
            .find_map(|(metric, label)| find(inputs.trends, metric).map(|t| (t, *label)))
        else {
            return Ok(None);
        };

        if trend.change_pct.abs() <= self.threshold_pct {
            return Ok(None);
        }

        let rising = trend.change_pct > 0.0;
        let priority = if rising {
            InsightPriority::High
        } else {
            InsightPriority::Medium
        };
        let direction = if rising { "up" } else { "down" };

        Ok(Some(
            Insight::new(
                self.short_name(),
                InsightType::Trend,
                priority,
                CONFIDENCE,
                format!(
                    "{} {} {:.1}% over the last {}",
                    label,
                    direction,
                    trend.change_pct.abs(),
                    trend.timeframe
                ),
                format!(
                    "{} went from {} to {} ({}) compared with the previous {} window.",
                    label, trend.previous, trend.recent, trend.format_delta(), trend.timeframe
                ),
                inputs.now,
            )
            .with_data("metric", trend.metric.as_str())
            .with_data("changePct", trend.change_pct)
            .with_data("recent", trend.recent)
            .with_data("previous", trend.previous)
            .with_data("timeframe", trend.timeframe.as_str()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::insights::rules::fixtures::now;
    use crate::analytics::trends::compare_values;

    fn evaluate(trends: &[TrendComparison]) -> Option<Insight> {
        GrowthRule::new()
            .evaluate(&InsightInputs {
                metrics: None,
                content: None,
                trends,
                now: now(),
            })
            .unwrap()
    }

    fn trend(metric: &str, recent: f64, previous: f64) -> TrendComparison {
        compare_values(metric, recent, previous, "7d").unwrap()
    }

    #[test]
    fn test_growth_is_high_priority() {
        let insight = evaluate(&[trend("totalInteractions", 120.0, 100.0)]).unwrap();
        assert_eq!(insight.insight_type, InsightType::Trend);
        assert_eq!(insight.priority, InsightPriority::High);
        assert_eq!(insight.confidence, 90);
        assert_eq!(insight.data("changePct"), Some(&serde_json::json!(20.0)));
        assert_eq!(insight.title, "Question volume up 20.0% over the last 7d");
    }

    #[test]
    fn test_decline_is_medium_priority() {
        let insight = evaluate(&[trend("totalInteractions", 85.0, 100.0)]).unwrap();
        assert_eq!(insight.priority, InsightPriority::Medium);
        assert_eq!(insight.data("changePct"), Some(&serde_json::json!(-15.0)));
        assert!(insight.title.contains("down 15.0%"));
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(evaluate(&[trend("totalInteractions", 110.0, 100.0)]).is_none());
        assert!(evaluate(&[trend("totalInteractions", 90.0, 100.0)]).is_none());
    }

    #[test]
    fn test_falls_back_to_content_volume() {
        let insight = evaluate(&[
            trend("category.price", 300.0, 100.0),
            trend("totalContent", 50.0, 40.0),
        ])
        .unwrap();
        assert_eq!(insight.data("metric"), Some(&serde_json::json!("totalContent")));
        assert!(insight.title.starts_with("Content volume up 25.0%"));
    }

    #[test]
    fn test_interactions_take_precedence() {
        // Interaction volume is flat, content growth is ignored
        let trends = [
            trend("totalContent", 200.0, 100.0),
            trend("totalInteractions", 105.0, 100.0),
        ];
        assert!(evaluate(&trends).is_none());
    }

    #[test]
    fn test_no_trends() {
        assert!(evaluate(&[]).is_none());
    }
}
