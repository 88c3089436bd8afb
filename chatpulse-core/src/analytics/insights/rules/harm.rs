//! Harm alert: a content channel averages above the harm threshold.

use crate::analytics::insights::{Insight, InsightInputs, InsightPriority, InsightRule, InsightType};
use crate::analytics::round1;
use crate::Result;

/// Average harm score (0..1) a channel must exceed.
pub const HARM_THRESHOLD: f64 = 0.05;
const CONFIDENCE: u8 = 82;

pub struct HarmRule {
    threshold: f64,
}

impl HarmRule {
    pub fn new() -> Self {
        Self {
            threshold: HARM_THRESHOLD,
        }
    }
}

impl Default for HarmRule {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightRule for HarmRule {
    fn name(&self) -> &str {
        "core.harm"
    }

    fn evaluate(&self, inputs: &InsightInputs<'_>) -> Result<Option<Insight>> {
        let Some(content) = inputs.content else {
            return Ok(None);
        };

        // Channels are already in descending-volume order
        let Some(channel) = content
            .channels
            .iter()
            .find(|c| c.average_harm > self.threshold)
        else {
            return Ok(None);
        };

        let harm_pct = round1(channel.average_harm * 100.0);
        Ok(Some(
            Insight::new(
                self.short_name(),
                InsightType::Alert,
                InsightPriority::Medium,
                CONFIDENCE,
                format!("Elevated harm score on {}", channel.channel),
                format!(
                    "Content from {} averages a {}% harm score across {} items, above the {}% threshold.",
                    channel.channel,
                    harm_pct,
                    channel.count,
                    round1(self.threshold * 100.0)
                ),
                inputs.now,
            )
            .with_data("channel", channel.channel.as_str())
            .with_data("averageHarm", channel.average_harm)
            .with_data("count", channel.count),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::content::ContentSummary;
    use crate::analytics::insights::rules::fixtures::{content, now};

    fn evaluate(groups: &[(&str, usize, f64, f64)]) -> Option<Insight> {
        let summary = ContentSummary::build(&content(groups), 5);
        HarmRule::new()
            .evaluate(&InsightInputs {
                metrics: None,
                content: Some(&summary),
                trends: &[],
                now: now(),
            })
            .unwrap()
    }

    #[test]
    fn test_first_channel_by_volume_wins() {
        let insight = evaluate(&[
            ("small-bad", 2, 0.5, 0.5),
            ("big-bad", 10, 0.06, 0.5),
            ("clean", 20, 0.0, 0.5),
        ])
        .unwrap();

        assert_eq!(insight.insight_type, InsightType::Alert);
        assert_eq!(insight.priority, InsightPriority::Medium);
        assert_eq!(insight.confidence, 82);
        assert_eq!(insight.data("channel"), Some(&serde_json::json!("big-bad")));
        assert!(insight.id.starts_with("harm-"));
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(evaluate(&[("edge", 1, 0.05, 0.5)]).is_none());
        assert!(evaluate(&[("over", 1, 0.051, 0.5)]).is_some());
    }

    #[test]
    fn test_threshold_holds_across_many_items() {
        // 0.05 summed three times is slightly above 0.15 in binary floating point
        assert!(evaluate(&[("edge", 3, 0.05, 0.5)]).is_none());
        assert!(evaluate(&[("edge", 7, 0.05, 0.5)]).is_none());
        assert!(evaluate(&[("over", 3, 0.0501, 0.5)]).is_some());
    }

    #[test]
    fn test_no_content() {
        assert!(evaluate(&[]).is_none());
    }
}
