//! Summary rule: overall sentiment of the window. Always fires.

use crate::analytics::insights::{Insight, InsightInputs, InsightPriority, InsightRule, InsightType};
use crate::analytics::report::OverallSentiment;
use crate::Result;

const CONFIDENCE: u8 = 92;

#[derive(Default)]
pub struct SummaryRule;

impl SummaryRule {
    pub fn new() -> Self {
        Self
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

impl InsightRule for SummaryRule {
    fn name(&self) -> &str {
        "core.summary"
    }

    fn evaluate(&self, inputs: &InsightInputs<'_>) -> Result<Option<Insight>> {
        let total_interactions = inputs.metrics.map_or(0, |m| m.total_count);
        let total_content = inputs.content.map_or(0, |c| c.total_content);
        let average = inputs.content.and_then(|c| c.average_sentiment);

        let (title, description, value) = match average {
            Some(avg) => {
                let label = OverallSentiment::from_average(avg);
                (
                    format!("Overall sentiment is {}", label),
                    format!(
                        "Average sentiment across {} content items is {:.2} ({}). {} questions were asked in this window.",
                        total_content, avg, label, total_interactions
                    ),
                    serde_json::Value::from(round3(avg)),
                )
            }
            None => (
                "Overall sentiment unavailable".to_string(),
                format!(
                    "No sentiment source in this window. {} questions were asked.",
                    total_interactions
                ),
                serde_json::Value::Null,
            ),
        };

        Ok(Some(
            Insight::new(
                self.short_name(),
                InsightType::Summary,
                InsightPriority::Low,
                CONFIDENCE,
                title,
                description,
                inputs.now,
            )
            .with_data("averageSentiment", value)
            .with_data("totalInteractions", total_interactions)
            .with_data("totalContent", total_content),
        ))
    }
}
