//! Concentration rule: a few channels carry most of the content volume.

use crate::analytics::insights::{Insight, InsightInputs, InsightPriority, InsightRule, InsightType};
use crate::analytics::round1;
use crate::Result;

/// Combined share (percent) the top channels must exceed.
pub const CONCENTRATION_THRESHOLD_PCT: f64 = 40.0;
/// Number of leading channels combined.
pub const TOP_CHANNELS: usize = 3;
const CONFIDENCE: u8 = 88;

pub struct ConcentrationRule {
    threshold_pct: f64,
    top_n: usize,
}

impl ConcentrationRule {
    pub fn new() -> Self {
        Self {
            threshold_pct: CONCENTRATION_THRESHOLD_PCT,
            top_n: TOP_CHANNELS,
        }
    }
}

impl Default for ConcentrationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightRule for ConcentrationRule {
    fn name(&self) -> &str {
        "core.concentration"
    }

    fn evaluate(&self, inputs: &InsightInputs<'_>) -> Result<Option<Insight>> {
        let Some(content) = inputs.content else {
            return Ok(None);
        };
        if content.is_empty() {
            return Ok(None);
        }

        let share = content.top_channels_share(self.top_n);
        if share <= self.threshold_pct {
            return Ok(None);
        }

        let top: Vec<&str> = content
            .channels
            .iter()
            .take(self.top_n)
            .map(|c| c.channel.as_str())
            .collect();
        let top_count: u64 = content.channels.iter().take(self.top_n).map(|c| c.count).sum();

        Ok(Some(
            Insight::new(
                self.short_name(),
                InsightType::Opportunity,
                InsightPriority::Medium,
                CONFIDENCE,
                format!("Top {} channels hold {}% of content", top.len(), share.round() as u64),
                format!(
                    "{} account for {} of {} items. Featuring more channels would broaden coverage.",
                    top.join(", "),
                    top_count,
                    content.total_content
                ),
                inputs.now,
            )
            .with_data("channels", top)
            .with_data("count", top_count)
            .with_data("share", round1(share)),
        ))
    }
}
