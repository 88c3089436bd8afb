//! Dominance rule: one language or category holds most of the volume.
//!
//! The language distribution is checked first, then categories. The first
//! top group whose share is strictly above the threshold fires.

use crate::analytics::insights::{Insight, InsightInputs, InsightPriority, InsightRule, InsightType};
use crate::analytics::metrics::Distribution;
use crate::analytics::round1;
use crate::types::{Category, Language};
use crate::Result;

/// Share (percent) a single group must exceed.
pub const DOMINANCE_THRESHOLD_PCT: f64 = 70.0;
const CONFIDENCE: u8 = 95;

pub struct DominanceRule {
    threshold_pct: f64,
}

impl DominanceRule {
    pub fn new() -> Self {
        Self {
            threshold_pct: DOMINANCE_THRESHOLD_PCT,
        }
    }
}

impl Default for DominanceRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Top group of a distribution as `(key, display name, count, share)`.
fn top_group<K: Copy + PartialEq>(
    dist: &Distribution<K>,
    as_str: impl Fn(K) -> &'static str,
    display: impl Fn(K) -> &'static str,
) -> Option<(&'static str, &'static str, u64, f64)> {
    let top = dist.top()?;
    Some((as_str(top.key), display(top.key), top.count, dist.share_pct(top.key)))
}

impl InsightRule for DominanceRule {
    fn name(&self) -> &str {
        "core.dominance"
    }

    fn evaluate(&self, inputs: &InsightInputs<'_>) -> Result<Option<Insight>> {
        let Some(metrics) = inputs.metrics else {
            return Ok(None);
        };

        let language = top_group(
            &metrics.language_distribution,
            |l: Language| l.as_str(),
            |l: Language| l.display_name(),
        )
        .map(|group| ("language", group));
        let category = top_group(
            &metrics.category_distribution,
            |c: Category| c.as_str(),
            |c: Category| c.display_name(),
        )
        .map(|group| ("category", group));

        let dominant = [language, category]
            .into_iter()
            .flatten()
            .find(|(_, (_, _, _, share))| *share > self.threshold_pct);

        let Some((dimension, (key, display, count, share))) = dominant else {
            return Ok(None);
        };

        let title = format!(
            "{} questions make up {}% of volume",
            display,
            share.round() as u64
        );
        let description = format!(
            "{} of {} questions in this window fall under {} {}.",
            count, metrics.total_count, dimension, display
        );

        Ok(Some(
            Insight::new(
                self.short_name(),
                InsightType::Trend,
                InsightPriority::High,
                CONFIDENCE,
                title,
                description,
                inputs.now,
            )
            .with_data("dimension", dimension)
            .with_data("group", key)
            .with_data("count", count)
            .with_data("share", round1(share)),
        ))
    }
}
