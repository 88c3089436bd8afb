//! Built-in insight rules
//!
//! Evaluated in this order (which is also the tie-break order within a
//! priority):
//!
//! - [`dominance`]: one language or category holds more than 70% of questions
//! - [`harm`]: a content channel's average harm score exceeds 5%
//! - [`concentration`]: the top three channels hold more than 40% of content
//! - [`growth`]: window-over-window volume moved by more than 10%
//! - [`summary`]: overall sentiment, always emitted
//!
//! ## Adding a rule
//!
//! 1. Create a module implementing [`InsightRule`](super::InsightRule)
//! 2. Register it in [`create_default_generator`]

pub mod concentration;
pub mod dominance;
pub mod growth;
pub mod harm;
pub mod summary;

use super::InsightGenerator;

/// Create a generator with all built-in rules registered.
pub fn create_default_generator() -> InsightGenerator {
    let mut generator = InsightGenerator::new();
    generator.register(Box::new(dominance::DominanceRule::new()));
    generator.register(Box::new(harm::HarmRule::new()));
    generator.register(Box::new(concentration::ConcentrationRule::new()));
    generator.register(Box::new(growth::GrowthRule::new()));
    generator.register(Box::new(summary::SummaryRule::new()));
    generator
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generator_rule_order() {
        let generator = create_default_generator();
        assert_eq!(
            generator.rule_names(),
            vec![
                "core.dominance",
                "core.harm",
                "core.concentration",
                "core.growth",
                "core.summary",
            ]
        );
        assert!(generator.has_rule("core.summary"));
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Record builders shared by the rule tests.

    use crate::types::{Category, ContentRecord, InteractionRecord, Language, Platform};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    /// `count` interactions per `(language, category, count)` group.
    pub fn interactions(groups: &[(Language, Category, usize)]) -> Vec<InteractionRecord> {
        let mut records = Vec::new();
        for (language, category, count) in groups {
            for _ in 0..*count {
                let i = records.len() as i64;
                records.push(InteractionRecord {
                    id: format!("q{i}"),
                    timestamp: now() - Duration::minutes(i + 1),
                    input: format!("question {i}"),
                    output: String::new(),
                    platform: Platform::Web,
                    language: *language,
                    category: *category,
                });
            }
        }
        records
    }

    /// `count` items per `(channel, count, harm, sentiment)` group.
    pub fn content(groups: &[(&str, usize, f64, f64)]) -> Vec<ContentRecord> {
        let mut records = Vec::new();
        for (channel, count, harm, sentiment) in groups {
            for _ in 0..*count {
                let i = records.len() as i64;
                records.push(ContentRecord {
                    id: format!("c{i}"),
                    timestamp: now() - Duration::minutes(i + 1),
                    channel: channel.to_string(),
                    creator: channel.to_string(),
                    language: "en".to_string(),
                    sentiment: *sentiment,
                    harm: *harm,
                    views: 100,
                    likes: 1,
                    comments: 0,
                });
            }
        }
        records
    }
}
