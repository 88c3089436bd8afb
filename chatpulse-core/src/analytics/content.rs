//! Content (video/post) statistics grouped by channel and creator.

use super::{mean, percentage, round_score};
use crate::types::ContentRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregates for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGroup {
    pub channel: String,
    pub count: u64,
    /// Share of all content items, one decimal
    pub share: f64,
    pub views: u64,
    pub engagement: u64,
    pub average_sentiment: f64,
    pub average_harm: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorStat {
    pub creator: String,
    pub count: u64,
    pub views: u64,
}

/// Content window summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub total_content: u64,
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    /// `None` when the window has no content
    pub average_sentiment: Option<f64>,
    pub average_harm: Option<f64>,
    /// Descending item count, ties by channel name
    pub channels: Vec<ChannelGroup>,
    pub top_creators: Vec<CreatorStat>,
}

#[derive(Default)]
struct ChannelAcc {
    count: u64,
    views: u64,
    engagement: u64,
    sentiment: f64,
    harm: f64,
}

impl ContentSummary {
    pub fn build(records: &[ContentRecord], top_creators: usize) -> Self {
        let mut channels: BTreeMap<&str, ChannelAcc> = BTreeMap::new();
        let mut creators: BTreeMap<&str, (u64, u64)> = BTreeMap::new();

        for record in records {
            let acc = channels.entry(record.channel.as_str()).or_default();
            acc.count += 1;
            acc.views = acc.views.saturating_add(record.views);
            acc.engagement = acc.engagement.saturating_add(record.engagement());
            acc.sentiment += record.sentiment;
            acc.harm += record.harm;

            let creator = creators.entry(record.creator.as_str()).or_default();
            creator.0 += 1;
            creator.1 = creator.1.saturating_add(record.views);
        }

        let total = records.len() as u64;
        let mut channels: Vec<ChannelGroup> = channels
            .into_iter()
            .map(|(channel, acc)| ChannelGroup {
                channel: channel.to_string(),
                count: acc.count,
                share: percentage(acc.count, total),
                views: acc.views,
                engagement: acc.engagement,
                average_sentiment: round_score(acc.sentiment / acc.count as f64),
                average_harm: round_score(acc.harm / acc.count as f64),
            })
            .collect();
        // BTreeMap order is by name already; stable sort keeps it for ties
        channels.sort_by(|a, b| b.count.cmp(&a.count));

        let mut top: Vec<CreatorStat> = creators
            .into_iter()
            .map(|(creator, (count, views))| CreatorStat {
                creator: creator.to_string(),
                count,
                views,
            })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then(b.views.cmp(&a.views)));
        top.truncate(top_creators);

        Self {
            total_content: total,
            total_views: saturating_total(records.iter().map(|r| r.views)),
            total_likes: saturating_total(records.iter().map(|r| r.likes)),
            total_comments: saturating_total(records.iter().map(|r| r.comments)),
            average_sentiment: mean(records.iter().map(|r| r.sentiment)).map(round_score),
            average_harm: mean(records.iter().map(|r| r.harm)).map(round_score),
            channels,
            top_creators: top,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_content == 0
    }

    pub fn total_engagement(&self) -> u64 {
        self.total_likes.saturating_add(self.total_comments)
    }

    /// Unrounded share (percent) of the `n` largest channels combined.
    pub fn top_channels_share(&self, n: usize) -> f64 {
        if self.total_content == 0 {
            return 0.0;
        }
        let top: u64 = self.channels.iter().take(n).map(|c| c.count).sum();
        top as f64 * 100.0 / self.total_content as f64
    }
}

fn saturating_total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(channel: &str, creator: &str, views: u64, sentiment: f64, harm: f64) -> ContentRecord {
        ContentRecord {
            id: format!("{channel}-{views}"),
            timestamp: Utc::now(),
            channel: channel.to_string(),
            creator: creator.to_string(),
            language: "en".to_string(),
            sentiment,
            harm,
            views,
            likes: 2,
            comments: 1,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = ContentSummary::build(&[], 5);
        assert!(summary.is_empty());
        assert_eq!(summary.average_sentiment, None);
        assert_eq!(summary.average_harm, None);
        assert!(summary.channels.is_empty());
        assert_eq!(summary.top_channels_share(3), 0.0);
    }

    #[test]
    fn test_channel_grouping_and_order() {
        let records = vec![
            item("beta", "b1", 10, 0.8, 0.0),
            item("alpha", "a1", 20, 0.6, 0.1),
            item("gamma", "g1", 30, 0.2, 0.0),
            item("gamma", "g2", 40, 0.4, 0.0),
        ];
        let summary = ContentSummary::build(&records, 2);

        let names: Vec<_> = summary.channels.iter().map(|c| c.channel.as_str()).collect();
        assert_eq!(names, vec!["gamma", "alpha", "beta"]);

        let gamma = &summary.channels[0];
        assert_eq!(gamma.count, 2);
        assert_eq!(gamma.views, 70);
        assert_eq!(gamma.engagement, 6);
        assert_eq!(gamma.share, 50.0);
        assert!((gamma.average_sentiment - 0.3).abs() < 1e-9);

        assert_eq!(summary.total_views, 100);
        assert_eq!(summary.total_engagement(), 12);
        assert!((summary.average_sentiment.unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(summary.top_creators.len(), 2);
        assert_eq!(summary.top_creators[0].creator, "g2");
        assert_eq!(summary.top_channels_share(2), 75.0);
    }

    #[test]
    fn test_harm_average_is_exact_at_threshold_values() {
        let records: Vec<_> = (0..3).map(|i| item("edge", "c", i, 0.5, 0.05)).collect();
        let summary = ContentSummary::build(&records, 5);
        assert_eq!(summary.channels[0].average_harm, 0.05);
        assert_eq!(summary.average_harm, Some(0.05));
    }

    #[test]
    fn test_huge_counters_saturate() {
        let mut records = vec![
            item("loud", "c", u64::MAX, 0.5, 0.0),
            item("loud", "c", u64::MAX, 0.5, 0.0),
        ];
        records[0].likes = u64::MAX;
        records[0].comments = u64::MAX;

        let summary = ContentSummary::build(&records, 5);
        assert_eq!(summary.total_views, u64::MAX);
        assert_eq!(summary.channels[0].views, u64::MAX);
        assert_eq!(summary.channels[0].engagement, u64::MAX);
        assert_eq!(summary.top_creators[0].views, u64::MAX);
        assert_eq!(summary.total_engagement(), u64::MAX);
        assert_eq!(records[0].engagement(), u64::MAX);
    }
}
