//! Scalar and distribution statistics over one record window.

use super::percentage;
use crate::types::{Category, InteractionRecord, Language, PlatformBucket};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One row of a fixed-order distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionEntry<K> {
    pub key: K,
    pub count: u64,
    /// `count / total * 100`, one decimal; 0 when total is 0
    pub percentage: f64,
}

/// Counts for every variant of `K`, always in the variant's declared order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution<K> {
    entries: Vec<DistributionEntry<K>>,
}

impl<K: Copy + PartialEq> Distribution<K> {
    /// Build from the full key list and a counting function.
    pub fn from_counts(keys: &[K], count: impl Fn(K) -> u64) -> Self {
        let counts: Vec<(K, u64)> = keys.iter().map(|k| (*k, count(*k))).collect();
        let total: u64 = counts.iter().map(|(_, c)| c).sum();
        Self {
            entries: counts
                .into_iter()
                .map(|(key, count)| DistributionEntry {
                    key,
                    count,
                    percentage: percentage(count, total),
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[DistributionEntry<K>] {
        &self.entries
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn count(&self, key: K) -> u64 {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map_or(0, |e| e.count)
    }

    /// Unrounded share of `key` in percent (0 when empty).
    pub fn share_pct(&self, key: K) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.count(key) as f64 * 100.0 / total as f64
    }

    /// Largest group; on ties the first in declared order. `None` when empty.
    pub fn top(&self) -> Option<&DistributionEntry<K>> {
        let mut best: Option<&DistributionEntry<K>> = None;
        for entry in &self.entries {
            if entry.count > best.map_or(0, |b| b.count) {
                best = Some(entry);
            }
        }
        best
    }
}

/// Interaction counts per platform bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDistribution {
    pub web: u64,
    pub mobile: u64,
    pub api: u64,
}

impl PlatformDistribution {
    pub fn get(&self, bucket: PlatformBucket) -> u64 {
        match bucket {
            PlatformBucket::Web => self.web,
            PlatformBucket::Mobile => self.mobile,
            PlatformBucket::Api => self.api,
        }
    }

    fn increment(&mut self, bucket: PlatformBucket) {
        match bucket {
            PlatformBucket::Web => self.web += 1,
            PlatformBucket::Mobile => self.mobile += 1,
            PlatformBucket::Api => self.api += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.web + self.mobile + self.api
    }
}

/// Records in the trailing 7 and 30 days before "now".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentActivity {
    #[serde(rename = "last7Days")]
    pub last_7_days: u64,
    #[serde(rename = "last30Days")]
    pub last_30_days: u64,
}

/// Aggregates over exactly one record window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub total_count: u64,
    pub unique_date_count: u64,
    /// `round(total / unique dates)`, 0 without dates
    pub daily_average: u64,
    pub platform_distribution: PlatformDistribution,
    pub language_distribution: Distribution<Language>,
    pub category_distribution: Distribution<Category>,
    pub recent_activity: RecentActivity,
}

impl MetricsSnapshot {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// Builds [`MetricsSnapshot`]s. No I/O; `now` is fixed at construction.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    now: DateTime<Utc>,
    known_dates: BTreeSet<NaiveDate>,
}

impl MetricsAggregator {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            known_dates: BTreeSet::new(),
        }
    }

    /// Dates already known to carry activity; unioned into the distinct-date count.
    pub fn with_known_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.known_dates.extend(dates);
        self
    }

    pub fn aggregate(&self, records: &[InteractionRecord]) -> MetricsSnapshot {
        let mut dates = self.known_dates.clone();
        let mut platforms = PlatformDistribution::default();
        let mut language_counts = [0u64; Language::ALL.len()];
        let mut category_counts = [0u64; Category::ALL.len()];
        let mut recent = RecentActivity::default();

        let week_ago = self.now - Duration::days(7);
        let month_ago = self.now - Duration::days(30);

        for record in records {
            dates.insert(record.timestamp.date_naive());
            platforms.increment(record.platform.bucket());
            language_counts[record.language as usize] += 1;
            category_counts[record.category as usize] += 1;

            if record.timestamp <= self.now {
                if record.timestamp >= week_ago {
                    recent.last_7_days += 1;
                }
                if record.timestamp >= month_ago {
                    recent.last_30_days += 1;
                }
            }
        }

        let total_count = records.len() as u64;
        let unique_date_count = dates.len() as u64;
        let daily_average = if unique_date_count == 0 {
            0
        } else {
            (total_count as f64 / unique_date_count as f64).round() as u64
        };

        MetricsSnapshot {
            total_count,
            unique_date_count,
            daily_average,
            platform_distribution: platforms,
            language_distribution: Distribution::from_counts(&Language::ALL, |l| {
                language_counts[l as usize]
            }),
            category_distribution: Distribution::from_counts(&Category::ALL, |c| {
                category_counts[c as usize]
            }),
            recent_activity: recent,
        }
    }
}
