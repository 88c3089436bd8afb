//! Day-of-week × hour-of-day activity heatmap.
//!
//! Rows are days with 0 = Sunday, columns are hours 0..23, both taken in a
//! fixed UTC offset chosen by configuration. Every record lands in exactly
//! one cell, so the cell sum always equals the record count.

use crate::types::InteractionRecord;
use chrono::{DateTime, Datelike, FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Weekend share reported when there is no weekday activity to compare with.
pub const WEEKEND_RATIO_FALLBACK: f64 = 0.3;

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Day name from index (0 = Sunday).
pub fn day_name(day: u8) -> &'static str {
    DAY_NAMES.get(day as usize).copied().unwrap_or("Unknown")
}

/// Hour range label, e.g. `10am-11am`.
pub fn hour_label(hour: u8) -> String {
    let twelve = |h: u8| {
        let h12 = h % 12;
        let h12 = if h12 == 0 { 12 } else { h12 };
        let period = if h % 24 < 12 { "am" } else { "pm" };
        format!("{}{}", h12, period)
    };
    format!("{}-{}", twelve(hour), twelve((hour + 1) % 24))
}

/// Activity on one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPattern {
    pub day: u8,
    pub day_name: String,
    pub total_activity: u64,
    /// Busiest hour; ties go to the earliest hour
    pub peak_hour: u8,
}

/// One [`DayPattern`] per day, Sunday first.
pub type WeeklyPattern = Vec<DayPattern>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    /// Day with the largest total; ties go to the smallest day index
    pub peak_day: u8,
    pub peak_day_name: String,
    /// Hour of the busiest single cell
    pub peak_hour: u8,
    /// `round(total / 7)`
    pub average_daily: u64,
    /// Saturday + Sunday share of all activity
    pub weekend_ratio: f64,
    pub total_activity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityHeatmap {
    /// `cells[day][hour]`
    pub cells: [[u64; 24]; 7],
    pub weekly_pattern: WeeklyPattern,
    pub summary: ActivitySummary,
}

impl ActivityHeatmap {
    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }
}

/// Builds [`ActivityHeatmap`]s in a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct ActivityEngine {
    offset: FixedOffset,
}

impl Default for ActivityEngine {
    fn default() -> Self {
        Self::utc()
    }
}

impl ActivityEngine {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn build(&self, records: &[InteractionRecord]) -> ActivityHeatmap {
        self.build_from(records.iter().map(|r| r.timestamp))
    }

    /// Heatmap over bare timestamps (e.g. content publication times).
    pub fn build_from(&self, timestamps: impl Iterator<Item = DateTime<Utc>>) -> ActivityHeatmap {
        let mut cells = [[0u64; 24]; 7];
        for ts in timestamps {
            let local = ts.with_timezone(&self.offset);
            let day = local.weekday().num_days_from_sunday() as usize;
            let hour = local.hour() as usize;
            cells[day][hour] += 1;
        }
        Self::summarize(cells)
    }

    fn summarize(cells: [[u64; 24]; 7]) -> ActivityHeatmap {
        let weekly_pattern: WeeklyPattern = cells
            .iter()
            .enumerate()
            .map(|(day, row)| DayPattern {
                day: day as u8,
                day_name: day_name(day as u8).to_string(),
                total_activity: row.iter().sum(),
                peak_hour: first_argmax(row.iter().copied()) as u8,
            })
            .collect();

        let day_totals = weekly_pattern.iter().map(|d| d.total_activity);
        let peak_day = first_argmax(day_totals) as u8;

        // Row-major scan, first maximum wins
        let peak_cell = first_argmax(cells.iter().flatten().copied());
        let peak_hour = (peak_cell % 24) as u8;

        let total: u64 = weekly_pattern.iter().map(|d| d.total_activity).sum();
        let weekend = weekly_pattern[0].total_activity + weekly_pattern[6].total_activity;
        let weekday = total - weekend;
        let weekend_ratio = if weekday > 0 {
            weekend as f64 / total as f64
        } else {
            WEEKEND_RATIO_FALLBACK
        };

        ActivityHeatmap {
            cells,
            summary: ActivitySummary {
                peak_day,
                peak_day_name: day_name(peak_day).to_string(),
                peak_hour,
                average_daily: (total as f64 / 7.0).round() as u64,
                weekend_ratio,
                total_activity: total,
            },
            weekly_pattern,
        }
    }
}

/// Index of the first maximum (0 for an empty or all-zero sequence).
fn first_argmax(values: impl Iterator<Item = u64>) -> usize {
    let mut best_index = 0;
    let mut best = None;
    for (index, value) in values.enumerate() {
        if best.map_or(true, |b| value > b) {
            best = Some(value);
            best_index = index;
        }
    }
    best_index
}
