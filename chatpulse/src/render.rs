//! Markdown and plain-text rendering of report outcomes.

use chatpulse_core::analytics::activity::{day_name, hour_label};
use chatpulse_core::analytics::{
    ActivityHeatmap, CategoryBreakdown, ContentSummary, ConversationPage, Insight, InsightType,
    MetricsSnapshot, OverallSentiment, PlatformBreakdown, QuestionDigest, TrendComparison,
};
use chatpulse_core::format::{format_count, format_relative_time, truncate};
use chatpulse_core::{ReportOutcome, ReportPayload};
use chrono::{DateTime, Utc};
use std::fmt::{self, Write};

const QUESTION_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Markdown,
    Text,
}

/// Render an outcome for a terminal or a Markdown document.
pub fn render(outcome: &ReportOutcome, style: Style) -> Result<String, fmt::Error> {
    let mut r = Renderer {
        style,
        out: String::new(),
        now: outcome.generated_at,
    };
    r.header(outcome)?;

    match &outcome.payload {
        ReportPayload::Metrics(report) => {
            r.metrics(&report.metrics)?;
            r.trends("Trends", &report.trends)?;
        }
        ReportPayload::Activity(heatmap) => r.activity(heatmap)?,
        ReportPayload::Topics(topics) => r.topics(topics)?,
        ReportPayload::Platforms(platforms) => r.platforms(platforms)?,
        ReportPayload::Questions(digest) => r.questions(digest)?,
        ReportPayload::Conversations(page) => r.conversations(page)?,
        ReportPayload::Overview(overview) => {
            r.metrics(&overview.metrics)?;
            r.activity(&overview.activity)?;
            r.topics(&overview.topics)?;
            r.platforms(&overview.platforms)?;
            r.trends("Trends", &overview.trends)?;
            r.trends("Content trends", &overview.content_trends)?;
            r.content(&overview.content)?;
        }
    }

    r.insights(&outcome.insights)?;
    Ok(r.out)
}

/// Average sentiment carried by the summary insight, if any.
fn summary_sentiment(insights: &[Insight]) -> Option<f64> {
    insights
        .iter()
        .find(|i| i.insight_type == InsightType::Summary)
        .and_then(|i| i.data("averageSentiment"))
        .and_then(|v| v.as_f64())
}

struct Renderer {
    style: Style,
    out: String,
    now: DateTime<Utc>,
}

impl Renderer {
    fn heading(&mut self, level: usize, title: &str) -> fmt::Result {
        match self.style {
            Style::Markdown => writeln!(self.out, "\n{} {}\n", "#".repeat(level), title),
            Style::Text => {
                let rule = if level == 1 { '=' } else { '-' };
                writeln!(self.out, "\n{}", title)?;
                writeln!(self.out, "{}", rule.to_string().repeat(title.chars().count()))
            }
        }
    }

    fn field(&mut self, label: &str, value: impl fmt::Display) -> fmt::Result {
        match self.style {
            Style::Markdown => writeln!(self.out, "- **{}:** {}", label, value),
            Style::Text => writeln!(self.out, "  {:<18} {}", format!("{}:", label), value),
        }
    }

    fn table(&mut self, headers: &[&str], rows: &[Vec<String>]) -> fmt::Result {
        if rows.is_empty() {
            return writeln!(self.out, "(none)");
        }
        match self.style {
            Style::Markdown => {
                writeln!(self.out, "| {} |", headers.join(" | "))?;
                writeln!(self.out, "|{}", "---|".repeat(headers.len()))?;
                for row in rows {
                    writeln!(self.out, "| {} |", row.join(" | "))?;
                }
            }
            Style::Text => {
                let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
                for row in rows {
                    for (width, cell) in widths.iter_mut().zip(row) {
                        *width = (*width).max(cell.chars().count());
                    }
                }
                let line = |cells: Vec<&str>| {
                    cells
                        .iter()
                        .zip(&widths)
                        .map(|(cell, width)| {
                            let pad = width.saturating_sub(cell.chars().count());
                            format!("{}{}", cell, " ".repeat(pad))
                        })
                        .collect::<Vec<_>>()
                        .join("  ")
                        .trim_end()
                        .to_string()
                };
                writeln!(self.out, "  {}", line(headers.to_vec()))?;
                for row in rows {
                    writeln!(self.out, "  {}", line(row.iter().map(String::as_str).collect()))?;
                }
            }
        }
        Ok(())
    }

    fn header(&mut self, outcome: &ReportOutcome) -> fmt::Result {
        let title = format!("chatpulse {} report", outcome.mode);
        match self.style {
            Style::Markdown => writeln!(self.out, "# {}\n", title)?,
            Style::Text => {
                writeln!(self.out, "{}", title)?;
                writeln!(self.out, "{}", "=".repeat(title.chars().count()))?;
            }
        }
        self.field("Range", outcome.date_range)?;
        self.field(
            "Generated",
            outcome.generated_at.format("%Y-%m-%d %H:%M UTC"),
        )?;
        if let Some(avg) = summary_sentiment(&outcome.insights) {
            self.field(
                "Sentiment",
                format!("{} ({:.2})", OverallSentiment::from_average(avg), avg),
            )?;
        }
        if outcome.dropped_records > 0 {
            self.field("Dropped records", outcome.dropped_records)?;
        }
        if let Some(error) = &outcome.error {
            self.field("Warning", error)?;
        }
        Ok(())
    }

    fn metrics(&mut self, m: &MetricsSnapshot) -> fmt::Result {
        self.heading(2, "Metrics")?;
        self.field("Questions", format_count(m.total_count))?;
        self.field("Active days", m.unique_date_count)?;
        self.field("Daily average", format_count(m.daily_average))?;
        self.field("Last 7 days", format_count(m.recent_activity.last_7_days))?;
        self.field("Last 30 days", format_count(m.recent_activity.last_30_days))?;

        let rows: Vec<Vec<String>> = m
            .language_distribution
            .entries()
            .iter()
            .map(|e| {
                vec![
                    e.key.display_name().to_string(),
                    format_count(e.count),
                    format!("{:.1}%", e.percentage),
                ]
            })
            .collect();
        self.heading(3, "Languages")?;
        self.table(&["Language", "Count", "Share"], &rows)
    }

    fn activity(&mut self, heatmap: &ActivityHeatmap) -> fmt::Result {
        let s = &heatmap.summary;
        self.heading(2, "Activity")?;
        self.field("Peak day", &s.peak_day_name)?;
        self.field("Peak hour", hour_label(s.peak_hour))?;
        self.field("Average per day", s.average_daily)?;
        self.field("Weekend ratio", format!("{:.2}", s.weekend_ratio))?;

        let rows: Vec<Vec<String>> = heatmap
            .weekly_pattern
            .iter()
            .map(|d| {
                vec![
                    day_name(d.day).to_string(),
                    format_count(d.total_activity),
                    hour_label(d.peak_hour),
                ]
            })
            .collect();
        self.heading(3, "By day")?;
        self.table(&["Day", "Questions", "Peak hour"], &rows)
    }

    fn topics(&mut self, topics: &CategoryBreakdown) -> fmt::Result {
        self.heading(2, "Topics")?;
        let rows: Vec<Vec<String>> = topics
            .categories
            .iter()
            .map(|c| {
                vec![
                    c.display_name.clone(),
                    format_count(c.count),
                    format!("{:.1}%", c.percentage),
                    c.samples
                        .first()
                        .map(|s| truncate(s, QUESTION_WIDTH))
                        .unwrap_or_default(),
                ]
            })
            .collect();
        self.table(&["Category", "Count", "Share", "Top question"], &rows)
    }

    fn platforms(&mut self, platforms: &PlatformBreakdown) -> fmt::Result {
        self.heading(2, "Platforms")?;
        let d = &platforms.distribution;
        self.field(
            "Buckets",
            format!(
                "web {} / mobile {} / api {}",
                format_count(d.web),
                format_count(d.mobile),
                format_count(d.api)
            ),
        )?;
        let rows: Vec<Vec<String>> = platforms
            .platforms
            .iter()
            .map(|p| {
                vec![
                    p.platform.to_string(),
                    p.bucket.to_string(),
                    format_count(p.count),
                    format!("{:.1}%", p.percentage),
                ]
            })
            .collect();
        self.table(&["Platform", "Bucket", "Count", "Share"], &rows)
    }

    fn questions(&mut self, digest: &QuestionDigest) -> fmt::Result {
        self.heading(2, "Top questions")?;
        self.field(
            "Unique",
            format!(
                "{} of {}",
                format_count(digest.unique_questions),
                format_count(digest.total_questions)
            ),
        )?;
        let rows: Vec<Vec<String>> = digest
            .top
            .iter()
            .map(|q| {
                vec![
                    truncate(&q.question, QUESTION_WIDTH),
                    format_count(q.count),
                    q.category.to_string(),
                    q.language.to_string(),
                ]
            })
            .collect();
        self.table(&["Question", "Count", "Category", "Language"], &rows)
    }

    fn conversations(&mut self, page: &ConversationPage) -> fmt::Result {
        self.heading(2, "Recent conversations")?;
        self.field(
            "Showing",
            format!("{} of {}", page.conversations.len(), format_count(page.total)),
        )?;
        let rows: Vec<Vec<String>> = page
            .conversations
            .iter()
            .map(|c| {
                vec![
                    format_relative_time(c.timestamp, self.now),
                    truncate(&c.input, QUESTION_WIDTH),
                    c.category.to_string(),
                    c.platform.to_string(),
                ]
            })
            .collect();
        self.table(&["When", "Question", "Category", "Platform"], &rows)
    }

    fn trends(&mut self, title: &str, trends: &[TrendComparison]) -> fmt::Result {
        self.heading(2, title)?;
        let rows: Vec<Vec<String>> = trends
            .iter()
            .map(|t| {
                vec![
                    t.metric.clone(),
                    t.format_delta(),
                    format!("{} → {}", t.previous, t.recent),
                    t.timeframe.clone(),
                ]
            })
            .collect();
        self.table(&["Metric", "Change", "Previous → recent", "Window"], &rows)
    }

    fn content(&mut self, content: &ContentSummary) -> fmt::Result {
        self.heading(2, "Content")?;
        self.field("Items", format_count(content.total_content))?;
        self.field("Views", format_count(content.total_views))?;
        self.field("Engagement", format_count(content.total_engagement()))?;
        let rows: Vec<Vec<String>> = content
            .channels
            .iter()
            .map(|c| {
                vec![
                    c.channel.clone(),
                    format_count(c.count),
                    format_count(c.views),
                    format!("{:.2}", c.average_sentiment),
                    format!("{:.2}", c.average_harm),
                ]
            })
            .collect();
        self.table(&["Channel", "Items", "Views", "Sentiment", "Harm"], &rows)
    }

    fn insights(&mut self, insights: &[Insight]) -> fmt::Result {
        self.heading(2, "Insights")?;
        for insight in insights {
            let tag = insight.priority.as_str().to_uppercase();
            match self.style {
                Style::Markdown => writeln!(
                    self.out,
                    "- **[{}] {}** ({}, {}% confidence)\n  {}",
                    tag, insight.title, insight.insight_type, insight.confidence, insight.description
                )?,
                Style::Text => writeln!(
                    self.out,
                    "  [{}] {} ({}, {}%)\n      {}",
                    tag, insight.title, insight.insight_type, insight.confidence, insight.description
                )?,
            }
        }
        Ok(())
    }
}
