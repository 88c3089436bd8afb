//! Report pipeline
//!
//! One request runs as:
//!
//! ```text
//! RecordSource ──fetch (timeout)──► normalize ──► RecordWindow
//!                                                     │
//!              ┌──────────┬──────────┬────────────────┼───────────┐
//!              ▼          ▼          ▼                ▼           ▼
//!           metrics   activity    trends     content trends   content     (spawn_blocking)
//!              └──────────┴──────────┴───────┬────────┴───────────┘
//!                                            ▼ join
//!                                    InsightGenerator ──► ReportPayload
//! ```
//!
//! "Now" is captured once at the start of the request and handed to every
//! stage. A failed or timed-out fetch still yields a payload: it is built
//! over an empty window, so it carries the fallback insight, and the error
//! is reported in [`ReportOutcome::error`].

use crate::analytics::{
    AnalysisParts, Insight, ReportAssembler, ReportMode, ReportPayload, RecordWindow,
};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::ingest::{normalize_content, normalize_interactions, RecordSource};
use crate::types::{DateRange, RawRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// What a caller asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    pub mode: ReportMode,
    pub range: DateRange,
    /// Fixed clock for reproducible output; `None` uses the current time
    pub now: Option<DateTime<Utc>>,
}

/// Result of one report request. Always carries a payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    pub mode: ReportMode,
    pub date_range: DateRange,
    pub generated_at: DateTime<Utc>,
    pub payload: ReportPayload,
    pub insights: Vec<Insight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raw records rejected by the normalizer
    pub dropped_records: usize,
}

impl ReportOutcome {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs report requests against an injected [`RecordSource`].
pub struct ReportService {
    source: Arc<dyn RecordSource>,
    assembler: Arc<ReportAssembler>,
    fetch_timeout: Duration,
}

impl ReportService {
    pub fn new(source: Arc<dyn RecordSource>, config: &Config) -> Self {
        Self {
            source,
            assembler: Arc::new(ReportAssembler::new(config.analytics.clone())),
            fetch_timeout: config.source.fetch_timeout(),
        }
    }

    pub fn assembler(&self) -> &ReportAssembler {
        &self.assembler
    }

    pub async fn generate(&self, request: ReportRequest) -> ReportOutcome {
        let now = request.now.unwrap_or_else(Utc::now);
        let window_days = self.assembler.config().trend_window_days;
        let fetch_range = request.range.with_trend_lookback(window_days, now);

        tracing::info!(
            mode = %request.mode,
            range = %request.range,
            source = self.source.name(),
            "Generating report"
        );

        let (interactions, content) = match self.fetch(fetch_range).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, source = self.source.name(), "Record fetch failed");
                return self.degraded(request, now, e);
            }
        };

        let interactions = normalize_interactions(&interactions);
        let content = normalize_content(&content);
        let dropped = interactions.dropped.total() + content.dropped.total();
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped malformed records");
        }

        let window = Arc::new(RecordWindow::partition(
            interactions.records,
            content.records,
            request.range,
            window_days,
            now,
        ));

        let parts = match self.analyze(&window, now).await {
            Ok(parts) => parts,
            Err(e) => {
                tracing::error!(error = %e, "Aggregation failed");
                return self.degraded(request, now, e);
            }
        };

        let insights = self.assembler.insights(&parts, now);
        tracing::info!(
            interactions = window.interactions.len(),
            content = window.content.len(),
            insights = insights.len(),
            "Report ready"
        );

        ReportOutcome {
            mode: request.mode,
            date_range: request.range,
            generated_at: now,
            payload: self
                .assembler
                .build(request.mode, &window, parts, insights.clone(), now),
            insights,
            error: None,
            dropped_records: dropped,
        }
    }

    /// Fetch both record kinds concurrently, bounded by the fetch timeout.
    async fn fetch(&self, range: DateRange) -> Result<(Vec<RawRecord>, Vec<RawRecord>)> {
        let fetch = async {
            tokio::try_join!(
                self.source.fetch_interactions(range),
                self.source.fetch_content(range)
            )
        };
        match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                timeout_ms: self.fetch_timeout.as_millis() as u64,
            }),
        }
    }

    /// Compute the independent aggregates on the blocking pool.
    async fn analyze(&self, window: &Arc<RecordWindow>, now: DateTime<Utc>) -> Result<AnalysisParts> {
        let (metrics, activity, trends, content_trends, content) = tokio::join!(
            spawn(&self.assembler, window, move |a, w| a.metrics(w, now)),
            spawn(&self.assembler, window, |a, w| a.activity(w)),
            spawn(&self.assembler, window, |a, w| a.trends(w)),
            spawn(&self.assembler, window, |a, w| a.content_trends(w)),
            spawn(&self.assembler, window, |a, w| a.content(w)),
        );

        let join = |e: tokio::task::JoinError| Error::Analysis(e.to_string());
        Ok(AnalysisParts {
            metrics: metrics.map_err(join)?,
            activity: activity.map_err(join)?,
            trends: trends.map_err(join)?,
            content_trends: content_trends.map_err(join)?,
            content: content.map_err(join)?,
        })
    }

    /// Outcome over an empty window with `error` set.
    fn degraded(&self, request: ReportRequest, now: DateTime<Utc>, error: Error) -> ReportOutcome {
        let window = RecordWindow::partition(
            Vec::new(),
            Vec::new(),
            request.range,
            self.assembler.config().trend_window_days,
            now,
        );
        let parts = self.assembler.analyze(&window, now);
        let insights = self.assembler.insights(&parts, now);

        ReportOutcome {
            mode: request.mode,
            date_range: request.range,
            generated_at: now,
            payload: self
                .assembler
                .build(request.mode, &window, parts, insights.clone(), now),
            insights,
            error: Some(error.to_string()),
            dropped_records: 0,
        }
    }
}

fn spawn<T, F>(assembler: &Arc<ReportAssembler>, window: &Arc<RecordWindow>, f: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: FnOnce(&ReportAssembler, &RecordWindow) -> T + Send + 'static,
{
    let assembler = Arc::clone(assembler);
    let window = Arc::clone(window);
    tokio::task::spawn_blocking(move || f(&assembler, &window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::InsightType;
    use crate::ingest::InMemorySource;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
    }

    fn request(mode: ReportMode) -> ReportRequest {
        ReportRequest {
            mode,
            range: DateRange::new(
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            )
            .unwrap(),
            now: Some(now()),
        }
    }

    fn service(source: impl RecordSource + 'static, timeout_ms: u64) -> ReportService {
        let mut config = Config::default();
        config.source.fetch_timeout_ms = timeout_ms;
        ReportService::new(Arc::new(source), &config)
    }

    struct SlowSource;

    #[async_trait]
    impl RecordSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch_interactions(&self, _range: DateRange) -> Result<Vec<RawRecord>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }

        async fn fetch_content(&self, _range: DateRange) -> Result<Vec<RawRecord>> {
            Ok(Vec::new())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl RecordSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        async fn fetch_interactions(&self, _range: DateRange) -> Result<Vec<RawRecord>> {
            Ok(Vec::new())
        }

        async fn fetch_content(&self, _range: DateRange) -> Result<Vec<RawRecord>> {
            Err(Error::Fetch("content store unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_generate_counts_and_drops() {
        let source = InMemorySource::from_values(
            vec![
                json!({"id": "1", "timestamp": "2024-03-10T09:00:00Z", "question": "이더리움 가격?"}),
                json!({"id": "2", "timestamp": "2024-03-11T09:00:00Z", "question": "how to swap"}),
                json!({"id": "3", "timestamp": "not a date", "question": "dropped"}),
                json!({"id": "4", "timestamp": "2024-03-12T09:00:00Z", "question": "   "}),
            ],
            vec![json!({"id": "c1", "timestamp": "2024-03-10T00:00:00Z", "channel": "news", "sentiment": 0.9})],
        );
        let outcome = service(source, 5_000).generate(request(ReportMode::Metrics)).await;

        assert!(!outcome.is_degraded());
        assert_eq!(outcome.dropped_records, 2);
        let ReportPayload::Metrics(report) = &outcome.payload else {
            panic!("expected metrics payload");
        };
        assert_eq!(report.metrics.total_count, 2);
        assert_eq!(outcome.generated_at, now());
        assert!(outcome
            .insights
            .iter()
            .any(|i| i.insight_type == InsightType::Summary && i.id == "summary-20240331120000"));
    }

    #[tokio::test]
    async fn test_timeout_returns_fallback() {
        crate::logging::init_test();
        let outcome = service(SlowSource, 50).generate(request(ReportMode::Overview)).await;

        assert!(outcome.is_degraded());
        assert!(outcome.error.as_deref().unwrap().contains("timed out after 50ms"));
        assert_eq!(outcome.insights.len(), 1);
        assert_eq!(outcome.insights[0].confidence, 20);
        assert!(matches!(outcome.payload, ReportPayload::Overview(_)));
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_fallback() {
        let outcome = service(FailingSource, 5_000)
            .generate(request(ReportMode::Activity))
            .await;

        assert!(outcome.error.as_deref().unwrap().contains("content store unavailable"));
        assert_eq!(outcome.insights[0].title, "Insufficient data");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["mode"], "activity");
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_error_field_omitted_on_success() {
        let outcome = service(InMemorySource::default(), 5_000)
            .generate(request(ReportMode::Questions))
            .await;
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["dateRange"]["end"], "2024-03-31");
    }
}
