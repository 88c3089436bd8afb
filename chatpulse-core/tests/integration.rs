//! End-to-end tests for the report pipeline
//!
//! File-backed tests read the exports in `tests/fixtures/`; the scenario
//! tests build their records in memory.

use chatpulse_core::analytics::{InsightPriority, InsightType, ReportPayload};
use chatpulse_core::db::Database;
use chatpulse_core::{
    Config, DateRange, InMemorySource, JsonFileSource, ReportMode, ReportOutcome, ReportRequest,
    ReportService, SqliteSource,
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture_path(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
}

fn march() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
    )
    .unwrap()
}

fn request(mode: ReportMode) -> ReportRequest {
    ReportRequest {
        mode,
        range: march(),
        now: Some(now()),
    }
}

async fn run(interactions: Vec<Value>, content: Vec<Value>, mode: ReportMode) -> ReportOutcome {
    let source = InMemorySource::from_values(interactions, content);
    ReportService::new(Arc::new(source), &Config::default())
        .generate(request(mode))
        .await
}

fn question(ts: DateTime<Utc>, text: &str) -> Value {
    json!({"timestamp": ts.to_rfc3339(), "question": text})
}

async fn fixture_overview() -> ReportOutcome {
    let source = JsonFileSource::new(
        vec![fixture_path("interactions.json")],
        vec![fixture_path("*.jsonl")],
    );
    ReportService::new(Arc::new(source), &Config::default())
        .generate(request(ReportMode::Overview))
        .await
}

// ============================================
// File-backed
// ============================================

#[tokio::test]
async fn test_fixture_overview() {
    let outcome = fixture_overview().await;
    assert!(outcome.error.is_none());
    // 3 malformed interactions + 1 content item without a channel
    assert_eq!(outcome.dropped_records, 4);

    let ReportPayload::Overview(overview) = &outcome.payload else {
        panic!("expected overview payload");
    };
    assert_eq!(overview.total_records, 7);
    assert_eq!(overview.activity.total(), overview.total_records);
    assert_eq!(overview.metrics.language_distribution.count(chatpulse_core::Language::Ko), 1);
    assert_eq!(overview.content.total_content, 3);
    assert_eq!(overview.content.total_views, 2400);
    assert_eq!(overview.content.channels[0].channel, "DeFi Daily");
    assert!(overview.satisfaction_score.is_none());

    let harm = outcome
        .insights
        .iter()
        .find(|i| i.insight_type == InsightType::Alert)
        .expect("harm alert");
    assert_eq!(harm.data("channel"), Some(&json!("Rug Watch")));
}

#[tokio::test]
async fn test_fixture_platform_aliases() {
    let source = JsonFileSource::new(vec![fixture_path("interactions.json")], Vec::new());
    let outcome = ReportService::new(Arc::new(source), &Config::default())
        .generate(request(ReportMode::Platforms))
        .await;

    let ReportPayload::Platforms(platforms) = &outcome.payload else {
        panic!("expected platforms payload");
    };
    // web, crossx, default(web) → web; extension, mobile → mobile; iOS, android → api
    assert_eq!(platforms.distribution.web, 3);
    assert_eq!(platforms.distribution.mobile, 2);
    assert_eq!(platforms.distribution.api, 2);
}

#[tokio::test]
async fn test_fixture_question_digest() {
    let source = JsonFileSource::new(vec![fixture_path("interactions.json")], Vec::new());
    let outcome = ReportService::new(Arc::new(source), &Config::default())
        .generate(request(ReportMode::Questions))
        .await;

    let ReportPayload::Questions(digest) = &outcome.payload else {
        panic!("expected questions payload");
    };
    assert_eq!(digest.total_questions, 7);
    assert_eq!(digest.unique_questions, 6);
    assert_eq!(digest.top[0].count, 2);
    assert_eq!(digest.top[0].question, "Hello  there");
}

#[tokio::test]
async fn test_sqlite_store_round_trip() {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    let raw = chatpulse_core::ingest::read_export_file(std::path::Path::new(&fixture_path(
        "interactions.json",
    )))
    .unwrap();
    db.insert_raw_interactions(&raw).unwrap();

    let source = SqliteSource::new(Arc::new(db));
    let outcome = ReportService::new(Arc::new(source), &Config::default())
        .generate(request(ReportMode::Metrics))
        .await;

    let ReportPayload::Metrics(report) = &outcome.payload else {
        panic!("expected metrics payload");
    };
    assert_eq!(report.metrics.total_count, 7);
}

// ============================================
// Scenarios
// ============================================

#[tokio::test]
async fn test_language_split_eight_two() {
    let mut records: Vec<Value> = (0..8)
        .map(|i| question(now() - Duration::hours(i + 1), "지갑 연결이 안돼요"))
        .collect();
    records.extend((0..2).map(|i| question(now() - Duration::hours(20 + i), "wallet help")));

    let outcome = run(records, Vec::new(), ReportMode::Metrics).await;
    let ReportPayload::Metrics(report) = &outcome.payload else {
        panic!("expected metrics payload");
    };
    let languages = serde_json::to_value(&report.metrics.language_distribution).unwrap();
    assert_eq!(languages[0]["key"], "ko");
    assert_eq!(languages[0]["count"], 8);
    assert_eq!(languages[1]["key"], "en");
    assert_eq!(languages[1]["count"], 2);
}

#[tokio::test]
async fn test_dominance_71_of_100() {
    let mut records: Vec<Value> = (0..71)
        .map(|i| question(now() - Duration::hours(i + 1), &format!("질문 {i}")))
        .collect();
    records.extend((0..29).map(|i| question(now() - Duration::hours(i + 1), &format!("question {i}"))));

    let outcome = run(records, Vec::new(), ReportMode::Metrics).await;
    let dominance = outcome
        .insights
        .iter()
        .find(|i| i.id.starts_with("dominance-"))
        .expect("dominance insight");
    assert!(dominance.title.contains("71%"), "title: {}", dominance.title);
    assert_eq!(dominance.confidence, 95);
    assert_eq!(dominance.priority, InsightPriority::High);
}

#[tokio::test]
async fn test_growth_120_vs_100() {
    // Recent window (Mar 24 12:00, Mar 31 12:00], previous (Mar 17 12:00, Mar 24 12:00]
    let recent_start = now() - Duration::days(7);
    let previous_start = recent_start - Duration::days(7);
    let mut records: Vec<Value> = (0..120)
        .map(|i| question(recent_start + Duration::minutes(i + 1), "gm"))
        .collect();
    records.extend((0..100).map(|i| question(previous_start + Duration::minutes(i + 1), "gm")));

    let outcome = run(records, Vec::new(), ReportMode::Metrics).await;
    let ReportPayload::Metrics(report) = &outcome.payload else {
        panic!("expected metrics payload");
    };
    let total = report
        .trends
        .iter()
        .find(|t| t.metric == "totalInteractions")
        .expect("total trend");
    assert_eq!(total.change_pct, 20.0);
    assert_eq!(total.timeframe, "7d");

    let growth = outcome
        .insights
        .iter()
        .find(|i| i.id.starts_with("growth-"))
        .expect("growth insight");
    assert_eq!(growth.priority, InsightPriority::High);
    assert_eq!(growth.insight_type, InsightType::Trend);
}

#[tokio::test]
async fn test_single_day_range_compares_full_windows() {
    // Two questions a day, every day: steady traffic must not read as growth
    let day = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 31, 18, 0, 0).unwrap();
    let records: Vec<Value> = (0..30)
        .flat_map(|d| {
            let date = now - Duration::days(d);
            [6, 12].map(|h| {
                let ts = date.date_naive().and_hms_opt(h, 0, 0).unwrap().and_utc();
                question(ts, "gm")
            })
        })
        .collect();

    let source = InMemorySource::from_values(records, Vec::new());
    let outcome = ReportService::new(Arc::new(source), &Config::default())
        .generate(ReportRequest {
            mode: ReportMode::Metrics,
            range: DateRange::new(day, day).unwrap(),
            now: Some(now),
        })
        .await;

    let ReportPayload::Metrics(report) = &outcome.payload else {
        panic!("expected metrics payload");
    };
    assert_eq!(report.metrics.total_count, 2);
    let total = report
        .trends
        .iter()
        .find(|t| t.metric == "totalInteractions")
        .expect("total trend");
    assert_eq!((total.recent, total.previous), (14.0, 14.0));
    assert_eq!(total.change_pct, 0.0);
    assert!(outcome.insights.iter().all(|i| !i.id.starts_with("growth-")));
}

#[tokio::test]
async fn test_empty_window() {
    let outcome = run(Vec::new(), Vec::new(), ReportMode::Overview).await;
    assert!(outcome.error.is_none());

    let ReportPayload::Overview(overview) = &outcome.payload else {
        panic!("expected overview payload");
    };
    assert_eq!(overview.metrics.total_count, 0);
    assert_eq!(overview.metrics.daily_average, 0);
    assert!(overview.activity.cells.iter().flatten().all(|c| *c == 0));
    assert!(overview.trends.is_empty());
    assert_eq!(outcome.insights.len(), 1);
    assert_eq!(outcome.insights[0].confidence, 20);
    assert_eq!(outcome.insights[0].insight_type, InsightType::Summary);
}

#[tokio::test]
async fn test_output_is_deterministic() {
    let first = serde_json::to_string(&fixture_overview().await).unwrap();
    let second = serde_json::to_string(&fixture_overview().await).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_trend_list_omits_zero_baselines() {
    // Only the recent window has api traffic
    let recent = now() - Duration::days(1);
    let previous = now() - Duration::days(10);
    let records = vec![
        json!({"timestamp": recent.to_rfc3339(), "question": "price?", "platform": "api"}),
        json!({"timestamp": previous.to_rfc3339(), "question": "price?", "platform": "web"}),
    ];
    let outcome = run(records, Vec::new(), ReportMode::Metrics).await;
    let ReportPayload::Metrics(report) = &outcome.payload else {
        panic!("expected metrics payload");
    };
    assert!(report.trends.iter().all(|t| t.metric != "platform.api"));
    assert!(report.trends.iter().all(|t| t.change_pct.is_finite()));
    assert!(report.trends.iter().any(|t| t.metric == "platform.web"));
}
