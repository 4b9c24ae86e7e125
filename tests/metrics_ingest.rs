// tests/metrics_ingest.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use hotel_surge_analyzer::ingest::types::{EventProvider, EventQuery, HolidayProvider};
use hotel_surge_analyzer::ingest::{gather_events, gather_holidays};
use hotel_surge_analyzer::signals::{EventSignal, Holiday, ImpactLevel};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::time::Duration;

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
}

struct DuplicatingProvider;

#[async_trait]
impl EventProvider for DuplicatingProvider {
    async fn fetch_events(&self, _q: &EventQuery) -> Result<Vec<EventSignal>> {
        Ok(vec![
            EventSignal::new("Jazz Night", d(5), ImpactLevel::Medium),
            EventSignal::new("  jazz   NIGHT ", d(5), ImpactLevel::Medium),
            EventSignal::new("Open Air Cinema", d(6), ImpactLevel::Low),
        ])
    }
    fn name(&self) -> &'static str {
        "duplicating"
    }
}

struct FailingProvider;

#[async_trait]
impl EventProvider for FailingProvider {
    async fn fetch_events(&self, _q: &EventQuery) -> Result<Vec<EventSignal>> {
        Err(anyhow!("upstream 503"))
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

struct BrokenHolidays;

#[async_trait]
impl HolidayProvider for BrokenHolidays {
    async fn fetch_holidays(&self, _cc: &str, _year: i32) -> Result<Vec<Holiday>> {
        Err(anyhow!("holiday api down"))
    }
    fn name(&self) -> &'static str {
        "broken_holidays"
    }
}

/// Value of an unlabelled series in Prometheus text output.
fn series_value(rendered: &str, name: &str) -> Option<f64> {
    rendered
        .lines()
        .filter(|l| !l.starts_with('#'))
        .find_map(|l| l.strip_prefix(name)?.strip_prefix(' ')?.trim().parse().ok())
}

// One test per binary: the recorder is process-global.
#[tokio::test]
async fn ingest_counters_track_dedup_and_failures() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("recorder");

    let providers: Vec<Box<dyn EventProvider>> =
        vec![Box::new(DuplicatingProvider), Box::new(FailingProvider)];
    let q = EventQuery {
        city: "Berlin".into(),
        country_code: "DE".into(),
        check_in: d(5),
        check_out: d(7),
        radius_km: 30,
    };
    let got = gather_events(&providers, &q, Duration::from_secs(2)).await;
    assert_eq!(got.items.len(), 2);
    assert_eq!(got.degraded, vec!["failing"]);

    let holidays = gather_holidays(&BrokenHolidays, "DE", d(5), d(7), Duration::from_secs(2)).await;
    assert_eq!(holidays.degraded, vec!["broken_holidays"]);

    let out = handle.render();
    assert_eq!(series_value(&out, "ingest_events_total"), Some(3.0));
    assert_eq!(series_value(&out, "ingest_dedup_total"), Some(1.0));
    assert_eq!(series_value(&out, "ingest_provider_errors_total"), Some(2.0));
    // Three guarded fetches: two event providers, one holiday year.
    assert_eq!(series_value(&out, "ingest_fetch_ms_count"), Some(3.0));
}
