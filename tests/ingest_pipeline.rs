// tests/ingest_pipeline.rs
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use hotel_surge_analyzer::demand::DemandLevel;
use hotel_surge_analyzer::ingest::gather_events;
use hotel_surge_analyzer::ingest::providers::{NagerHolidayProvider, TicketmasterProvider};
use hotel_surge_analyzer::ingest::types::{EventProvider, EventQuery, HolidayProvider};
use hotel_surge_analyzer::signals::{EventSignal, Holiday, ImpactLevel};
use hotel_surge_analyzer::workflow::SurgeAnalyzer;
use std::time::{Duration, Instant};

const TM_FIXTURE: &str = include_str!("fixtures/ticketmaster_berlin.json");
const NAGER_FIXTURE: &str = include_str!("fixtures/nager_de.json");

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
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

struct SlowProvider {
    delay: Duration,
    name: &'static str,
}

#[async_trait]
impl EventProvider for SlowProvider {
    async fn fetch_events(&self, q: &EventQuery) -> Result<Vec<EventSignal>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![EventSignal::new(
            format!("{} showcase", self.name),
            q.check_in,
            ImpactLevel::High,
        )
        .visitors(5_000)])
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

struct NoHolidays;

#[async_trait]
impl HolidayProvider for NoHolidays {
    async fn fetch_holidays(&self, _cc: &str, _year: i32) -> Result<Vec<Holiday>> {
        Ok(vec![])
    }
    fn name(&self) -> &'static str {
        "no_holidays"
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

fn fixture_analyzer() -> SurgeAnalyzer {
    SurgeAnalyzer::new(
        vec![Box::new(TicketmasterProvider::from_fixture_str(TM_FIXTURE))],
        Box::new(NagerHolidayProvider::from_fixture_str(NAGER_FIXTURE)),
    )
}

#[tokio::test]
async fn berlin_summer_weekend_from_fixtures() {
    let p = fixture_analyzer()
        .get_analysis_parameters("Berlin", "de", d(2024, 7, 6), d(2024, 7, 8), None)
        .await
        .unwrap();

    assert_eq!(p.city, "Berlin");
    assert_eq!(p.stay_period.nights, 2);

    // Duplicate name on the same date and the undated event are gone.
    let names: Vec<_> = p.signals.events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Hertha BSC vs. FC St. Pauli", "Rammstein & Friends", "Museum Late Night"]
    );
    assert_eq!(p.signals.events[1].venue, "Waldbühne");

    assert!(p.signals.seasonality.is_peak_season);
    assert!(p.signals.calendar.is_weekend);
    assert!(!p.signals.calendar.is_holiday);
    assert_eq!(p.signals.demand.demand_level(), DemandLevel::Medium);

    assert_eq!(
        p.metadata.data_sources,
        vec!["ticketmaster", "holiday_api", "internal_seasonality"]
    );
    assert!(p.metadata.degraded_sources.is_empty());
    let hint = p.workflow_hint.as_ref().unwrap();
    assert_eq!(hint.final_step, "calculate_final_surge");
}

#[tokio::test]
async fn stay_across_new_year_fetches_both_years() {
    let p = fixture_analyzer()
        .get_analysis_parameters("Berlin", "DE", d(2024, 12, 30), d(2025, 1, 2), Some(10))
        .await
        .unwrap();

    let hs: Vec<_> = p
        .signals
        .calendar
        .holidays
        .iter()
        .map(|h| (h.name.as_str(), h.date))
        .collect();
    assert_eq!(hs, vec![("Neujahr", d(2025, 1, 1))]);
    assert!(!p.signals.calendar.is_holiday);
    assert!(p.signals.seasonality.is_peak_season);
}

#[tokio::test]
async fn failing_and_slow_providers_degrade_without_aborting() {
    let analyzer = SurgeAnalyzer::new(
        vec![
            Box::new(FailingProvider),
            Box::new(SlowProvider {
                delay: Duration::from_secs(10),
                name: "slow",
            }),
            Box::new(TicketmasterProvider::from_fixture_str(TM_FIXTURE)),
        ],
        Box::new(BrokenHolidays),
    )
    .fetch_timeout(Duration::from_millis(100));

    let t0 = Instant::now();
    let p = analyzer
        .get_analysis_parameters("Berlin", "DE", d(2024, 7, 6), d(2024, 7, 8), None)
        .await
        .unwrap();
    assert!(t0.elapsed() < Duration::from_secs(5));

    assert_eq!(p.signals.events.len(), 3);
    assert_eq!(
        p.metadata.degraded_sources,
        vec!["failing", "slow", "broken_holidays"]
    );
    assert!(p.signals.calendar.holidays.is_empty());
}

#[tokio::test]
async fn providers_are_fetched_concurrently() {
    let providers: Vec<Box<dyn EventProvider>> = vec![
        Box::new(SlowProvider {
            delay: Duration::from_millis(400),
            name: "slow_a",
        }),
        Box::new(SlowProvider {
            delay: Duration::from_millis(400),
            name: "slow_b",
        }),
    ];
    let q = EventQuery {
        city: "Paris".into(),
        country_code: "FR".into(),
        check_in: d(2024, 5, 10),
        check_out: d(2024, 5, 12),
        radius_km: 30,
    };

    let t0 = Instant::now();
    let got = gather_events(&providers, &q, Duration::from_secs(2)).await;
    assert!(t0.elapsed() < Duration::from_millis(750));
    assert_eq!(got.items.len(), 2);
    assert!(got.degraded.is_empty());
}

#[tokio::test]
async fn major_events_raise_demand() {
    let analyzer = SurgeAnalyzer::new(
        vec![
            Box::new(SlowProvider {
                delay: Duration::ZERO,
                name: "a",
            }),
            Box::new(SlowProvider {
                delay: Duration::ZERO,
                name: "b",
            }),
        ],
        Box::new(NoHolidays),
    );
    let p = analyzer
        .get_analysis_parameters("Rome", "IT", d(2024, 3, 13), d(2024, 3, 14), None)
        .await
        .unwrap();

    // Two major events: 2 * 2 + 10k / 5k = 6.0
    assert_eq!(p.signals.demand.major_events_count(), 2);
    assert_eq!(p.signals.demand.total_expected_visitors(), 10_000);
    assert!((p.signals.demand.event_impact_score() - 6.0).abs() < 1e-9);
    assert_eq!(p.signals.demand.demand_level(), DemandLevel::High);
    assert!(!p.signals.seasonality.is_peak_season);
}

#[tokio::test]
async fn blank_city_is_rejected_before_fetching() {
    let err = fixture_analyzer()
        .get_analysis_parameters("  ", "DE", d(2024, 7, 6), d(2024, 7, 8), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}
