// src/ingest/mod.rs
pub mod config;
pub mod providers;
pub mod types;

use crate::ingest::types::{EventProvider, EventQuery, HolidayProvider};
use crate::signals::{EventSignal, Holiday};
use chrono::{Datelike, NaiveDate};
use futures_util::future::join_all;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::future::Future;
use std::time::{Duration, Instant};

/// One-time metrics registration (so series carry descriptions once a
/// recorder is installed).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_events_total", "Events returned by upstream providers.");
        describe_counter!(
            "ingest_dedup_total",
            "Events removed by (name, date) deduplication."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch errors and timeouts."
        );
        describe_histogram!("ingest_fetch_ms", "Provider fetch time in milliseconds.");
    });
}

/// Result of gathering from one or more sources. `degraded` names every source
/// that failed or timed out and therefore contributed nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Gathered<T> {
    pub items: Vec<T>,
    pub degraded: Vec<String>,
}

// Manual impl: a derive would demand `T: Default`.
impl<T> Default for Gathered<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            degraded: Vec::new(),
        }
    }
}

/// Normalize an event name for dedup: trim, lowercase, collapse whitespace.
pub fn normalize_name(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn dedup_key(ev: &EventSignal) -> (String, NaiveDate) {
    (normalize_name(&ev.name), ev.date)
}

/// Merge event lists, keeping the first event seen for each (name, date).
/// Returns (kept, dropped_count). Output follows merge order.
pub fn merge_dedup<I>(lists: I) -> (Vec<EventSignal>, usize)
where
    I: IntoIterator<Item = Vec<EventSignal>>,
{
    let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
    let mut keep = Vec::new();
    let mut dropped = 0usize;

    for ev in lists.into_iter().flatten() {
        if !seen.insert(dedup_key(&ev)) {
            dropped += 1;
            continue;
        }
        keep.push(ev);
    }

    (keep, dropped)
}

/// Run one upstream call under a timeout. Errors and expiry degrade to `None`
/// (logged + counted) so callers can carry on with an empty list.
async fn guarded<T, F>(provider: &str, timeout: Duration, fut: F) -> Option<Vec<T>>
where
    F: Future<Output = anyhow::Result<Vec<T>>>,
{
    let t0 = Instant::now();
    let out = match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(v)) => Some(v),
        Ok(Err(e)) => {
            tracing::warn!(error = ?e, provider, "provider error");
            None
        }
        Err(_) => {
            tracing::warn!(provider, timeout_ms = timeout.as_millis() as u64, "provider timed out");
            None
        }
    };
    histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    if out.is_none() {
        counter!("ingest_provider_errors_total").increment(1);
    }
    out
}

/// Fetch from all event providers concurrently and merge the results.
pub async fn gather_events(
    providers: &[Box<dyn EventProvider>],
    query: &EventQuery,
    timeout: Duration,
) -> Gathered<EventSignal> {
    ensure_metrics_described();

    let fetches = providers
        .iter()
        .map(|p| async move { (p.name(), guarded(p.name(), timeout, p.fetch_events(query)).await) });
    let results = join_all(fetches).await;

    let mut degraded = Vec::new();
    let mut lists = Vec::with_capacity(results.len());
    for (name, res) in results {
        match res {
            Some(v) => {
                counter!("ingest_events_total").increment(v.len() as u64);
                lists.push(v);
            }
            None => degraded.push(name.to_string()),
        }
    }

    let (items, dropped) = merge_dedup(lists);
    counter!("ingest_dedup_total").increment(dropped as u64);

    tracing::info!(
        target: "ingest",
        city = %query.city,
        kept = items.len(),
        dedup = dropped,
        degraded = degraded.len(),
        "events gathered"
    );

    Gathered { items, degraded }
}

/// Fetch holidays for every calendar year the stay touches.
pub async fn gather_holidays(
    provider: &dyn HolidayProvider,
    country_code: &str,
    check_in: NaiveDate,
    check_out: NaiveDate,
    timeout: Duration,
) -> Gathered<Holiday> {
    ensure_metrics_described();

    let first = check_in.year();
    let last = check_out.year().max(first);
    let fetches = (first..=last).map(|year| {
        guarded(
            provider.name(),
            timeout,
            provider.fetch_holidays(country_code, year),
        )
    });

    let mut out = Gathered::default();
    for res in join_all(fetches).await {
        match res {
            Some(mut v) => out.items.append(&mut v),
            None => {
                let name = provider.name().to_string();
                if !out.degraded.contains(&name) {
                    out.degraded.push(name);
                }
            }
        }
    }
    out
}
