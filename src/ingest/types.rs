// src/ingest/types.rs
use anyhow::Result;
use chrono::NaiveDate;

use crate::signals::{EventSignal, Holiday};

/// What to look for at an event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub city: String,
    pub country_code: String, // ISO 3166-1 alpha-2, e.g. "DE"
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub radius_km: u32,
}

#[async_trait::async_trait]
pub trait EventProvider: Send + Sync {
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<EventSignal>>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait HolidayProvider: Send + Sync {
    async fn fetch_holidays(&self, country_code: &str, year: i32) -> Result<Vec<Holiday>>;
    fn name(&self) -> &'static str;
}
