// src/ingest/providers/nager.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::types::HolidayProvider;
use crate::signals::Holiday;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    date: Option<String>,
    local_name: Option<String>,
    name: Option<String>,
    #[serde(default)]
    types: Vec<String>,
    global: Option<bool>,
}

/// Public-holiday source backed by a Nager.Date-style API.
pub struct NagerHolidayProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl NagerHolidayProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    /// `base_url` without trailing slash, e.g. `https://date.nager.at/api/v3`.
    pub fn from_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("hotel-surge-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building holiday http client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                client,
            },
        })
    }

    fn parse_holidays_from_str(s: &str) -> Result<Vec<Holiday>> {
        let items: Vec<Item> = serde_json::from_str(s).context("parsing holiday json")?;
        let mut out = Vec::with_capacity(items.len());
        for it in items {
            let Some(date) = it
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                continue;
            };
            let name = it.local_name.or(it.name).unwrap_or_default();
            let mut h = Holiday::new(name, date);
            if let Some(t) = it.types.into_iter().next() {
                h.kind = t;
            }
            h.is_national = it.global.unwrap_or(true);
            out.push(h);
        }
        Ok(out)
    }
}

#[async_trait]
impl HolidayProvider for NagerHolidayProvider {
    async fn fetch_holidays(&self, country_code: &str, year: i32) -> Result<Vec<Holiday>> {
        match &self.mode {
            Mode::Fixture(s) => Ok(Self::parse_holidays_from_str(s)?
                .into_iter()
                .filter(|h| chrono::Datelike::year(&h.date) == year)
                .collect()),

            Mode::Http { base_url, client } => {
                let url = format!("{base_url}/PublicHolidays/{year}/{country_code}");
                let body = client
                    .get(&url)
                    .send()
                    .await
                    .context("holiday http get()")?
                    .error_for_status()
                    .context("holiday http status")?
                    .text()
                    .await
                    .context("holiday http .text()")?;
                Self::parse_holidays_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "holiday_api"
    }
}
