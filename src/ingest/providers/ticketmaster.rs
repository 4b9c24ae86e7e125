// src/ingest/providers/ticketmaster.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::types::{EventProvider, EventQuery};
use crate::signals::{EventSignal, ImpactLevel};

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedEvents>,
}
#[derive(Debug, Deserialize)]
struct EmbeddedEvents {
    #[serde(default)]
    events: Vec<TmEvent>,
}
#[derive(Debug, Deserialize)]
struct TmEvent {
    id: Option<String>,
    name: Option<String>,
    dates: Option<Dates>,
    #[serde(default)]
    classifications: Vec<Classification>,
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedVenues>,
}
#[derive(Debug, Deserialize)]
struct Dates {
    start: Option<Start>,
}
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Start {
    local_date: Option<String>,
    local_time: Option<String>,
}
#[derive(Debug, Deserialize)]
struct Classification {
    segment: Option<Named>,
}
#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}
#[derive(Debug, Deserialize)]
struct EmbeddedVenues {
    #[serde(default)]
    venues: Vec<Venue>,
}
#[derive(Debug, Deserialize)]
struct Venue {
    name: Option<String>,
    distance: Option<f64>,
}

/// Event source backed by a Ticketmaster Discovery-style JSON feed.
pub struct TicketmasterProvider {
    mode: Mode,
}

enum Mode {
    // Own copy so tests do not need 'static fixtures.
    Fixture(String),
    Http {
        url: String,
        api_key: String,
        client: reqwest::Client,
    },
}

impl TicketmasterProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("hotel-surge-analyzer/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building ticketmaster http client")?;
        Ok(Self {
            mode: Mode::Http {
                url: url.into(),
                api_key: api_key.into(),
                client,
            },
        })
    }

    fn parse_events_from_str(s: &str) -> Result<Vec<EventSignal>> {
        let resp: Response = serde_json::from_str(s).context("parsing ticketmaster json")?;
        let raw = resp.embedded.map(|e| e.events).unwrap_or_default();

        let mut out = Vec::with_capacity(raw.len());
        for it in raw {
            // Name and date are required; anything else has a fallback.
            let Some(name) = it.name.as_deref().map(decode_name).filter(|n| !n.is_empty())
            else {
                continue;
            };
            let start = it.dates.and_then(|d| d.start);
            let Some(date) = start
                .as_ref()
                .and_then(|s| s.local_date.as_deref())
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            else {
                tracing::debug!(event = %name, "ticketmaster event without usable date skipped");
                continue;
            };
            let time = start
                .as_ref()
                .and_then(|s| s.local_time.as_deref())
                .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").ok());

            let segment = it
                .classifications
                .first()
                .and_then(|c| c.segment.as_ref())
                .and_then(|s| s.name.clone());
            let venue = it.embedded.and_then(|e| e.venues.into_iter().next());

            let mut ev = EventSignal::new(name, date, impact_for_segment(segment.as_deref()));
            ev.id = it.id.unwrap_or_default();
            ev.time = time;
            if let Some(seg) = segment {
                ev.kind = seg;
            }
            if let Some(v) = venue {
                if let Some(n) = v.name {
                    ev.venue = decode_name(&n);
                }
                ev.distance_km = v.distance;
            }
            out.push(ev);
        }
        Ok(out)
    }
}

#[async_trait]
impl EventProvider for TicketmasterProvider {
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<EventSignal>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_events_from_str(s),

            Mode::Http {
                url,
                api_key,
                client,
            } => {
                if api_key.is_empty() {
                    return Err(anyhow!("ticketmaster api key not configured"));
                }
                let start = format!("{}T00:00:00Z", query.check_in);
                let end = format!("{}T23:59:59Z", query.check_out);
                let radius = query.radius_km.to_string();
                let resp = client
                    .get(url.as_str())
                    .query(&[
                        ("apikey", api_key.as_str()),
                        ("city", query.city.as_str()),
                        ("countryCode", query.country_code.as_str()),
                        ("startDateTime", start.as_str()),
                        ("endDateTime", end.as_str()),
                        ("radius", radius.as_str()),
                        ("unit", "km"),
                        ("size", "20"),
                        ("sort", "relevance,desc"),
                    ])
                    .send()
                    .await
                    .context("ticketmaster http get()")?
                    .error_for_status()
                    .context("ticketmaster http status")?;
                let body = resp.text().await.context("ticketmaster http .text()")?;
                Self::parse_events_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "ticketmaster"
    }
}

/// Stadium-scale segments get a medium rating; everything else is low.
fn impact_for_segment(segment: Option<&str>) -> ImpactLevel {
    match segment.map(str::to_ascii_lowercase).as_deref() {
        Some("sports") | Some("music") => ImpactLevel::Medium,
        _ => ImpactLevel::Low,
    }
}

fn decode_name(s: &str) -> String {
    html_escape::decode_html_entities(s).trim().to_string()
}
