//! signals.rs: raw upstream signals: events and holidays.
//!
//! These are produced by external providers and treated as immutable once
//! fetched. Field names follow the analysis-parameters payload (snake_case),
//! so a fetched event serializes straight into the `events` array.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Distance assumed when a provider does not report one.
pub const DEFAULT_DISTANCE_KM: f64 = 5.0;

/// Categorical event severity. Anything a provider reports that is not one of
/// the three named levels is treated as `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Critical,
    High,
    Medium,
    #[serde(other)]
    Low,
}

impl ImpactLevel {
    /// Multiplier applied to an event's visitor/distance product.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Critical => 1.5,
            Self::High => 1.2,
            Self::Medium => 0.8,
            Self::Low => 0.4,
        }
    }

    /// High and critical events count as "major".
    pub fn is_major(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Upper-case label used in factor names ("CRITICAL Event").
    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// A single event near the point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSignal {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Category as reported by the provider ("Sports", "Music", ...).
    #[serde(rename = "type", default = "default_event_type")]
    pub kind: String,
    #[serde(default = "default_venue")]
    pub venue: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_visitors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    pub impact_level: ImpactLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_availability: Option<String>,
}

fn default_event_type() -> String {
    "Event".to_string()
}

fn default_venue() -> String {
    "TBA".to_string()
}

impl EventSignal {
    pub fn new(name: impl Into<String>, date: NaiveDate, impact_level: ImpactLevel) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            kind: default_event_type(),
            venue: default_venue(),
            date,
            time: None,
            capacity: None,
            expected_visitors: None,
            distance_km: None,
            impact_level,
            ticket_availability: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = venue.into();
        self
    }

    pub fn visitors(mut self, expected: u32) -> Self {
        self.expected_visitors = Some(expected);
        self
    }

    pub fn capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn distance(mut self, km: f64) -> Self {
        self.distance_km = Some(km);
        self
    }

    /// Expected visitors, missing treated as zero.
    pub fn visitors_or_zero(&self) -> u32 {
        self.expected_visitors.unwrap_or(0)
    }

    /// Distance in km, falling back to [`DEFAULT_DISTANCE_KM`].
    pub fn distance_or_default(&self) -> f64 {
        self.distance_km.unwrap_or(DEFAULT_DISTANCE_KM)
    }
}

/// A public/bank/school holiday for a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub name: String,
    pub date: NaiveDate,
    /// Provider-reported type, e.g. "Public", "Bank", "School".
    #[serde(rename = "type", default = "default_holiday_type")]
    pub kind: String,
    #[serde(default = "default_true")]
    pub is_national: bool,
}

fn default_holiday_type() -> String {
    "PUBLIC".to_string()
}

fn default_true() -> bool {
    true
}

impl Holiday {
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
            kind: default_holiday_type(),
            is_national: true,
        }
    }
}
