//! # Seasonality
//!
//! Immutable city → peak-month table producing a [`SeasonalityContext`] for a
//! city and date. The table is plain data injected at construction:
//!
//! - Loads from JSON or TOML (`{"peak_months": {"berlin": [6, 7, 8, 12]}}`).
//! - City lookup is case-insensitive and whitespace/dash tolerant.
//! - Unknown cities are never peak season.
//! - `default_seed()` carries the built-in European city calendar.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

/// Meteorological season of a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn of_month(month: u32) -> Self {
        match month {
            3..=5 => Self::Spring,
            6..=8 => Self::Summer,
            9..=11 => Self::Autumn,
            _ => Self::Winter,
        }
    }
}

/// Tourism intensity for a city at a given time of year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourismLevel {
    VeryHigh,
    High,
    Medium,
    #[serde(other)]
    Low,
}

impl TourismLevel {
    /// Additive seasonal impact contributed by the tourism level alone.
    pub fn multiplier(self) -> f64 {
        match self {
            Self::VeryHigh => 0.4,
            Self::High => 0.2,
            Self::Medium => 0.1,
            Self::Low => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryHigh => "very_high",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Seasonality classification for one city and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityContext {
    pub season: Season,
    pub is_peak_season: bool,
    pub tourism_level: TourismLevel,
    /// Typical hotel occupancy fraction in [0, 1].
    #[serde(rename = "typical_occupancy_rate")]
    pub typical_occupancy: f64,
}

impl SeasonalityContext {
    pub fn new(season: Season, is_peak_season: bool, tourism_level: TourismLevel) -> Self {
        Self {
            season,
            is_peak_season,
            tourism_level,
            typical_occupancy: typical_occupancy(is_peak_season, season),
        }
    }
}

/// City → peak months lookup table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SeasonalityTable {
    /// Normalized city name → months (1-12) considered peak season.
    #[serde(default)]
    peak_months: HashMap<String, Vec<u32>>,
}

impl SeasonalityTable {
    /// Build from explicit entries; city names are normalized.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u32>)>,
        S: AsRef<str>,
    {
        let peak_months = entries
            .into_iter()
            .map(|(city, months)| (normalize_city(city.as_ref()), months))
            .collect();
        Self { peak_months }
    }

    /// Load from a JSON or TOML file (format picked by extension, JSON otherwise).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading seasonality table from {}", path.display()))?;
        let raw: Self = if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            toml::from_str(&s).context("parsing seasonality toml")?
        } else {
            serde_json::from_str(&s).context("parsing seasonality json")?
        };
        // Re-normalize keys so hand-written files may use any casing.
        Ok(Self::from_entries(raw.peak_months))
    }

    /// Load from file, falling back to the built-in seed on any error.
    pub fn load_or_seed<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(path.as_ref()) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = ?e, "seasonality table unavailable, using built-in seed");
                Self::default_seed()
            }
        }
    }

    pub fn is_peak(&self, city: &str, month: u32) -> bool {
        self.peak_months
            .get(&normalize_city(city))
            .is_some_and(|months| months.contains(&month))
    }

    /// Classify a city and date.
    pub fn lookup(&self, city: &str, date: NaiveDate) -> SeasonalityContext {
        let month = date.month();
        let season = Season::of_month(month);
        let is_peak = self.is_peak(city, month);
        SeasonalityContext::new(season, is_peak, tourism_level(month, is_peak))
    }

    /// Built-in seed with the cities the baseline table also knows about.
    pub fn default_seed() -> Self {
        Self::from_entries([
            ("berlin", vec![6, 7, 8, 12]),
            ("paris", vec![4, 5, 6, 9]),
            ("london", vec![6, 7, 8, 12]),
        ])
    }
}

fn tourism_level(month: u32, is_peak: bool) -> TourismLevel {
    if is_peak {
        return TourismLevel::High;
    }
    match month {
        6..=8 => TourismLevel::Medium,
        1 | 2 => TourismLevel::Low,
        _ => TourismLevel::Medium,
    }
}

fn typical_occupancy(is_peak: bool, season: Season) -> f64 {
    if is_peak {
        return 0.85;
    }
    match season {
        Season::Summer => 0.70,
        Season::Winter => 0.60,
        _ => 0.65,
    }
}

/// Lowercase, dashes/underscores to spaces, collapse whitespace.
pub(crate) fn normalize_city(s: &str) -> String {
    let out = s.trim().to_lowercase().replace(['-', '_'], " ");
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
