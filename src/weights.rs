//! Category weights for the surge model.
//!
//! JSON shape (also the `factor_weights` block of a surge report):
//! {
//!   "events": 0.75,
//!   "seasonality": 0.10,
//!   "calendar": 0.05,
//!   "demand_supply": 0.10
//! }
//!
//! A weight set only exists if it sums to 1.0; custom sets go through
//! [`CategoryWeights::new`] or [`load_weights_file`], both of which validate.

use serde::{Deserialize, Serialize};
use std::{fs, io, path::Path};

use crate::error::{Result, SurgeError};

const SUM_TOLERANCE: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CategoryWeights {
    events: f64,
    seasonality: f64,
    calendar: f64,
    demand_supply: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            events: 0.75,
            seasonality: 0.10,
            calendar: 0.05,
            demand_supply: 0.10,
        }
    }
}

impl CategoryWeights {
    pub fn new(events: f64, seasonality: f64, calendar: f64, demand_supply: f64) -> Result<Self> {
        let w = Self {
            events,
            seasonality,
            calendar,
            demand_supply,
        };
        w.validate()?;
        Ok(w)
    }

    fn validate(&self) -> Result<()> {
        let parts = [
            ("events", self.events),
            ("seasonality", self.seasonality),
            ("calendar", self.calendar),
            ("demand_supply", self.demand_supply),
        ];
        for (name, w) in parts {
            if !w.is_finite() || w < 0.0 {
                return Err(SurgeError::missing(format!("factor_weights.{name}")));
            }
        }
        if (self.sum() - 1.0).abs() > SUM_TOLERANCE {
            return Err(SurgeError::Computation(format!(
                "category weights must sum to 1.0, got {:.6}",
                self.sum()
            )));
        }
        Ok(())
    }

    pub fn events(&self) -> f64 {
        self.events
    }

    pub fn seasonality(&self) -> f64 {
        self.seasonality
    }

    pub fn calendar(&self) -> f64 {
        self.calendar
    }

    pub fn demand_supply(&self) -> f64 {
        self.demand_supply
    }

    pub fn sum(&self) -> f64 {
        self.events + self.seasonality + self.calendar + self.demand_supply
    }

    /// Weighted blend of the four category impacts (not yet scaled to percent).
    pub fn blend(&self, event: f64, seasonal: f64, calendar: f64, demand: f64) -> f64 {
        self.events * event
            + self.seasonality * seasonal
            + self.calendar * calendar
            + self.demand_supply * demand
    }
}

// Deserialization goes through `new` so an invalid set can never be built.
impl<'de> Deserialize<'de> for CategoryWeights {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            events: f64,
            seasonality: f64,
            calendar: f64,
            demand_supply: f64,
        }
        let r = Raw::deserialize(deserializer)?;
        CategoryWeights::new(r.events, r.seasonality, r.calendar, r.demand_supply)
            .map_err(serde::de::Error::custom)
    }
}

/// Load weights directly (no caching). Public for tests/tools.
pub fn load_weights_file(path: &Path) -> io::Result<CategoryWeights> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
