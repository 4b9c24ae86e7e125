//! Baseline ("normal conditions") hotel price per city.
//!
//! Used only when the caller does not supply its own baseline. Prices are a
//! static per-city average (EUR) with a Friday/Saturday check-in premium.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

use crate::seasonality::normalize_city;

#[derive(Debug, Clone, Deserialize)]
pub struct BaselinePriceTable {
    /// Price used for cities not in the table.
    #[serde(default = "default_price")]
    pub default_price: f64,
    /// Multiplier for Friday/Saturday check-ins.
    #[serde(default = "default_weekend_premium")]
    pub weekend_premium: f64,
    #[serde(default)]
    prices: HashMap<String, f64>,
}

fn default_price() -> f64 {
    100.0
}

fn default_weekend_premium() -> f64 {
    1.15
}

impl Default for BaselinePriceTable {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl BaselinePriceTable {
    pub fn new<I, S>(default_price: f64, weekend_premium: f64, prices: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        Self {
            default_price,
            weekend_premium,
            prices: prices
                .into_iter()
                .map(|(c, p)| (normalize_city(c.as_ref()), p))
                .collect(),
        }
    }

    /// Load from JSON or TOML (by extension).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading baseline prices from {}", path.display()))?;
        let raw: Self = if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            toml::from_str(&s).context("parsing baseline toml")?
        } else {
            serde_json::from_str(&s).context("parsing baseline json")?
        };
        Ok(Self::new(raw.default_price, raw.weekend_premium, raw.prices))
    }

    pub fn load_or_seed<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(path.as_ref()) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = ?e, "baseline table unavailable, using built-in seed");
                Self::default_seed()
            }
        }
    }

    pub fn base_price(&self, city: &str) -> f64 {
        self.prices
            .get(&normalize_city(city))
            .copied()
            .unwrap_or(self.default_price)
    }

    /// Estimated baseline for a stay starting on `check_in`.
    pub fn estimate(&self, city: &str, check_in: NaiveDate) -> f64 {
        let base = self.base_price(city);
        match check_in.weekday() {
            Weekday::Fri | Weekday::Sat => base * self.weekend_premium,
            _ => base,
        }
    }

    pub fn default_seed() -> Self {
        Self::new(
            default_price(),
            default_weekend_premium(),
            [
                ("berlin", 95.0),
                ("paris", 130.0),
                ("london", 145.0),
                ("new york", 180.0),
                ("tokyo", 110.0),
                ("barcelona", 105.0),
                ("amsterdam", 120.0),
                ("rome", 100.0),
            ],
        )
    }
}
