//! demand.rs: aggregate demand pressure from events and seasonality.

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarContext;
use crate::seasonality::SeasonalityContext;
use crate::signals::EventSignal;

/// Upper bound of the event impact score.
pub const EVENT_SCORE_CAP: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandLevel {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl DemandLevel {
    /// Demand-supply impact fed to the surge engine.
    pub fn pressure(self) -> f64 {
        match self {
            Self::VeryHigh => 0.5,
            Self::High => 0.3,
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

/// Derived demand indicators. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandIndicators {
    major_events_count: u32,
    total_expected_visitors: u64,
    event_impact_score: f64,
    #[serde(rename = "overall_demand_level")]
    demand_level: DemandLevel,
}

impl DemandIndicators {
    /// Build indicators from raw counts; score and level are derived.
    pub fn compute(major_events_count: u32, total_expected_visitors: u64, is_peak: bool) -> Self {
        let event_impact_score = event_impact_score(major_events_count, total_expected_visitors);
        Self {
            major_events_count,
            total_expected_visitors,
            event_impact_score,
            demand_level: classify(major_events_count, event_impact_score, is_peak),
        }
    }

    pub fn major_events_count(&self) -> u32 {
        self.major_events_count
    }

    pub fn total_expected_visitors(&self) -> u64 {
        self.total_expected_visitors
    }

    pub fn event_impact_score(&self) -> f64 {
        self.event_impact_score
    }

    pub fn demand_level(&self) -> DemandLevel {
        self.demand_level
    }
}

/// Saturating linear score: two points per major event plus one per 5k visitors.
pub fn event_impact_score(major_events_count: u32, total_expected_visitors: u64) -> f64 {
    let raw = f64::from(major_events_count) * 2.0 + total_expected_visitors as f64 / 5000.0;
    raw.min(EVENT_SCORE_CAP)
}

/// First matching rule wins.
pub fn classify(major_events_count: u32, score: f64, is_peak: bool) -> DemandLevel {
    if score > 7.0 || major_events_count > 2 {
        DemandLevel::VeryHigh
    } else if score > 5.0 || major_events_count > 1 {
        DemandLevel::High
    } else if score > 3.0 || is_peak {
        DemandLevel::Medium
    } else {
        DemandLevel::Low
    }
}

/// Compute indicators for a deduplicated event list.
///
/// The calendar context is accepted for interface symmetry with the rest of
/// the pipeline; the current model does not weight it into demand.
pub fn calculate_demand(
    events: &[EventSignal],
    seasonality: &SeasonalityContext,
    _calendar: &CalendarContext,
) -> DemandIndicators {
    let major = events.iter().filter(|e| e.impact_level.is_major()).count() as u32;
    let visitors: u64 = events.iter().map(|e| u64::from(e.visitors_or_zero())).sum();
    DemandIndicators::compute(major, visitors, seasonality.is_peak_season)
}
