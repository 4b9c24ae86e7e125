//! # Surge Engine
//! Pure, testable logic that maps `(signals, current price, baseline)` →
//! [`SurgeResult`]. No I/O, no clock, no randomness: the same inputs always
//! produce an equal result.
//!
//! Model: four category impacts (events, seasonality, calendar, demand-supply)
//! are blended with [`CategoryWeights`] into a model surge; the actual surge
//! comes from prices. Confidence measures how well the two agree.

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarContext;
use crate::demand::DemandIndicators;
use crate::error::{Result, SurgeError};
use crate::seasonality::SeasonalityContext;
use crate::signals::EventSignal;
use crate::surge::{
    Factor, Recommendation, RecommendationKind, Severity, SurgeCategory, SurgeResult, Urgency,
    UNKNOWN_DRIVER,
};
use crate::weights::CategoryWeights;

/// Events farther than this contribute nothing.
const DISTANCE_CUTOFF_KM: f64 = 50.0;
/// Visitor count at which an event saturates.
const VISITOR_SATURATION: f64 = 10_000.0;
/// Cap on the summed event impact.
const EVENT_IMPACT_CAP: f64 = 2.5;

const PEAK_SEASON_IMPACT: f64 = 0.3;
const WEEKEND_IMPACT: f64 = 0.15;
const HOLIDAY_IMPACT: f64 = 0.25;
const LONG_WEEKEND_IMPACT: f64 = 0.35;
const WEEKDAY_DISCOUNT_PCT: f64 = -5.0;

const JUSTIFIED_ABOVE_PCT: f64 = 20.0;
const SIGNIFICANT_FACTOR_PCT: f64 = 10.0;
const CONFIDENCE_FLOOR: f64 = 0.5;

/// The four signal groups the engine fuses. Serialized under the same keys as
/// the analysis-parameters payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurgeSignals {
    pub events: Vec<EventSignal>,
    pub seasonality: SeasonalityContext,
    #[serde(rename = "calendar_factors")]
    pub calendar: CalendarContext,
    #[serde(rename = "demand_indicators")]
    pub demand: DemandIndicators,
}

/// Stateless scorer. Cheap to clone, safe to share across tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurgeEngine {
    weights: CategoryWeights,
}

impl SurgeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: CategoryWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> CategoryWeights {
        self.weights
    }

    /// Score one request. Fails with `Computation` on a non-positive or
    /// non-finite baseline, or a non-finite current price.
    pub fn calculate(
        &self,
        signals: &SurgeSignals,
        current_price: f64,
        baseline_price: f64,
        mode: &str,
    ) -> Result<SurgeResult> {
        if !baseline_price.is_finite() || baseline_price <= 0.0 {
            return Err(SurgeError::Computation(format!(
                "baseline price must be positive, got {baseline_price}"
            )));
        }
        if !current_price.is_finite() {
            return Err(SurgeError::Computation(format!(
                "current price must be finite, got {current_price}"
            )));
        }

        let w = self.weights;
        let mut factors = Vec::new();

        // 1) - 4) category impacts, each appending its own factors
        let event = event_impact(&signals.events, w.events(), &mut factors);
        let seasonal = seasonal_impact(&signals.seasonality, w.seasonality(), &mut factors);
        let calendar = calendar_impact(&signals.calendar, w.calendar(), &mut factors);
        let demand = demand_impact(&signals.demand, w.demand_supply(), &mut factors);

        // 5) - 6) model vs. observed
        let model_surge = w.blend(event, seasonal, calendar, demand) * 100.0;
        let actual_surge = (current_price - baseline_price) / baseline_price * 100.0;
        if !actual_surge.is_finite() {
            return Err(SurgeError::Computation(format!(
                "surge of {current_price} over {baseline_price} is not representable"
            )));
        }

        // 7) - 12) interpretation
        let result = SurgeResult {
            surge_percentage: actual_surge,
            model_surge,
            surge_category: SurgeCategory::from_surge(actual_surge),
            primary_driver: primary_driver(&factors),
            confidence_level: confidence(actual_surge, model_surge),
            surge_justified: actual_surge > JUSTIFIED_ABOVE_PCT,
            explanation: explain(actual_surge, &factors),
            recommendations: recommend(actual_surge),
            factors,
            factor_weights: w,
            mode: mode.to_string(),
        };

        tracing::debug!(
            actual = result.surge_percentage,
            model = result.model_surge,
            confidence = result.confidence_level,
            driver = %result.primary_driver,
            "surge scored"
        );
        Ok(result)
    }
}

/// Linear decay to zero at 50 km.
pub fn distance_factor(distance_km: f64) -> f64 {
    (1.0 - distance_km / DISTANCE_CUTOFF_KM).max(0.0)
}

/// Linear in visitors, saturating at 10k.
pub fn visitor_factor(expected_visitors: u32) -> f64 {
    (f64::from(expected_visitors) / VISITOR_SATURATION).min(1.0)
}

/// Impact of a single event before weighting.
pub fn single_event_impact(ev: &EventSignal) -> f64 {
    visitor_factor(ev.visitors_or_zero())
        * distance_factor(ev.distance_or_default())
        * ev.impact_level.multiplier()
}

fn event_impact(events: &[EventSignal], weight: f64, factors: &mut Vec<Factor>) -> f64 {
    let mut total = 0.0;
    for ev in events {
        let impact = single_event_impact(ev);
        total += impact;
        factors.push(Factor::new(
            format!("{} Event", ev.impact_level.label()),
            format!("{} ({} visitors)", ev.name, ev.visitors_or_zero()),
            impact * 100.0,
            weight,
            Severity::from(ev.impact_level),
        ));
    }
    total.min(EVENT_IMPACT_CAP)
}

fn seasonal_impact(s: &SeasonalityContext, weight: f64, factors: &mut Vec<Factor>) -> f64 {
    let base = if s.is_peak_season {
        PEAK_SEASON_IMPACT
    } else {
        0.0
    };
    let impact = base + s.tourism_level.multiplier();
    if impact > 0.0 {
        let (description, severity) = if s.is_peak_season {
            ("Peak season".to_string(), Severity::Medium)
        } else {
            (
                format!("Tourism level: {}", s.tourism_level.as_str()),
                Severity::Low,
            )
        };
        factors.push(Factor::new(
            "Seasonality",
            description,
            impact * 100.0,
            weight,
            severity,
        ));
    }
    impact
}

fn calendar_impact(c: &CalendarContext, weight: f64, factors: &mut Vec<Factor>) -> f64 {
    let mut impact = 0.0;
    let mut applied = Vec::new();
    if c.is_weekend {
        impact += WEEKEND_IMPACT;
        applied.push("weekend");
    }
    if c.is_holiday {
        impact += HOLIDAY_IMPACT;
        applied.push("public holiday");
    }
    if c.is_long_weekend {
        impact += LONG_WEEKEND_IMPACT;
        applied.push("long weekend");
    }

    if impact > 0.0 {
        factors.push(Factor::new(
            "Calendar Factors",
            applied.join(", "),
            impact * 100.0,
            weight,
            Severity::Low,
        ));
    } else {
        // Explanatory only: the calendar impact itself stays at zero.
        factors.push(Factor::new(
            "Weekday Discount",
            "Booking on weekday",
            WEEKDAY_DISCOUNT_PCT,
            weight,
            Severity::Low,
        ));
    }
    impact
}

fn demand_impact(d: &DemandIndicators, weight: f64, factors: &mut Vec<Factor>) -> f64 {
    let level = d.demand_level();
    let impact = level.pressure();
    if impact > 0.0 {
        let severity = if impact > 0.3 {
            Severity::High
        } else {
            Severity::Medium
        };
        factors.push(Factor::new(
            "Demand-Supply Pressure",
            format!("Overall demand level: {}", level.as_str()),
            impact * 100.0,
            weight,
            severity,
        ));
    }
    impact
}

/// Degrades linearly with model/observation disagreement, floored at 0.5.
pub fn confidence(actual_surge: f64, model_surge: f64) -> f64 {
    (1.0 - (actual_surge - model_surge).abs() / 100.0).max(CONFIDENCE_FLOOR)
}

/// Highest-impact factor (sign not considered); the earliest wins on ties.
fn top_factor<'a>(factors: impl Iterator<Item = &'a Factor>) -> Option<&'a Factor> {
    factors.fold(None::<&'a Factor>, |best, f| match best {
        Some(b) if b.impact_percentage >= f.impact_percentage => Some(b),
        _ => Some(f),
    })
}

fn primary_driver(factors: &[Factor]) -> String {
    top_factor(factors.iter())
        .map(|f| f.label.clone())
        .unwrap_or_else(|| UNKNOWN_DRIVER.to_string())
}

fn explain(actual_surge: f64, factors: &[Factor]) -> String {
    let lead = top_factor(factors.iter().filter(|f| f.impact_percentage > 0.0))
        .map(|f| f.description.to_lowercase())
        .unwrap_or_else(|| "baseline market conditions".to_string());

    let mut out = format!("The {actual_surge:.0}% price surge is primarily driven by {lead}");

    let significant = factors
        .iter()
        .filter(|f| f.impact_percentage > SIGNIFICANT_FACTOR_PCT)
        .count();
    if significant > 1 {
        let others = significant - 1;
        let plural = if others > 1 { "s" } else { "" };
        out.push_str(&format!(
            " combined with {others} other significant factor{plural}"
        ));
    }
    out.push('.');
    out
}

fn recommend(actual_surge: f64) -> Vec<Recommendation> {
    if actual_surge > 100.0 {
        vec![
            Recommendation::new(
                RecommendationKind::AlternativeDates,
                "Consider booking 1-2 days earlier or later",
            )
            .saving(actual_surge * 0.4)
            .urgency(Urgency::High),
            Recommendation::new(
                RecommendationKind::AlternativeLocation,
                "Consider nearby cities or suburbs",
            )
            .saving(actual_surge * 0.5),
        ]
    } else if actual_surge > 50.0 {
        vec![Recommendation::new(
            RecommendationKind::BookingTiming,
            "Prices are elevated - book soon if dates are fixed",
        )
        .urgency(Urgency::Medium)]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::DemandIndicators;
    use crate::seasonality::{Season, TourismLevel};
    use crate::signals::ImpactLevel;
    use chrono::NaiveDate;

    fn quiet() -> SurgeSignals {
        SurgeSignals {
            events: Vec::new(),
            seasonality: SeasonalityContext::new(Season::Autumn, false, TourismLevel::Low),
            calendar: CalendarContext::plain_weekday(),
            demand: DemandIndicators::compute(0, 0, false),
        }
    }

    fn event(level: ImpactLevel, visitors: u32, km: f64) -> EventSignal {
        EventSignal::new("Cup Final", NaiveDate::from_ymd_opt(2024, 7, 6).unwrap(), level)
            .visitors(visitors)
            .distance(km)
    }

    #[test]
    fn quiet_market_is_minimal() {
        let r = SurgeEngine::new().calculate(&quiet(), 100.0, 100.0, "standard").unwrap();
        assert!(r.surge_percentage.abs() < 1e-12);
        assert!(r.model_surge.abs() < 1e-12);
        assert_eq!(r.surge_category, SurgeCategory::Minimal);
        assert!(!r.surge_justified);
        assert_eq!(r.factors.len(), 1);
        assert_eq!(r.factors[0].label, "Weekday Discount");
        assert!((r.factors[0].impact_percentage + 5.0).abs() < 1e-12);
        assert_eq!(r.primary_driver, "Weekday Discount");
        assert!((r.confidence_level - 1.0).abs() < 1e-12);
        assert_eq!(
            r.explanation,
            "The 0% price surge is primarily driven by baseline market conditions."
        );
        assert!(r.recommendations.is_empty());
    }

    #[test]
    fn critical_event_drives_very_high_surge() {
        let mut s = quiet();
        s.events = vec![event(ImpactLevel::Critical, 12_000, 0.0)];
        let r = SurgeEngine::new().calculate(&s, 250.0, 100.0, "standard").unwrap();

        assert!((r.surge_percentage - 150.0).abs() < 1e-9);
        assert_eq!(r.surge_category, SurgeCategory::VeryHigh);
        assert!(r.surge_justified);
        assert_eq!(r.primary_driver, "CRITICAL Event");
        // 1.0 visitors * 1.0 distance * 1.5 level, weighted 0.75
        assert!((r.model_surge - 112.5).abs() < 1e-9);
        assert!((r.confidence_level - (1.0 - 37.5 / 100.0)).abs() < 1e-9);
        assert!(r.recommendation(RecommendationKind::AlternativeDates).is_some());
        assert!(r.recommendation(RecommendationKind::AlternativeLocation).is_some());
        let alt = r.recommendation(RecommendationKind::AlternativeDates).unwrap();
        assert!((alt.potential_saving.unwrap() - 60.0).abs() < 1e-9);
        assert_eq!(alt.urgency, Some(Urgency::High));
    }

    #[test]
    fn distance_beyond_cutoff_contributes_nothing() {
        assert_eq!(distance_factor(50.0), 0.0);
        assert_eq!(distance_factor(120.0), 0.0);
        let mut prev = distance_factor(0.0);
        for km in 1..60 {
            let f = distance_factor(f64::from(km));
            assert!(f <= prev);
            prev = f;
        }
    }

    #[test]
    fn missing_distance_defaults_to_five_km() {
        let mut ev = event(ImpactLevel::High, 10_000, 0.0);
        ev.distance_km = None;
        assert!((single_event_impact(&ev) - 0.9 * 1.2).abs() < 1e-12);
    }

    #[test]
    fn event_total_is_capped() {
        let mut s = quiet();
        s.events = (0..5)
            .map(|_| event(ImpactLevel::Critical, 20_000, 0.0))
            .collect();
        let r = SurgeEngine::new().calculate(&s, 100.0, 100.0, "standard").unwrap();
        assert_eq!(r.factors.iter().filter(|f| f.label == "CRITICAL Event").count(), 5);
        // 2.5 cap * 0.75 * 100
        assert!((r.model_surge - 187.5).abs() < 1e-9);
    }

    #[test]
    fn calendar_flags_are_additive() {
        let mut s = quiet();
        s.calendar.is_weekend = true;
        s.calendar.is_long_weekend = true;
        let r = SurgeEngine::new().calculate(&s, 100.0, 100.0, "standard").unwrap();
        let cal = r.factors.iter().find(|f| f.label == "Calendar Factors").unwrap();
        assert_eq!(cal.description, "weekend, long weekend");
        assert!((cal.impact_percentage - 50.0).abs() < 1e-9);
        assert!(r.factors.iter().all(|f| f.label != "Weekday Discount"));
        assert!((r.model_surge - 0.05 * 0.5 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn seasonality_and_demand_factors() {
        let mut s = quiet();
        s.seasonality = SeasonalityContext::new(Season::Summer, true, TourismLevel::High);
        s.demand = DemandIndicators::compute(3, 0, true);
        let r = SurgeEngine::new().calculate(&s, 100.0, 100.0, "standard").unwrap();

        let season = r.factors.iter().find(|f| f.label == "Seasonality").unwrap();
        assert!((season.impact_percentage - 50.0).abs() < 1e-9);
        assert_eq!(season.severity, Severity::Medium);

        let demand = r
            .factors
            .iter()
            .find(|f| f.label == "Demand-Supply Pressure")
            .unwrap();
        assert_eq!(demand.description, "Overall demand level: very_high");
        assert_eq!(demand.severity, Severity::High);
        // 0.10*0.5 + 0.10*0.5 → 10%
        assert!((r.model_surge - 10.0).abs() < 1e-9);
    }

    #[test]
    fn explanation_counts_other_significant_factors() {
        let mut s = quiet();
        s.events = vec![event(ImpactLevel::Critical, 12_000, 0.0)];
        s.seasonality = SeasonalityContext::new(Season::Summer, true, TourismLevel::High);
        s.calendar.is_weekend = true;
        let r = SurgeEngine::new().calculate(&s, 180.0, 100.0, "standard").unwrap();
        assert_eq!(
            r.explanation,
            "The 80% price surge is primarily driven by cup final (12000 visitors) combined with 2 other significant factors."
        );
        assert_eq!(r.recommendations.len(), 1);
        assert_eq!(r.recommendations[0].kind, RecommendationKind::BookingTiming);
    }

    #[test]
    fn single_other_factor_is_not_pluralized() {
        let mut s = quiet();
        s.seasonality = SeasonalityContext::new(Season::Summer, true, TourismLevel::High);
        s.calendar.is_holiday = true;
        let r = SurgeEngine::new().calculate(&s, 130.0, 100.0, "standard").unwrap();
        assert!(r
            .explanation
            .ends_with("driven by peak season combined with 1 other significant factor."));
    }

    #[test]
    fn ties_keep_first_factor() {
        let factors = vec![
            Factor::new("A", "a", 30.0, 0.1, Severity::Low),
            Factor::new("B", "b", 30.0, 0.1, Severity::Low),
        ];
        assert_eq!(primary_driver(&factors), "A");
        assert_eq!(primary_driver(&[]), UNKNOWN_DRIVER);
    }

    #[test]
    fn non_positive_baseline_is_rejected() {
        let e = SurgeEngine::new();
        for b in [0.0, -10.0, f64::NAN] {
            let err = e.calculate(&quiet(), 100.0, b, "standard").unwrap_err();
            assert!(matches!(err, SurgeError::Computation(_)));
        }
    }

    #[test]
    fn overflowing_surge_is_rejected() {
        let err = SurgeEngine::new()
            .calculate(&quiet(), 1e308, 1e-300, "standard")
            .unwrap_err();
        assert!(matches!(err, SurgeError::Computation(_)));
    }

    #[test]
    fn confidence_is_bounded() {
        for (a, m) in [(0.0, 0.0), (300.0, 0.0), (-80.0, 40.0), (55.0, 60.0)] {
            let c = confidence(a, m);
            assert!((CONFIDENCE_FLOOR..=1.0).contains(&c));
        }
    }

    #[test]
    fn factor_weights_match_engine_weights() {
        let w = CategoryWeights::new(0.6, 0.2, 0.1, 0.1).unwrap();
        let mut s = quiet();
        s.events = vec![event(ImpactLevel::Medium, 5_000, 10.0)];
        let r = SurgeEngine::with_weights(w)
            .calculate(&s, 120.0, 100.0, "aggressive")
            .unwrap();
        assert_eq!(r.mode, "aggressive");
        for f in &r.factors {
            assert!([0.6, 0.2, 0.1].contains(&f.weight));
        }
        assert_eq!(r.factor_weights, w);
    }

    #[test]
    fn same_inputs_same_result() {
        let mut s = quiet();
        s.events = vec![event(ImpactLevel::High, 7_000, 12.0)];
        let e = SurgeEngine::new();
        let a = e.calculate(&s, 170.0, 110.0, "standard").unwrap();
        let b = e.calculate(&s, 170.0, 110.0, "standard").unwrap();
        assert_eq!(a, b);
    }
}
