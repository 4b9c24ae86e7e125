//! surge.rs: output shapes of the surge engine (factors, category,
//! recommendations) and the final [`SurgeResult`].
//!
//! Everything here is produced by one computation and carries no identity
//! beyond it; recomputing from the same inputs yields an equal value.

use serde::{Deserialize, Serialize};

use crate::signals::ImpactLevel;
use crate::weights::CategoryWeights;

/// Driver name reported when no factor was produced.
pub const UNKNOWN_DRIVER: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl From<ImpactLevel> for Severity {
    fn from(level: ImpactLevel) -> Self {
        match level {
            ImpactLevel::Critical => Self::Critical,
            ImpactLevel::High => Self::High,
            ImpactLevel::Medium => Self::Medium,
            ImpactLevel::Low => Self::Low,
        }
    }
}

/// One named contributor to the surge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    #[serde(rename = "factor")]
    pub label: String,
    pub description: String,
    /// May be negative (weekday discount).
    pub impact_percentage: f64,
    /// The category weight this factor belongs to.
    pub weight: f64,
    pub severity: Severity,
}

impl Factor {
    pub fn new(
        label: impl Into<String>,
        description: impl Into<String>,
        impact_percentage: f64,
        weight: f64,
        severity: Severity,
    ) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            impact_percentage,
            weight,
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurgeCategory {
    VeryHigh,
    High,
    Moderate,
    Low,
    Minimal,
}

impl SurgeCategory {
    /// Bucket an actual surge percentage.
    pub fn from_surge(pct: f64) -> Self {
        if pct >= 150.0 {
            Self::VeryHigh
        } else if pct >= 100.0 {
            Self::High
        } else if pct >= 50.0 {
            Self::Moderate
        } else if pct >= 20.0 {
            Self::Low
        } else {
            Self::Minimal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    AlternativeDates,
    AlternativeLocation,
    BookingTiming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    High,
    Medium,
}

/// Actionable suggestion attached to a surge result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub suggestion: String,
    /// Expected saving in percentage points of the surge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_saving: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
}

impl Recommendation {
    pub fn new(kind: RecommendationKind, suggestion: impl Into<String>) -> Self {
        Self {
            kind,
            suggestion: suggestion.into(),
            potential_saving: None,
            urgency: None,
        }
    }

    pub fn saving(mut self, pct: f64) -> Self {
        self.potential_saving = Some(pct);
        self
    }

    pub fn urgency(mut self, u: Urgency) -> Self {
        self.urgency = Some(u);
        self
    }
}

/// Complete, explainable surge assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurgeResult {
    /// Observed surge from real prices, in percent.
    pub surge_percentage: f64,
    /// Surge predicted by the weighted factor model, in percent.
    pub model_surge: f64,
    pub surge_category: SurgeCategory,
    pub primary_driver: String,
    /// Agreement between model and observation, in [0.5, 1.0].
    pub confidence_level: f64,
    pub surge_justified: bool,
    pub explanation: String,
    pub factors: Vec<Factor>,
    pub factor_weights: CategoryWeights,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<Recommendation>,
    pub mode: String,
}

impl SurgeResult {
    /// Recommendations of a given kind, in emission order.
    pub fn recommendation(&self, kind: RecommendationKind) -> Option<&Recommendation> {
        self.recommendations.iter().find(|r| r.kind == kind)
    }
}
