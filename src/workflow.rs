//! Two-step analysis workflow.
//!
//! 1. [`SurgeAnalyzer::get_analysis_parameters`] gathers events and holidays
//!    concurrently, classifies seasonality and calendar, derives demand.
//! 2. [`SurgeAnalyzer::calculate_final_surge`] scores the parameters against a
//!    market price and renders a [`SurgeReport`].
//!
//! The `*_json` variants accept/return `serde_json::Value` and never fail:
//! every error becomes a structured `{ "error": CODE, "message": .. }` object.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::baseline::BaselinePriceTable;
use crate::calendar::{analyze_calendar, REVERSED_STAY};
use crate::demand::calculate_demand;
use crate::engine::{SurgeEngine, SurgeSignals};
use crate::error::SurgeError;
use crate::ingest::config::SurgeConfig;
use crate::ingest::providers::{NagerHolidayProvider, TicketmasterProvider};
use crate::ingest::types::{EventProvider, EventQuery, HolidayProvider};
use crate::ingest::{gather_events, gather_holidays};
use crate::seasonality::SeasonalityTable;
use crate::surge::{Factor, Recommendation, SurgeCategory, SurgeResult};
use crate::weights::{load_weights_file, CategoryWeights};

pub const ALGORITHM_VERSION: &str = "1.0";
pub const DEFAULT_MODE: &str = "standard";
pub const DEFAULT_CURRENCY: &str = "EUR";
pub const DEFAULT_RADIUS_KM: u32 = 30;

const STEP_ANALYSIS: &str = "get_analysis_parameters";
const STEP_PRICES: &str = "accommodation-price-search";
const STEP_FINAL: &str = "calculate_final_surge";
const SEASONALITY_SOURCE: &str = "internal_seasonality";

// ------------------------------------------------------------
// Payload shapes
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StayPeriod {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default)]
    pub nights: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub data_sources: Vec<String>,
    #[serde(default)]
    pub analysis_timestamp: DateTime<Utc>,
    /// Sources that failed or timed out and contributed nothing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowHint {
    pub next_step: String,
    pub next_step_description: String,
    pub required_for_final_step: Vec<String>,
    pub final_step: String,
}

/// Output of step 1, input of step 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisParameters {
    pub city: String,
    pub analysis_date: NaiveDate,
    pub stay_period: StayPeriod,
    #[serde(flatten)]
    pub signals: SurgeSignals,
    pub metadata: AnalysisMetadata,
    #[serde(rename = "_workflow_hint", default, skip_serializing_if = "Option::is_none")]
    pub workflow_hint: Option<WorkflowHint>,
}

/// Current market quote from the external price search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub average_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurgeAnalysis {
    pub baseline_price: f64,
    pub current_average_price: f64,
    pub absolute_increase: f64,
    pub surge_percentage: f64,
    pub surge_category: SurgeCategory,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub primary_driver: String,
    pub confidence_level: f64,
    pub is_surge_justified: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationMetadata {
    pub algorithm_version: String,
    pub calculation_mode: String,
    pub model_surge: f64,
    pub timestamp: DateTime<Utc>,
}

/// Output of step 2.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurgeReport {
    pub surge_analysis: SurgeAnalysis,
    pub contributing_factors: Vec<Factor>,
    pub factor_weights: CategoryWeights,
    pub insights: Insights,
    pub recommendations: Vec<Recommendation>,
    pub calculation_metadata: CalculationMetadata,
}

impl SurgeReport {
    pub fn from_result(
        r: SurgeResult,
        baseline: f64,
        current: f64,
        currency: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            surge_analysis: SurgeAnalysis {
                baseline_price: baseline,
                current_average_price: current,
                absolute_increase: current - baseline,
                surge_percentage: r.surge_percentage,
                surge_category: r.surge_category,
                currency,
            },
            contributing_factors: r.factors,
            factor_weights: r.factor_weights,
            insights: Insights {
                primary_driver: r.primary_driver,
                confidence_level: r.confidence_level,
                is_surge_justified: r.surge_justified,
                explanation: r.explanation,
            },
            recommendations: r.recommendations,
            calculation_metadata: CalculationMetadata {
                algorithm_version: ALGORITHM_VERSION.to_string(),
                calculation_mode: r.mode,
                model_surge: r.model_surge,
                timestamp,
            },
        }
    }
}

// ------------------------------------------------------------
// Tool errors
// ------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("Invalid analysis_parameters. Must call get_analysis_parameters first.")]
    Workflow,

    #[error("Missing market price data. Must provide average_price.")]
    MissingMarketData,

    #[error(transparent)]
    Surge(#[from] SurgeError),

    #[error("{0}")]
    Execution(String),
}

impl ToolError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Workflow => "WORKFLOW_ERROR",
            Self::MissingMarketData => "MISSING_MARKET_DATA",
            Self::Surge(e) => e.code(),
            Self::Execution(_) => "EXECUTION_ERROR",
        }
    }

    /// Structured error object returned by the JSON tools.
    pub fn to_json(&self) -> Value {
        let mut v = json!({
            "error": self.code(),
            "message": self.to_string(),
        });
        match self {
            Self::Workflow => {
                v["required_workflow"] = json!([
                    format!("1. {STEP_ANALYSIS}"),
                    format!("2. {STEP_PRICES}"),
                    format!("3. {STEP_FINAL} (this tool)"),
                ]);
            }
            Self::Surge(e) => {
                if let Some(field) = e.field() {
                    v["field"] = json!(field);
                }
            }
            _ => {}
        }
        v
    }
}

// ------------------------------------------------------------
// Payload validation
// ------------------------------------------------------------

const SEASONALITY_FIELDS: &[&str] = &[
    "season",
    "is_peak_season",
    "tourism_level",
    "typical_occupancy_rate",
];
const CALENDAR_FIELDS: &[&str] = &["is_weekend", "is_holiday", "is_long_weekend"];
const DEMAND_FIELDS: &[&str] = &[
    "major_events_count",
    "total_expected_visitors",
    "event_impact_score",
    "overall_demand_level",
];
const EVENT_FIELDS: &[&str] = &["name", "date", "impact_level"];
const HOLIDAY_FIELDS: &[&str] = &["name", "date"];

/// Present and not `null`.
fn has(v: &Value, key: &str) -> bool {
    v.get(key).is_some_and(|x| !x.is_null())
}

fn require_all(v: &Value, prefix: &str, keys: &[&str]) -> Result<(), SurgeError> {
    if !v.is_object() {
        return Err(SurgeError::missing(prefix));
    }
    for k in keys {
        if !has(v, k) {
            return Err(SurgeError::missing(format!("{prefix}.{k}")));
        }
    }
    Ok(())
}

fn require_each(v: &Value, prefix: &str, keys: &[&str]) -> Result<(), SurgeError> {
    let items = v.as_array().ok_or_else(|| SurgeError::missing(prefix))?;
    for (i, it) in items.iter().enumerate() {
        require_all(it, &format!("{prefix}[{i}]"), keys)?;
    }
    Ok(())
}

/// Check a step-1 payload, naming the first missing field, then deserialize.
pub fn parse_analysis_parameters(v: &Value) -> Result<AnalysisParameters, ToolError> {
    let has_sources = v
        .get("metadata")
        .is_some_and(|m| has(m, "data_sources"));
    if !has_sources {
        return Err(ToolError::Workflow);
    }

    for top in ["city", "analysis_date"] {
        if !has(v, top) {
            return Err(SurgeError::missing(top).into());
        }
    }
    let empty = Value::Null;
    require_all(
        v.get("stay_period").unwrap_or(&empty),
        "stay_period",
        &["check_in", "check_out"],
    )?;
    require_each(v.get("events").unwrap_or(&empty), "events", EVENT_FIELDS)?;
    require_all(
        v.get("seasonality").unwrap_or(&empty),
        "seasonality",
        SEASONALITY_FIELDS,
    )?;
    let calendar = v.get("calendar_factors").unwrap_or(&empty);
    require_all(calendar, "calendar_factors", CALENDAR_FIELDS)?;
    if let Some(hs) = calendar.get("holidays").filter(|h| !h.is_null()) {
        require_each(hs, "calendar_factors.holidays", HOLIDAY_FIELDS)?;
    }
    require_all(
        v.get("demand_indicators").unwrap_or(&empty),
        "demand_indicators",
        DEMAND_FIELDS,
    )?;

    serde_json::from_value(v.clone())
        .map_err(|e| ToolError::Execution(format!("malformed analysis_parameters: {e}")))
}

pub fn parse_market_data(v: &Value) -> Result<MarketData, ToolError> {
    if !has(v, "average_price") {
        return Err(ToolError::MissingMarketData);
    }
    serde_json::from_value(v.clone())
        .map_err(|_| SurgeError::missing("current_market_data.average_price").into())
}

// ------------------------------------------------------------
// Analyzer
// ------------------------------------------------------------

/// Wires providers, lookup tables and the engine into the two-step workflow.
/// Holds no mutable state; share it behind an `Arc` across tasks.
pub struct SurgeAnalyzer {
    event_providers: Vec<Box<dyn EventProvider>>,
    holiday_provider: Box<dyn HolidayProvider>,
    seasonality: SeasonalityTable,
    baseline: BaselinePriceTable,
    engine: SurgeEngine,
    fetch_timeout: Duration,
    default_radius_km: u32,
}

impl SurgeAnalyzer {
    pub fn new(
        event_providers: Vec<Box<dyn EventProvider>>,
        holiday_provider: Box<dyn HolidayProvider>,
    ) -> Self {
        Self {
            event_providers,
            holiday_provider,
            seasonality: SeasonalityTable::default_seed(),
            baseline: BaselinePriceTable::default_seed(),
            engine: SurgeEngine::new(),
            fetch_timeout: Duration::from_secs(10),
            default_radius_km: DEFAULT_RADIUS_KM,
        }
    }

    /// Build HTTP providers and lookup tables from configuration.
    pub fn from_config(cfg: &SurgeConfig) -> anyhow::Result<Self> {
        let events = TicketmasterProvider::from_url(
            cfg.ticketmaster_url.clone(),
            cfg.ticketmaster_api_key.clone(),
        )?;
        let holidays = NagerHolidayProvider::from_url(cfg.holiday_api_url.clone())?;

        let mut analyzer = Self::new(vec![Box::new(events)], Box::new(holidays))
            .fetch_timeout(cfg.fetch_timeout())
            .default_radius_km(cfg.default_radius_km);
        if let Some(p) = &cfg.seasonality_path {
            analyzer = analyzer.seasonality(SeasonalityTable::load_or_seed(p));
        }
        if let Some(p) = &cfg.baseline_path {
            analyzer = analyzer.baseline(BaselinePriceTable::load_or_seed(p));
        }
        if let Some(p) = &cfg.weights_path {
            let w = load_weights_file(p)
                .map_err(|e| anyhow::anyhow!("loading weights from {}: {e}", p.display()))?;
            analyzer = analyzer.engine(SurgeEngine::with_weights(w));
        }
        Ok(analyzer)
    }

    pub fn seasonality(mut self, table: SeasonalityTable) -> Self {
        self.seasonality = table;
        self
    }

    pub fn baseline(mut self, table: BaselinePriceTable) -> Self {
        self.baseline = table;
        self
    }

    pub fn engine(mut self, engine: SurgeEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn default_radius_km(mut self, km: u32) -> Self {
        self.default_radius_km = km;
        self
    }

    /// Step 1: gather and classify every signal for a stay.
    pub async fn get_analysis_parameters(
        &self,
        city: &str,
        country_code: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        radius_km: Option<u32>,
    ) -> Result<AnalysisParameters, SurgeError> {
        if city.trim().is_empty() {
            return Err(SurgeError::missing("city"));
        }
        if country_code.trim().is_empty() {
            return Err(SurgeError::missing("country_code"));
        }
        if check_out < check_in {
            return Err(SurgeError::invalid("check_out", REVERSED_STAY));
        }

        let query = EventQuery {
            city: city.trim().to_string(),
            country_code: country_code.trim().to_ascii_uppercase(),
            check_in,
            check_out,
            radius_km: radius_km.unwrap_or(self.default_radius_km),
        };

        let (events, holidays) = tokio::join!(
            gather_events(&self.event_providers, &query, self.fetch_timeout),
            gather_holidays(
                self.holiday_provider.as_ref(),
                &query.country_code,
                check_in,
                check_out,
                self.fetch_timeout,
            ),
        );

        let seasonality = self.seasonality.lookup(&query.city, check_in);
        let calendar = analyze_calendar(check_in, check_out, &holidays.items)?;
        let demand = calculate_demand(&events.items, &seasonality, &calendar);

        let mut data_sources: Vec<String> = self
            .event_providers
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        data_sources.push(self.holiday_provider.name().to_string());
        data_sources.push(SEASONALITY_SOURCE.to_string());

        let mut degraded_sources = events.degraded;
        degraded_sources.extend(holidays.degraded);

        tracing::info!(
            city = %query.city,
            events = events.items.len(),
            holidays = calendar.holidays.len(),
            demand = demand.demand_level().as_str(),
            degraded = degraded_sources.len(),
            "analysis parameters ready"
        );

        let now = Utc::now();
        Ok(AnalysisParameters {
            city: query.city.clone(),
            analysis_date: now.date_naive(),
            stay_period: StayPeriod {
                check_in,
                check_out,
                nights: (check_out - check_in).num_days(),
            },
            signals: SurgeSignals {
                events: events.items,
                seasonality,
                calendar,
                demand,
            },
            metadata: AnalysisMetadata {
                data_sources,
                analysis_timestamp: now,
                degraded_sources,
            },
            workflow_hint: Some(WorkflowHint {
                next_step: STEP_PRICES.to_string(),
                next_step_description: format!(
                    "Search for hotels in {} for the specified dates",
                    query.city
                ),
                required_for_final_step: vec![
                    "average_price from the price search results".to_string(),
                    "this analysis_parameters object".to_string(),
                ],
                final_step: STEP_FINAL.to_string(),
            }),
        })
    }

    /// Step 2: score the parameters against the current market price.
    /// Without an explicit baseline, one is estimated for the city and check-in.
    pub fn calculate_final_surge(
        &self,
        params: &AnalysisParameters,
        market: &MarketData,
        baseline_price: Option<f64>,
        mode: Option<&str>,
    ) -> Result<SurgeReport, SurgeError> {
        let baseline = baseline_price.unwrap_or_else(|| {
            self.baseline
                .estimate(&params.city, params.stay_period.check_in)
        });
        let mode = mode.unwrap_or(DEFAULT_MODE);

        let result = self
            .engine
            .calculate(&params.signals, market.average_price, baseline, mode)?;

        Ok(SurgeReport::from_result(
            result,
            baseline,
            market.average_price,
            market
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            Utc::now(),
        ))
    }

    /// JSON form of step 1. Dates are `YYYY-MM-DD`.
    pub async fn get_analysis_parameters_json(
        &self,
        city: &str,
        country_code: &str,
        check_in: &str,
        check_out: &str,
        radius_km: Option<u32>,
    ) -> Value {
        let run = self
            .analysis_parameters_value(city, country_code, check_in, check_out, radius_km)
            .await;
        match run {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "get_analysis_parameters failed");
                e.to_json()
            }
        }
    }

    async fn analysis_parameters_value(
        &self,
        city: &str,
        country_code: &str,
        check_in: &str,
        check_out: &str,
        radius_km: Option<u32>,
    ) -> Result<Value, ToolError> {
        let ci = parse_date(check_in, "check_in")?;
        let co = parse_date(check_out, "check_out")?;
        let params = self
            .get_analysis_parameters(city, country_code, ci, co, radius_km)
            .await?;
        serde_json::to_value(params).map_err(|e| ToolError::Execution(e.to_string()))
    }

    /// JSON form of step 2.
    pub fn calculate_final_surge_json(
        &self,
        analysis_parameters: &Value,
        current_market_data: &Value,
        baseline_price: Option<f64>,
        mode: Option<&str>,
    ) -> Value {
        let run = || -> Result<Value, ToolError> {
            let params = parse_analysis_parameters(analysis_parameters)?;
            let market = parse_market_data(current_market_data)?;
            let report = self.calculate_final_surge(&params, &market, baseline_price, mode)?;
            serde_json::to_value(report).map_err(|e| ToolError::Execution(e.to_string()))
        };
        match run() {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "calculate_final_surge failed");
                e.to_json()
            }
        }
    }
}

fn parse_date(s: &str, field: &str) -> Result<NaiveDate, ToolError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| ToolError::Execution(format!("invalid {field} '{s}': {e}")))
}
