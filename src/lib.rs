// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod baseline;
pub mod calendar;
pub mod demand;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod seasonality;
pub mod signals;
pub mod surge;
pub mod weights;

// Two-step tool workflow (gather parameters, then score against market price)
pub mod workflow;

// ---- Re-exports for stable public API ----
pub use crate::engine::{SurgeEngine, SurgeSignals};
pub use crate::error::SurgeError;
pub use crate::ingest::config::{load_config_default, load_config_from, SurgeConfig};
pub use crate::surge::{SurgeCategory, SurgeResult};
pub use crate::weights::CategoryWeights;
pub use crate::workflow::{AnalysisParameters, MarketData, SurgeAnalyzer, SurgeReport, ToolError};
