//! Composite fraud-risk scoring over a company's multi-year financial facts.
//!
//! Five independent models (Beneish M-Score, Altman Z-Score, Piotroski
//! F-Score, Benford's Law and Fraud Triangle proxies) are evaluated over a
//! window of fiscal periods, explained by red flags and aggregated into one
//! composite risk level. All arithmetic uses `rust_decimal::Decimal`.

pub mod assessment;
pub mod config;
pub mod engine;
pub mod error;
pub mod facts;
pub mod models;
pub mod report;
pub mod types;

pub use config::{AnalysisParams, EngineConfig};
pub use engine::{CancellationToken, FraudRiskEngine};
pub use error::FraudRiskError;
pub use report::AnalysisReport;
pub use types::*;

/// Standard result type for all fraud-risk operations
pub type FraudRiskResult<T> = Result<T, FraudRiskError>;
