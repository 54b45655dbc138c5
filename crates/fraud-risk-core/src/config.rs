//! Engine configuration and per-request analysis parameters.
//!
//! Every tunable is a documented default that can be overridden from JSON.
//! Validation happens before any calculator runs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FraudRiskError;
use crate::types::ModelId;
use crate::FraudRiskResult;

// ---------------------------------------------------------------------------
// Request parameters
// ---------------------------------------------------------------------------

/// Controls how many trailing periods an analysis considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisParams {
    pub window_years: u8,
    #[serde(default)]
    pub include_amendments: bool,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams {
            window_years: 5,
            include_amendments: false,
        }
    }
}

impl AnalysisParams {
    pub fn validate(&self) -> FraudRiskResult<()> {
        if !(1..=10).contains(&self.window_years) {
            return Err(FraudRiskError::invalid(
                "window_years",
                format!("Must be between 1 and 10, got {}.", self.window_years),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenfordConfig {
    /// Below this many leading digits the result is insufficient data.
    pub min_sample: usize,
    /// Total absolute deviation (percentage points) below which the
    /// distribution is considered normal.
    pub low_deviation_pct: Decimal,
    /// Total absolute deviation above which the distribution is an anomaly.
    pub high_deviation_pct: Decimal,
    /// Significance level for the companion chi-squared conformity test.
    pub significance_level: Decimal,
}

impl Default for BenfordConfig {
    fn default() -> Self {
        BenfordConfig {
            min_sample: 30,
            low_deviation_pct: dec!(25),
            high_deviation_pct: dec!(45),
            significance_level: dec!(0.05),
        }
    }
}

/// Relative weights of the three Fraud Triangle sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudTriangleConfig {
    pub pressure_weight: Decimal,
    pub opportunity_weight: Decimal,
    pub rationalization_weight: Decimal,
}

impl Default for FraudTriangleConfig {
    fn default() -> Self {
        FraudTriangleConfig {
            pressure_weight: Decimal::ONE,
            opportunity_weight: Decimal::ONE,
            rationalization_weight: Decimal::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    pub beneish_weight: Decimal,
    pub altman_weight: Decimal,
    pub piotroski_weight: Decimal,
    pub benford_weight: Decimal,
    pub fraud_triangle_weight: Decimal,
    /// Models at HIGH or worse needed to emit the multi-model agreement flag.
    pub corroboration_min_models: usize,
    /// Points added to the composite score when that flag is present.
    pub corroboration_uplift: Decimal,
    /// Fewer scored models than this marks the composite low-confidence.
    pub min_models_for_confidence: usize,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        CompositeConfig {
            beneish_weight: Decimal::ONE,
            altman_weight: Decimal::ONE,
            piotroski_weight: Decimal::ONE,
            benford_weight: Decimal::ONE,
            fraud_triangle_weight: Decimal::ONE,
            corroboration_min_models: 3,
            corroboration_uplift: dec!(10),
            min_models_for_confidence: 2,
        }
    }
}

impl CompositeConfig {
    pub fn weight(&self, model: ModelId) -> Decimal {
        match model {
            ModelId::Beneish => self.beneish_weight,
            ModelId::Altman => self.altman_weight,
            ModelId::Piotroski => self.piotroski_weight,
            ModelId::Benford => self.benford_weight,
            ModelId::FraudTriangle => self.fraud_triangle_weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub benford: BenfordConfig,
    pub fraud_triangle: FraudTriangleConfig,
    pub composite: CompositeConfig,
    /// Substitute book equity for market value of equity in Altman X4 when
    /// the latter is not reported.
    pub altman_book_equity_fallback: bool,
    /// Evaluate the five calculators concurrently.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            benford: BenfordConfig::default(),
            fraud_triangle: FraudTriangleConfig::default(),
            composite: CompositeConfig::default(),
            altman_book_equity_fallback: false,
            parallel: true,
        }
    }
}

fn validate_weights(field: &str, weights: &[Decimal]) -> FraudRiskResult<()> {
    if weights.iter().any(|w| *w < Decimal::ZERO) {
        return Err(FraudRiskError::invalid(field, "Weights must be non-negative."));
    }
    if weights.iter().copied().sum::<Decimal>() <= Decimal::ZERO {
        return Err(FraudRiskError::invalid(field, "Sum of weights must be positive."));
    }
    Ok(())
}

impl EngineConfig {
    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(json: &str) -> FraudRiskResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FraudRiskResult<()> {
        let b = &self.benford;
        if b.min_sample == 0 {
            return Err(FraudRiskError::invalid("benford.min_sample", "Must be at least 1."));
        }
        if b.low_deviation_pct < Decimal::ZERO || b.low_deviation_pct >= b.high_deviation_pct {
            return Err(FraudRiskError::invalid(
                "benford.low_deviation_pct",
                "Must be non-negative and below high_deviation_pct.",
            ));
        }
        if b.significance_level <= Decimal::ZERO || b.significance_level >= Decimal::ONE {
            return Err(FraudRiskError::invalid(
                "benford.significance_level",
                "Must be between 0 and 1 exclusive.",
            ));
        }

        let t = &self.fraud_triangle;
        validate_weights(
            "fraud_triangle",
            &[t.pressure_weight, t.opportunity_weight, t.rationalization_weight],
        )?;

        let c = &self.composite;
        let model_weights: Vec<Decimal> = ModelId::ALL.iter().map(|m| c.weight(*m)).collect();
        validate_weights("composite", &model_weights)?;
        if c.corroboration_min_models == 0 || c.corroboration_min_models > ModelId::ALL.len() {
            return Err(FraudRiskError::invalid(
                "composite.corroboration_min_models",
                "Must be between 1 and 5.",
            ));
        }
        if c.corroboration_uplift < Decimal::ZERO || c.corroboration_uplift > dec!(100) {
            return Err(FraudRiskError::invalid(
                "composite.corroboration_uplift",
                "Must be in [0, 100].",
            ));
        }
        Ok(())
    }
}
