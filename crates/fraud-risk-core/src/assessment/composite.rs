//! Composite risk aggregation across the five models.
//!
//! Each scored model is normalized onto a common [0, 1] risk scale:
//! - Piotroski is the share of evaluated signals that failed:
//!   (evaluable - F) / evaluable. Unevaluated signals add no risk.
//! - Fraud Triangle's probability is used directly.
//! - Beneish, Altman and Benford use their classification's ordinal weight
//!   (LOW 0, MODERATE 0.33, ELEVATED 0.5, HIGH 0.67, CRITICAL 1).
//!
//! The composite is 100 x the weighted mean over scored models only, plus a
//! fixed uplift when the multi-model agreement flag fired, capped at 100.
//! Models with insufficient data are excluded from both numerator and
//! denominator.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::red_flags::{has_corroboration, RedFlag};
use crate::config::CompositeConfig;
use crate::models::{clamp_unit, ModelResults};
use crate::types::{ModelId, NativeScore, RiskLevel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelContribution {
    pub model: ModelId,
    pub risk_level: RiskLevel,
    pub normalized_risk: Decimal,
    pub weight: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRisk {
    pub level: RiskLevel,
    /// 0-100, rounded to two decimal places.
    pub score: Decimal,
    pub models_used: Vec<ModelId>,
    pub low_confidence: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub qualifier: Option<String>,
    pub contributions: Vec<ModelContribution>,
    pub corroboration_uplift: Decimal,
    pub red_flag_count: usize,
}

/// Map a native score onto the common [0, 1] risk scale (1 = riskiest).
pub fn normalized_risk(score: &NativeScore, level: RiskLevel) -> Decimal {
    match *score {
        NativeScore::Ordinal { value, max } if max > 0 => {
            let max_d = Decimal::from(max);
            clamp_unit((max_d - Decimal::from(value)) / max_d)
        }
        NativeScore::Probability { value } => clamp_unit(value),
        _ => level.ordinal_weight(),
    }
}

/// Aggregate model results and flags into one composite. Pure: identical
/// inputs always give an identical composite.
pub fn aggregate(
    models: &ModelResults,
    flags: &[RedFlag],
    config: &CompositeConfig,
) -> CompositeRisk {
    let contributions: Vec<ModelContribution> = ModelId::ALL
        .iter()
        .filter_map(|m| {
            let (score, level) = models.outcome(*m)?;
            let normalized = match m {
                ModelId::Piotroski => models
                    .piotroski
                    .detail()
                    .and_then(|d| d.evaluated_risk())
                    .map(clamp_unit)
                    .unwrap_or_else(|| normalized_risk(&score, level)),
                _ => normalized_risk(&score, level),
            };
            Some(ModelContribution {
                model: *m,
                risk_level: level,
                normalized_risk: normalized,
                weight: config.weight(*m),
            })
        })
        .collect();

    let total_weight: Decimal = contributions.iter().map(|c| c.weight).sum();
    let models_used: Vec<ModelId> = contributions
        .iter()
        .filter(|c| c.weight > Decimal::ZERO)
        .map(|c| c.model)
        .collect();

    let base = if total_weight > Decimal::ZERO {
        let weighted: Decimal = contributions
            .iter()
            .map(|c| c.weight * c.normalized_risk)
            .sum();
        weighted / total_weight * dec!(100)
    } else {
        Decimal::ZERO
    };

    let corroboration_uplift = if has_corroboration(flags) {
        config.corroboration_uplift
    } else {
        Decimal::ZERO
    };
    let score = (base + corroboration_uplift).min(dec!(100)).round_dp(2);

    let low_confidence = models_used.len() < config.min_models_for_confidence;
    let qualifier = low_confidence.then(|| match models_used.len() {
        0 => "No model produced a score; the composite carries no information".to_string(),
        n => format!(
            "Based on {n} model(s); at least {} are needed for a confident composite",
            config.min_models_for_confidence
        ),
    });

    CompositeRisk {
        level: RiskLevel::from_composite_score(score),
        score,
        models_used,
        low_confidence,
        qualifier,
        contributions,
        corroboration_uplift,
        red_flag_count: flags.len(),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
