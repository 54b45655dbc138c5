//! Red flags derived from the five model outcomes.
//!
//! The rule set is fixed and deterministic: flags are emitted in model
//! order (Beneish, Altman, Piotroski, Benford, Fraud Triangle) followed by
//! the multi-model agreement flag. Descriptions are templated with the
//! model's value and the threshold it crossed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::CompositeConfig;
use crate::models::beneish::{
    LIKELY_ABOVE, MANIPULATOR_MEAN_AQI, MANIPULATOR_MEAN_DSRI, MANIPULATOR_MEAN_GMI,
    MANIPULATOR_MEAN_SGI, MANIPULATOR_MEAN_TATA, UNLIKELY_BELOW,
};
use crate::models::fraud_triangle::HIGH_FROM;
use crate::models::piotroski::MAX_SCORE;
use crate::models::{altman, ModelResults};
use crate::types::{ModelId, RiskLevel, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlagKind {
    ManipulationLikely,
    ManipulationGreyZone,
    BeneishComponent,
    FinancialDistress,
    DistressGreyZone,
    WeakFundamentals,
    LimitedEvaluability,
    DigitAnomaly,
    DigitDeviation,
    FraudTriangleRisk,
    FraudTriangleSide,
    MultiModelAgreement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedFlag {
    pub kind: RedFlagKind,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub models: Vec<ModelId>,
}

/// Evaluable Piotroski signals below this count earn an informational flag.
const MIN_EVALUABLE_SIGNALS: u8 = 6;

// ---------------------------------------------------------------------------
// Helper
// ---------------------------------------------------------------------------

fn add_flag(
    flags: &mut Vec<RedFlag>,
    kind: RedFlagKind,
    title: &str,
    description: String,
    severity: Severity,
    models: Vec<ModelId>,
) {
    flags.push(RedFlag {
        kind,
        title: title.into(),
        description,
        severity,
        models,
    });
}

// ---------------------------------------------------------------------------
// Per-model rules
// ---------------------------------------------------------------------------

fn beneish_flags(models: &ModelResults, flags: &mut Vec<RedFlag>) {
    let Some(s) = models.beneish.as_scored() else {
        return;
    };
    let d = &s.detail;
    match s.risk_level {
        RiskLevel::High | RiskLevel::Critical => add_flag(
            flags,
            RedFlagKind::ManipulationLikely,
            "Earnings manipulation likely",
            format!(
                "Beneish M-Score {} exceeds the {LIKELY_ABOVE} threshold for FY{}",
                d.m_score.round_dp(2),
                d.current_year
            ),
            Severity::High,
            vec![ModelId::Beneish],
        ),
        RiskLevel::Moderate | RiskLevel::Elevated => add_flag(
            flags,
            RedFlagKind::ManipulationGreyZone,
            "Beneish M-Score in grey zone",
            format!(
                "Beneish M-Score {} lies between {UNLIKELY_BELOW} and {LIKELY_ABOVE} for FY{}",
                d.m_score.round_dp(2),
                d.current_year
            ),
            Severity::Medium,
            vec![ModelId::Beneish],
        ),
        RiskLevel::Low => {}
    }

    let components: [(&str, &str, Decimal, Decimal); 5] = [
        ("DSRI", "Receivables growing faster than sales", d.dsri, MANIPULATOR_MEAN_DSRI),
        ("GMI", "Gross margin deteriorating", d.gmi, MANIPULATOR_MEAN_GMI),
        ("AQI", "Asset quality declining", d.aqi, MANIPULATOR_MEAN_AQI),
        ("SGI", "Sales growth unusually high", d.sgi, MANIPULATOR_MEAN_SGI),
        ("TATA", "Earnings driven by accruals", d.tata, MANIPULATOR_MEAN_TATA),
    ];
    for (name, title, value, mean) in components {
        if value > mean {
            add_flag(
                flags,
                RedFlagKind::BeneishComponent,
                title,
                format!(
                    "{name} of {} is above the manipulator-sample mean of {mean}",
                    value.round_dp(3)
                ),
                Severity::Medium,
                vec![ModelId::Beneish],
            );
        }
    }
}

fn altman_flags(models: &ModelResults, flags: &mut Vec<RedFlag>) {
    let Some(s) = models.altman.as_scored() else {
        return;
    };
    let d = &s.detail;
    match d.zone {
        altman::ZScoreZone::Distress => add_flag(
            flags,
            RedFlagKind::FinancialDistress,
            "Financial distress",
            format!(
                "Altman Z-Score {} is below the {} distress threshold for FY{}",
                d.z_score.round_dp(2),
                altman::Z_DISTRESS,
                d.fiscal_year
            ),
            Severity::High,
            vec![ModelId::Altman],
        ),
        altman::ZScoreZone::Grey => add_flag(
            flags,
            RedFlagKind::DistressGreyZone,
            "Altman Z-Score in grey zone",
            format!(
                "Altman Z-Score {} lies between {} and {} for FY{}",
                d.z_score.round_dp(2),
                altman::Z_DISTRESS,
                altman::Z_SAFE,
                d.fiscal_year
            ),
            Severity::Low,
            vec![ModelId::Altman],
        ),
        altman::ZScoreZone::Safe => {}
    }
}

fn piotroski_flags(models: &ModelResults, flags: &mut Vec<RedFlag>) {
    let Some(s) = models.piotroski.as_scored() else {
        return;
    };
    let d = &s.detail;
    if s.risk_level.is_high_or_worse() && d.weakness_conclusive() {
        add_flag(
            flags,
            RedFlagKind::WeakFundamentals,
            "Weak financial fundamentals",
            format!(
                "Piotroski F-Score {} of {MAX_SCORE} is at or below the weak threshold of 3 for FY{}",
                d.f_score, d.fiscal_year
            ),
            Severity::High,
            vec![ModelId::Piotroski],
        );
    }
    if d.evaluable < MIN_EVALUABLE_SIGNALS {
        add_flag(
            flags,
            RedFlagKind::LimitedEvaluability,
            "Piotroski score based on limited data",
            format!(
                "Only {} of {MAX_SCORE} signals could be evaluated; the F-Score of {} may understate strength",
                d.evaluable, d.f_score
            ),
            Severity::Info,
            vec![ModelId::Piotroski],
        );
    }
}

fn benford_flags(models: &ModelResults, flags: &mut Vec<RedFlag>) {
    let Some(s) = models.benford.as_scored() else {
        return;
    };
    let d = &s.detail;
    if d.suspicious {
        add_flag(
            flags,
            RedFlagKind::DigitAnomaly,
            "Leading-digit distribution anomaly",
            format!(
                "First-digit deviation of {} percentage points across {} values exceeds the anomaly threshold",
                d.total_deviation_pct.round_dp(2),
                d.sample_size
            ),
            Severity::High,
            vec![ModelId::Benford],
        );
    } else if s.risk_level == RiskLevel::Moderate {
        add_flag(
            flags,
            RedFlagKind::DigitDeviation,
            "Leading digits deviate from Benford's Law",
            format!(
                "First-digit deviation of {} percentage points across {} values is marginal",
                d.total_deviation_pct.round_dp(2),
                d.sample_size
            ),
            Severity::Low,
            vec![ModelId::Benford],
        );
    }
}

fn fraud_triangle_flags(models: &ModelResults, flags: &mut Vec<RedFlag>) {
    let Some(s) = models.fraud_triangle.as_scored() else {
        return;
    };
    let d = &s.detail;
    match s.risk_level {
        RiskLevel::High | RiskLevel::Critical => add_flag(
            flags,
            RedFlagKind::FraudTriangleRisk,
            "Fraud Triangle conditions present",
            format!(
                "Fraud Triangle risk of {} is at or above {HIGH_FROM} across {} of 3 dimensions",
                d.risk_score.round_dp(2),
                d.sub_scores_used
            ),
            Severity::High,
            vec![ModelId::FraudTriangle],
        ),
        RiskLevel::Moderate | RiskLevel::Elevated => add_flag(
            flags,
            RedFlagKind::FraudTriangleRisk,
            "Moderate Fraud Triangle risk",
            format!(
                "Fraud Triangle risk of {} is below {HIGH_FROM} but above the low band",
                d.risk_score.round_dp(2)
            ),
            Severity::Medium,
            vec![ModelId::FraudTriangle],
        ),
        RiskLevel::Low => {}
    }

    let sides = [
        ("Pressure", &d.pressure),
        ("Opportunity", &d.opportunity),
        ("Rationalization", &d.rationalization),
    ];
    for (name, side) in sides {
        if let Some(score) = side.score.filter(|v| *v >= HIGH_FROM) {
            add_flag(
                flags,
                RedFlagKind::FraudTriangleSide,
                &format!("Elevated {} signals", name.to_lowercase()),
                format!(
                    "{name} sub-score of {} is at or above {HIGH_FROM}",
                    score.round_dp(2)
                ),
                Severity::Medium,
                vec![ModelId::FraudTriangle],
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive every red flag for one set of model results.
pub fn generate_red_flags(models: &ModelResults, config: &CompositeConfig) -> Vec<RedFlag> {
    let mut flags = Vec::new();
    beneish_flags(models, &mut flags);
    altman_flags(models, &mut flags);
    piotroski_flags(models, &mut flags);
    benford_flags(models, &mut flags);
    fraud_triangle_flags(models, &mut flags);

    let high = models.high_risk_models();
    if high.len() >= config.corroboration_min_models {
        let names: Vec<&str> = high.iter().map(|m| m.display_name()).collect();
        add_flag(
            &mut flags,
            RedFlagKind::MultiModelAgreement,
            "Multiple models agree on high risk",
            format!(
                "{} of 5 models report HIGH or CRITICAL risk ({}); the agreement threshold is {}",
                high.len(),
                names.join(", "),
                config.corroboration_min_models
            ),
            Severity::Critical,
            high,
        );
    }
    flags
}

/// Whether the multi-model agreement rule fired.
pub fn has_corroboration(flags: &[RedFlag]) -> bool {
    flags
        .iter()
        .any(|f| f.kind == RedFlagKind::MultiModelAgreement)
}

// ===========================================================================
// Tests
// ===========================================================================
