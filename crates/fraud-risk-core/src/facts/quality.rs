//! Data-quality checks over selected periods.
//!
//! Upstream figures can be legitimately unusual, so nothing here rejects
//! input. Anomalies are reported alongside the scores they may distort.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::concept::Concept;
use super::store::PeriodFacts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQualityKind {
    NegativeValue,
    InconsistentTotals,
    PeriodGap,
    AmendmentApplied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityIssue {
    pub fiscal_year: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub concept: Option<Concept>,
    pub kind: DataQualityKind,
    pub message: String,
}

/// Concepts that cannot be negative on a sound balance sheet or income statement.
const NON_NEGATIVE: [Concept; 8] = [
    Concept::TotalAssets,
    Concept::CurrentAssets,
    Concept::Revenue,
    Concept::Receivables,
    Concept::Ppe,
    Concept::SharesOutstanding,
    Concept::TotalLiabilities,
    Concept::CurrentLiabilities,
];

/// Anomalies within a single period.
pub fn check_period(pf: &PeriodFacts) -> Vec<DataQualityIssue> {
    let fy = pf.fiscal_year();
    let mut issues = Vec::new();

    for concept in NON_NEGATIVE {
        if let Some(v) = pf.get(concept) {
            if v < Decimal::ZERO {
                issues.push(DataQualityIssue {
                    fiscal_year: fy,
                    concept: Some(concept),
                    kind: DataQualityKind::NegativeValue,
                    message: format!("{concept} is negative ({v}) in FY{fy}"),
                });
            }
        }
    }

    if let Some(ta) = pf.get(Concept::TotalAssets) {
        for part in [Concept::CurrentAssets, Concept::Receivables, Concept::Ppe] {
            if let Some(v) = pf.get(part) {
                if ta >= Decimal::ZERO && v > ta {
                    issues.push(DataQualityIssue {
                        fiscal_year: fy,
                        concept: Some(part),
                        kind: DataQualityKind::InconsistentTotals,
                        message: format!("{part} ({v}) exceeds TotalAssets ({ta}) in FY{fy}"),
                    });
                }
            }
        }
    }

    issues
}

/// Anomalies across an ordered window: per-period checks plus gaps between
/// adjacent periods.
pub fn check_window(periods: &[PeriodFacts]) -> Vec<DataQualityIssue> {
    let mut issues: Vec<DataQualityIssue> = periods.iter().flat_map(check_period).collect();
    for pair in periods.windows(2) {
        let (prior, current) = (&pair[0], &pair[1]);
        if !current.period.follows(&prior.period) {
            issues.push(DataQualityIssue {
                fiscal_year: current.fiscal_year(),
                concept: None,
                kind: DataQualityKind::PeriodGap,
                message: format!(
                    "{} does not directly follow {}; period-over-period ratios are disabled for this pair",
                    current.period.label(),
                    prior.period.label()
                ),
            });
        }
    }
    issues
}

/// Warnings for the concepts a calculator reads from one period.
pub(crate) fn anomalies_for(pf: &PeriodFacts, concepts: &[Concept]) -> Vec<String> {
    check_period(pf)
        .into_iter()
        .filter(|i| i.concept.is_some_and(|c| concepts.contains(&c)))
        .map(|i| i.message)
        .collect()
}
