//! Piotroski F-Score model for financial strength assessment.
//!
//! Implements the 9-signal binary scoring model from Joseph Piotroski (2000):
//!
//! **Profitability**:
//! 1. ROA > 0
//! 2. CFO > 0
//! 3. ROA improving
//! 4. Accruals quality (CFO > NI)
//!
//! **Leverage / Liquidity**:
//! 5. Leverage declining
//! 6. Current ratio improving
//! 7. No equity dilution
//!
//! **Operating Efficiency**:
//! 8. Gross margin improving
//! 9. Asset turnover improving
//!
//! A signal that cannot be evaluated counts as not passing, and the number
//! of evaluable signals is reported next to the score.
//!
//! Score 7-9 = Strong (LOW risk), 4-6 = Moderate, 0-3 = Weak (HIGH risk).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ratio, Comparison};
use crate::facts::quality::anomalies_for;
use crate::facts::{Concept, PeriodFacts};
use crate::types::{ModelResult, NativeScore, RiskLevel};

pub const MAX_SCORE: u8 = 9;

/// Individual signal results. `None` means the signal could not be evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiotroskiSignals {
    // Profitability signals
    pub roa_positive: Option<bool>,
    pub cfo_positive: Option<bool>,
    pub roa_improving: Option<bool>,
    pub accruals_quality: Option<bool>,

    // Leverage / Liquidity signals
    pub leverage_decreasing: Option<bool>,
    pub current_ratio_increasing: Option<bool>,
    pub no_equity_dilution: Option<bool>,

    // Operating efficiency signals
    pub gross_margin_increasing: Option<bool>,
    pub asset_turnover_increasing: Option<bool>,
}

impl PiotroskiSignals {
    fn all(&self) -> [Option<bool>; 9] {
        [
            self.roa_positive,
            self.cfo_positive,
            self.roa_improving,
            self.accruals_quality,
            self.leverage_decreasing,
            self.current_ratio_increasing,
            self.no_equity_dilution,
            self.gross_margin_increasing,
            self.asset_turnover_increasing,
        ]
    }

    pub fn passed(&self) -> u8 {
        self.all().iter().filter(|s| **s == Some(true)).count() as u8
    }

    pub fn evaluable(&self) -> u8 {
        self.all().iter().filter(|s| s.is_some()).count() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiotroskiDetail {
    pub signals: PiotroskiSignals,
    /// Total score (0-9).
    pub f_score: u8,
    /// Signals that had the data to be evaluated (0-9).
    pub evaluable: u8,
    pub strength: Strength,
    pub fiscal_year: i32,
}

impl PiotroskiDetail {
    /// True when the score stays Weak even if every unevaluated signal
    /// had passed.
    pub fn weakness_conclusive(&self) -> bool {
        let ceiling = self.f_score + MAX_SCORE.saturating_sub(self.evaluable);
        classify(ceiling).0 == Strength::Weak
    }

    /// Share of evaluated signals that failed, on [0, 1].
    pub fn evaluated_risk(&self) -> Option<Decimal> {
        if self.evaluable == 0 {
            return None;
        }
        let evaluable = Decimal::from(self.evaluable);
        Some((evaluable - Decimal::from(self.f_score)) / evaluable)
    }
}

pub fn classify(score: u8) -> (Strength, RiskLevel) {
    match score {
        7..=9 => (Strength::Strong, RiskLevel::Low),
        4..=6 => (Strength::Moderate, RiskLevel::Moderate),
        _ => (Strength::Weak, RiskLevel::High),
    }
}

// ---------------------------------------------------------------------------
// Per-period measures
// ---------------------------------------------------------------------------

fn roa(pf: &PeriodFacts) -> Option<Decimal> {
    ratio(pf.get(Concept::NetIncome)?, pf.get(Concept::TotalAssets)?)
}

/// Long-term debt to assets when reported in both periods, otherwise total
/// liabilities to assets.
fn leverage_pair(prior: &PeriodFacts, current: &PeriodFacts) -> Option<(Decimal, Decimal)> {
    let lev = |pf: &PeriodFacts, c: Concept| ratio(pf.get(c)?, pf.get(Concept::TotalAssets)?);
    match (lev(prior, Concept::LongTermDebt), lev(current, Concept::LongTermDebt)) {
        (Some(p), Some(c)) => Some((p, c)),
        _ => Some((
            lev(prior, Concept::TotalLiabilities)?,
            lev(current, Concept::TotalLiabilities)?,
        )),
    }
}

fn current_ratio(pf: &PeriodFacts) -> Option<Decimal> {
    ratio(
        pf.get(Concept::CurrentAssets)?,
        pf.get(Concept::CurrentLiabilities)?,
    )
}

fn gross_margin(pf: &PeriodFacts) -> Option<Decimal> {
    let revenue = pf.get(Concept::Revenue)?;
    ratio(revenue - pf.get(Concept::CostOfGoodsSold)?, revenue)
}

fn asset_turnover(pf: &PeriodFacts) -> Option<Decimal> {
    ratio(pf.get(Concept::Revenue)?, pf.get(Concept::TotalAssets)?)
}

fn improved(
    prior: &PeriodFacts,
    current: &PeriodFacts,
    measure: fn(&PeriodFacts) -> Option<Decimal>,
) -> Option<bool> {
    Some(measure(current)? > measure(prior)?)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the Piotroski F-Score (9 binary signals, score 0-9).
pub fn calculate_piotroski(periods: &[PeriodFacts]) -> ModelResult<PiotroskiDetail> {
    let comparison = Comparison::latest(periods);
    let Some(current) = comparison.current() else {
        return ModelResult::insufficient("No period available for the F-Score", vec![]);
    };

    let ni = current.get(Concept::NetIncome);
    let cfo = current.get(Concept::CashFlowFromOperations);

    let mut signals = PiotroskiSignals {
        roa_positive: roa(current).map(|r| r > Decimal::ZERO),
        cfo_positive: cfo.map(|c| c > Decimal::ZERO),
        accruals_quality: match (cfo, ni) {
            (Some(c), Some(n)) => Some(c > n),
            _ => None,
        },
        ..PiotroskiSignals::default()
    };

    if let Some((prior, current)) = comparison.pair() {
        signals.roa_improving = improved(prior, current, roa);
        signals.leverage_decreasing = leverage_pair(prior, current).map(|(p, c)| c < p);
        signals.current_ratio_increasing = improved(prior, current, current_ratio);
        signals.no_equity_dilution = match (
            prior.get(Concept::SharesOutstanding),
            current.get(Concept::SharesOutstanding),
        ) {
            (Some(p), Some(c)) => Some(c <= p),
            _ => None,
        };
        signals.gross_margin_increasing = improved(prior, current, gross_margin);
        signals.asset_turnover_increasing = improved(prior, current, asset_turnover);
    }

    let evaluable = signals.evaluable();
    if evaluable == 0 {
        return ModelResult::insufficient(
            "None of the nine F-Score signals could be evaluated",
            vec![],
        );
    }

    let f_score = signals.passed();
    let (strength, level) = classify(f_score);
    let mut warnings = anomalies_for(
        current,
        &[
            Concept::TotalAssets,
            Concept::Revenue,
            Concept::SharesOutstanding,
        ],
    );
    if evaluable < MAX_SCORE {
        warnings.push(format!(
            "Only {evaluable} of 9 signals could be evaluated; unevaluated signals count as failing."
        ));
    }
    debug!(fy = current.fiscal_year(), f_score, evaluable, "piotroski scored");

    ModelResult::scored(
        NativeScore::Ordinal {
            value: f_score,
            max: MAX_SCORE,
        },
        level,
        PiotroskiDetail {
            signals,
            f_score,
            evaluable,
            strength,
            fiscal_year: current.fiscal_year(),
        },
        warnings,
    )
}

// ===========================================================================
// Tests
// ===========================================================================
