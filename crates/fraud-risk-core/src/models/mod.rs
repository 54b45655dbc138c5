//! The five independent model calculators.
//!
//! Each calculator is a pure function of an immutable slice of periods
//! (most recent last) and returns a [`ModelResult`]; none of them fail.

pub mod altman;
pub mod beneish;
pub mod benford;
pub mod fraud_triangle;
pub mod piotroski;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::facts::{Concept, PeriodFacts};
use crate::types::{MissingFact, ModelId, ModelResult, NativeScore, RiskLevel};

pub use altman::AltmanDetail;
pub use beneish::BeneishDetail;
pub use benford::BenfordDetail;
pub use fraud_triangle::FraudTriangleDetail;
pub use piotroski::PiotroskiDetail;

/// All five model outcomes for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResults {
    pub beneish: ModelResult<BeneishDetail>,
    pub altman: ModelResult<AltmanDetail>,
    pub piotroski: ModelResult<PiotroskiDetail>,
    pub fraud_triangle: ModelResult<FraudTriangleDetail>,
    pub benford: ModelResult<BenfordDetail>,
}

impl ModelResults {
    /// Native score and classification of one model, if it was scored.
    pub fn outcome(&self, model: ModelId) -> Option<(NativeScore, RiskLevel)> {
        fn pick<T>(r: &ModelResult<T>) -> Option<(NativeScore, RiskLevel)> {
            r.as_scored().map(|s| (s.score, s.risk_level))
        }
        match model {
            ModelId::Beneish => pick(&self.beneish),
            ModelId::Altman => pick(&self.altman),
            ModelId::Piotroski => pick(&self.piotroski),
            ModelId::Benford => pick(&self.benford),
            ModelId::FraudTriangle => pick(&self.fraud_triangle),
        }
    }

    pub fn scored_count(&self) -> usize {
        ModelId::ALL
            .iter()
            .filter(|m| self.outcome(**m).is_some())
            .count()
    }

    /// Models whose classification is HIGH or CRITICAL. A Weak Piotroski
    /// score only counts when its unevaluated signals could not have lifted
    /// it out of the Weak band.
    pub fn high_risk_models(&self) -> Vec<ModelId> {
        ModelId::ALL
            .iter()
            .copied()
            .filter(|m| {
                let high = self
                    .outcome(*m)
                    .is_some_and(|(_, level)| level.is_high_or_worse());
                high && (*m != ModelId::Piotroski
                    || self
                        .piotroski
                        .detail()
                        .is_some_and(PiotroskiDetail::weakness_conclusive))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Reads facts while recording every concept a period failed to report.
#[derive(Debug, Default)]
pub(crate) struct FactReader {
    missing: Vec<MissingFact>,
}

impl FactReader {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read(&mut self, pf: &PeriodFacts, concept: Concept) -> Option<Decimal> {
        let value = pf.get(concept);
        if value.is_none() {
            self.missing.push(MissingFact {
                concept,
                fiscal_year: pf.fiscal_year(),
            });
        }
        value
    }

    pub(crate) fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }

    pub(crate) fn into_missing(mut self) -> Vec<MissingFact> {
        self.missing.sort();
        self.missing.dedup();
        self.missing
    }
}

/// Division that reports an undefined ratio instead of failing.
pub(crate) fn safe_div(num: Decimal, den: Decimal, ctx: &str) -> Result<Decimal, String> {
    if den == Decimal::ZERO {
        return Err(format!("{ctx} is undefined (zero denominator)"));
    }
    Ok(num / den)
}

/// Division for optional indicators: `None` when undefined.
pub(crate) fn ratio(num: Decimal, den: Decimal) -> Option<Decimal> {
    if den == Decimal::ZERO {
        None
    } else {
        Some(num / den)
    }
}

pub(crate) fn clamp_unit(x: Decimal) -> Decimal {
    x.max(Decimal::ZERO).min(Decimal::ONE)
}

/// The most recent period and, when one exists, the one before it.
#[derive(Clone, Copy)]
pub(crate) enum Comparison<'a> {
    Empty,
    Single(&'a PeriodFacts),
    /// Adjacent periods; period-over-period ratios are meaningful.
    Pair {
        prior: &'a PeriodFacts,
        current: &'a PeriodFacts,
    },
    /// Two periods separated by a gap; ratios between them are disabled.
    Gap {
        prior: &'a PeriodFacts,
        current: &'a PeriodFacts,
    },
}

impl<'a> Comparison<'a> {
    pub(crate) fn latest(periods: &'a [PeriodFacts]) -> Self {
        match periods {
            [] => Comparison::Empty,
            [only] => Comparison::Single(only),
            [.., prior, current] if current.period.follows(&prior.period) => {
                Comparison::Pair { prior, current }
            }
            [.., prior, current] => Comparison::Gap { prior, current },
        }
    }

    pub(crate) fn current(&self) -> Option<&'a PeriodFacts> {
        match *self {
            Comparison::Empty => None,
            Comparison::Single(c) => Some(c),
            Comparison::Pair { current, .. } | Comparison::Gap { current, .. } => Some(current),
        }
    }

    /// Both periods, only when they are directly comparable.
    pub(crate) fn pair(&self) -> Option<(&'a PeriodFacts, &'a PeriodFacts)> {
        match *self {
            Comparison::Pair { prior, current } => Some((prior, current)),
            _ => None,
        }
    }
}
