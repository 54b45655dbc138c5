//! Period-over-period direction of headline measures across the window.

use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::facts::{Concept, PeriodFacts};
use crate::models::ratio;

/// Relative change within this band counts as stable.
const STABLE_BAND: Decimal = dec!(0.05);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub revenue_trend: TrendDirection,
    pub income_trend: TrendDirection,
    pub cash_flow_trend: TrendDirection,
    /// Direction of leverage (TotalLiabilities / TotalAssets).
    pub debt_trend: TrendDirection,
}

/// Compare the first and last values of a series.
pub fn direction(series: &[Decimal]) -> TrendDirection {
    let (Some(&first), Some(&last)) = (series.first(), series.last()) else {
        return TrendDirection::InsufficientData;
    };
    if series.len() < 2 {
        return TrendDirection::InsufficientData;
    }
    let change = if first.is_zero() {
        last.signum()
    } else {
        (last - first) / first.abs()
    };
    if change > STABLE_BAND {
        TrendDirection::Increasing
    } else if change < -STABLE_BAND {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

fn series<F>(periods: &[PeriodFacts], f: F) -> Vec<Decimal>
where
    F: Fn(&PeriodFacts) -> Option<Decimal>,
{
    periods.iter().filter_map(f).collect()
}

/// Summarize the trend of each headline measure over periods that report it.
pub fn summarize(periods: &[PeriodFacts]) -> TrendSummary {
    let concept = |c: Concept| series(periods, |pf| pf.get(c));
    TrendSummary {
        revenue_trend: direction(&concept(Concept::Revenue)),
        income_trend: direction(&concept(Concept::NetIncome)),
        cash_flow_trend: direction(&concept(Concept::CashFlowFromOperations)),
        debt_trend: direction(&series(periods, |pf| {
            ratio(pf.get(Concept::TotalLiabilities)?, pf.get(Concept::TotalAssets)?)
        })),
    }
}
