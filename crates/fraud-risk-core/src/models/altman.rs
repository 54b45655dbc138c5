//! Altman Z-Score (original public-company model) for distress prediction.
//!
//! Z = 1.2*X1 + 1.4*X2 + 3.3*X3 + 0.6*X4 + 1.0*X5 over the most recent
//! period only, so it degrades independently of the two-period models.
//! Zones: Z > 2.99 Safe, 1.81 <= Z <= 2.99 Grey, Z < 1.81 Distress.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{safe_div, Comparison, FactReader};
use crate::facts::quality::anomalies_for;
use crate::facts::{Concept, PeriodFacts};
use crate::types::{ModelResult, NativeScore, RiskLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZScoreZone {
    Safe,
    Grey,
    Distress,
}

impl std::fmt::Display for ZScoreZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Grey => write!(f, "Grey Zone"),
            Self::Distress => write!(f, "Distress"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZScoreComponent {
    pub name: String,
    pub ratio: Decimal,
    pub coefficient: Decimal,
    pub weighted_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltmanDetail {
    pub z_score: Decimal,
    pub zone: ZScoreZone,
    pub components: Vec<ZScoreComponent>,
    /// (distress_upper_bound, safe_lower_bound)
    pub zone_thresholds: (Decimal, Decimal),
    pub fiscal_year: i32,
    /// X4 used book equity because market value was not reported.
    pub book_equity_fallback: bool,
}

// Original Z-Score (public manufacturing)
const Z_COEFF_X1: Decimal = dec!(1.2);
const Z_COEFF_X2: Decimal = dec!(1.4);
const Z_COEFF_X3: Decimal = dec!(3.3);
const Z_COEFF_X4: Decimal = dec!(0.6);
const Z_COEFF_X5: Decimal = dec!(1.0);

pub const Z_SAFE: Decimal = dec!(2.99);
pub const Z_DISTRESS: Decimal = dec!(1.81);

/// Both grey-zone boundaries are inclusive.
pub fn classify_zone(score: Decimal) -> (ZScoreZone, RiskLevel) {
    if score > Z_SAFE {
        (ZScoreZone::Safe, RiskLevel::Low)
    } else if score >= Z_DISTRESS {
        (ZScoreZone::Grey, RiskLevel::Moderate)
    } else {
        (ZScoreZone::Distress, RiskLevel::High)
    }
}

fn build_component(name: &str, ratio: Decimal, coefficient: Decimal) -> ZScoreComponent {
    ZScoreComponent {
        name: name.to_string(),
        ratio,
        coefficient,
        weighted_value: ratio * coefficient,
    }
}

/// Current-period amounts behind X1..X5.
struct ZInputs {
    working_capital: Decimal,
    retained_earnings: Decimal,
    ebit: Decimal,
    equity: Decimal,
    total_liabilities: Decimal,
    sales: Decimal,
    total_assets: Decimal,
}

impl ZInputs {
    fn ratios(&self) -> Result<[Decimal; 5], String> {
        let ta = self.total_assets;
        Ok([
            safe_div(self.working_capital, ta, "X1: Working Capital / Total Assets")?,
            safe_div(self.retained_earnings, ta, "X2: Retained Earnings / Total Assets")?,
            safe_div(self.ebit, ta, "X3: EBIT / Total Assets")?,
            safe_div(
                self.equity,
                self.total_liabilities,
                "X4: Market Value of Equity / Total Liabilities",
            )?,
            safe_div(self.sales, ta, "X5: Revenue / Total Assets")?,
        ])
    }
}

const USED_CONCEPTS: [Concept; 8] = [
    Concept::CurrentAssets,
    Concept::CurrentLiabilities,
    Concept::TotalAssets,
    Concept::RetainedEarnings,
    Concept::Ebit,
    Concept::TotalLiabilities,
    Concept::Revenue,
    Concept::MarketValueOfEquity,
];

/// Compute the Altman Z-Score for the most recent period.
///
/// With `book_equity_fallback`, a missing market value of equity is replaced
/// by stockholders' equity and the substitution is recorded as a warning.
pub fn calculate_altman(
    periods: &[PeriodFacts],
    book_equity_fallback: bool,
) -> ModelResult<AltmanDetail> {
    let Some(current) = Comparison::latest(periods).current() else {
        return ModelResult::insufficient("No period available for the Z-Score", vec![]);
    };

    let mut reader = FactReader::new();
    let ca = reader.read(current, Concept::CurrentAssets);
    let cl = reader.read(current, Concept::CurrentLiabilities);
    let ta = reader.read(current, Concept::TotalAssets);
    let re = reader.read(current, Concept::RetainedEarnings);
    let ebit = reader.read(current, Concept::Ebit);
    let tl = reader.read(current, Concept::TotalLiabilities);
    let sales = reader.read(current, Concept::Revenue);

    let mut warnings = Vec::new();
    let mut used_fallback = false;
    let equity = match current.get(Concept::MarketValueOfEquity) {
        Some(mve) => Some(mve),
        None if book_equity_fallback => {
            // still reported as missing if book equity is absent too
            reader.read(current, Concept::MarketValueOfEquity);
            let book = reader.read(current, Concept::StockholdersEquity);
            if book.is_some() {
                used_fallback = true;
                warnings.push(
                    "MarketValueOfEquity not reported; X4 uses book equity (StockholdersEquity)."
                        .to_string(),
                );
            }
            book
        }
        None => reader.read(current, Concept::MarketValueOfEquity),
    };

    let (Some(ca), Some(cl), Some(ta), Some(re), Some(ebit), Some(tl), Some(sales), Some(equity)) =
        (ca, cl, ta, re, ebit, tl, sales, equity)
    else {
        debug!(fy = current.fiscal_year(), "altman: missing concepts");
        return ModelResult::insufficient(
            "Required concepts are missing for the Z-Score ratios",
            reader.into_missing(),
        );
    };

    let inputs = ZInputs {
        working_capital: ca - cl,
        retained_earnings: re,
        ebit,
        equity,
        total_liabilities: tl,
        sales,
        total_assets: ta,
    };
    let [x1, x2, x3, x4, x5] = match inputs.ratios() {
        Ok(r) => r,
        Err(reason) => return ModelResult::insufficient(reason, vec![]),
    };

    let components = vec![
        build_component("X1: Working Capital / Total Assets", x1, Z_COEFF_X1),
        build_component("X2: Retained Earnings / Total Assets", x2, Z_COEFF_X2),
        build_component("X3: EBIT / Total Assets", x3, Z_COEFF_X3),
        build_component("X4: Market Value of Equity / Total Liabilities", x4, Z_COEFF_X4),
        build_component("X5: Revenue / Total Assets", x5, Z_COEFF_X5),
    ];
    let z = components.iter().map(|c| c.weighted_value).sum::<Decimal>();
    let (zone, level) = classify_zone(z);

    warnings.extend(anomalies_for(current, &USED_CONCEPTS));
    debug!(fy = current.fiscal_year(), z_score = %z, %zone, "altman scored");

    ModelResult::scored(
        NativeScore::Continuous { value: z },
        level,
        AltmanDetail {
            z_score: z,
            zone,
            components,
            zone_thresholds: (Z_DISTRESS, Z_SAFE),
            fiscal_year: current.fiscal_year(),
            book_equity_fallback: used_fallback,
        },
        warnings,
    )
}

// ===========================================================================
// Tests
// ===========================================================================
