//! Beneish M-Score model for detecting earnings manipulation.
//!
//! Implements the 8-variable model from Messod D. Beneish (1999):
//! DSRI, GMI, AQI, SGI, DEPI, SGAI, LVGI, TATA, comparing the most recent
//! period to the one before it.
//!
//! Banding: M < -2.22 unlikely (LOW), -2.22 <= M <= -1.78 grey zone
//! (MODERATE), M > -1.78 likely manipulator (HIGH).
//!
//! A missing concept never gets a neutral stand-in; the whole score becomes
//! insufficient data. All arithmetic uses `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{safe_div, Comparison, FactReader};
use crate::facts::quality::anomalies_for;
use crate::facts::{Concept, PeriodFacts};
use crate::types::{ModelResult, NativeScore, RiskLevel};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeneishZone {
    Unlikely,
    GreyZone,
    Likely,
}

/// Beneish M-Score with all 8 component ratios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneishDetail {
    pub dsri: Decimal,
    pub gmi: Decimal,
    pub aqi: Decimal,
    pub sgi: Decimal,
    pub depi: Decimal,
    pub sgai: Decimal,
    pub lvgi: Decimal,
    pub tata: Decimal,
    pub m_score: Decimal,
    pub zone: BeneishZone,
    pub current_year: i32,
    pub prior_year: i32,
}

// Coefficients
pub const INTERCEPT: Decimal = dec!(-4.84);
const C_DSRI: Decimal = dec!(0.920);
const C_GMI: Decimal = dec!(0.528);
const C_AQI: Decimal = dec!(0.404);
const C_SGI: Decimal = dec!(0.892);
const C_DEPI: Decimal = dec!(0.115);
const C_SGAI: Decimal = dec!(-0.172);
const C_TATA: Decimal = dec!(4.679);
const C_LVGI: Decimal = dec!(-0.327);

pub const UNLIKELY_BELOW: Decimal = dec!(-2.22);
pub const LIKELY_ABOVE: Decimal = dec!(-1.78);

/// M-Score of a company whose seven indices are all 1.0 and whose accruals
/// are zero: the intercept plus the index coefficients.
pub const NEUTRAL_BASELINE: Decimal = dec!(-2.480);

/// Mean index values of the manipulator sample in Beneish (1999). A component
/// above its mean is reported as a red flag in its own right.
pub const MANIPULATOR_MEAN_DSRI: Decimal = dec!(1.465);
pub const MANIPULATOR_MEAN_GMI: Decimal = dec!(1.193);
pub const MANIPULATOR_MEAN_AQI: Decimal = dec!(1.254);
pub const MANIPULATOR_MEAN_SGI: Decimal = dec!(1.607);
pub const MANIPULATOR_MEAN_TATA: Decimal = dec!(0.031);

const PERIOD_CONCEPTS: [Concept; 9] = [
    Concept::Revenue,
    Concept::CostOfGoodsSold,
    Concept::Receivables,
    Concept::TotalAssets,
    Concept::CurrentAssets,
    Concept::Ppe,
    Concept::Depreciation,
    Concept::Sga,
    Concept::TotalLiabilities,
];

fn classify(m: Decimal) -> (BeneishZone, RiskLevel) {
    if m < UNLIKELY_BELOW {
        (BeneishZone::Unlikely, RiskLevel::Low)
    } else if m <= LIKELY_ABOVE {
        (BeneishZone::GreyZone, RiskLevel::Moderate)
    } else {
        (BeneishZone::Likely, RiskLevel::High)
    }
}

/// The line items of one period that the indices are built from.
struct Inputs {
    revenue: Decimal,
    cogs: Decimal,
    receivables: Decimal,
    total_assets: Decimal,
    current_assets: Decimal,
    ppe: Decimal,
    depreciation: Decimal,
    sga: Decimal,
    total_liabilities: Decimal,
}

fn read_inputs(reader: &mut FactReader, pf: &PeriodFacts) -> Option<Inputs> {
    let values: Vec<Option<Decimal>> = PERIOD_CONCEPTS.iter().map(|c| reader.read(pf, *c)).collect();
    match values.as_slice() {
        [Some(revenue), Some(cogs), Some(receivables), Some(total_assets), Some(current_assets), Some(ppe), Some(depreciation), Some(sga), Some(total_liabilities)] => {
            Some(Inputs {
                revenue: *revenue,
                cogs: *cogs,
                receivables: *receivables,
                total_assets: *total_assets,
                current_assets: *current_assets,
                ppe: *ppe,
                depreciation: *depreciation,
                sga: *sga,
                total_liabilities: *total_liabilities,
            })
        }
        _ => None,
    }
}

fn compute_indices(
    cur: &Inputs,
    pri: &Inputs,
    net_income: Decimal,
    cfo: Decimal,
) -> Result<[Decimal; 8], String> {
    // DSRI
    let recv_rev_cur = safe_div(cur.receivables, cur.revenue, "DSRI current receivables/revenue")?;
    let recv_rev_pri = safe_div(pri.receivables, pri.revenue, "DSRI prior receivables/revenue")?;
    let dsri = safe_div(recv_rev_cur, recv_rev_pri, "DSRI")?;

    // GMI
    let prior_gm = safe_div(pri.revenue - pri.cogs, pri.revenue, "GMI prior margin")?;
    let current_gm = safe_div(cur.revenue - cur.cogs, cur.revenue, "GMI current margin")?;
    let gmi = safe_div(prior_gm, current_gm, "GMI")?;

    // AQI: share of assets that are neither current nor PP&E
    let aq_cur = Decimal::ONE
        - safe_div(cur.current_assets + cur.ppe, cur.total_assets, "AQI current")?;
    let aq_pri = Decimal::ONE
        - safe_div(pri.current_assets + pri.ppe, pri.total_assets, "AQI prior")?;
    let aqi = safe_div(aq_cur, aq_pri, "AQI")?;

    // SGI
    let sgi = safe_div(cur.revenue, pri.revenue, "SGI")?;

    // DEPI
    let pri_dep = safe_div(pri.depreciation, pri.ppe + pri.depreciation, "DEPI prior rate")?;
    let cur_dep = safe_div(cur.depreciation, cur.ppe + cur.depreciation, "DEPI current rate")?;
    let depi = safe_div(pri_dep, cur_dep, "DEPI")?;

    // SGAI
    let sga_cur = safe_div(cur.sga, cur.revenue, "SGAI current")?;
    let sga_pri = safe_div(pri.sga, pri.revenue, "SGAI prior")?;
    let sgai = safe_div(sga_cur, sga_pri, "SGAI")?;

    // LVGI
    let lev_cur = safe_div(cur.total_liabilities, cur.total_assets, "LVGI current")?;
    let lev_pri = safe_div(pri.total_liabilities, pri.total_assets, "LVGI prior")?;
    let lvgi = safe_div(lev_cur, lev_pri, "LVGI")?;

    // TATA
    let tata = safe_div(net_income - cfo, cur.total_assets, "TATA")?;

    Ok([dsri, gmi, aqi, sgi, depi, sgai, lvgi, tata])
}

/// M-Score from the eight indices in DSRI, GMI, AQI, SGI, DEPI, SGAI, LVGI,
/// TATA order.
pub fn m_score(indices: &[Decimal; 8]) -> Decimal {
    let [dsri, gmi, aqi, sgi, depi, sgai, lvgi, tata] = *indices;
    INTERCEPT
        + C_DSRI * dsri
        + C_GMI * gmi
        + C_AQI * aqi
        + C_SGI * sgi
        + C_DEPI * depi
        + C_SGAI * sgai
        + C_TATA * tata
        + C_LVGI * lvgi
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the Beneish M-Score from the two most recent periods.
pub fn calculate_beneish(periods: &[PeriodFacts]) -> ModelResult<BeneishDetail> {
    let (prior, current) = match Comparison::latest(periods) {
        Comparison::Pair { prior, current } => (prior, current),
        Comparison::Gap { prior, current } => {
            return ModelResult::insufficient(
                format!(
                    "{} does not directly follow {}; the M-Score needs consecutive periods",
                    current.period.label(),
                    prior.period.label()
                ),
                vec![],
            )
        }
        Comparison::Single(_) | Comparison::Empty => {
            return ModelResult::insufficient("The M-Score needs at least two periods", vec![])
        }
    };

    let mut reader = FactReader::new();
    let cur = read_inputs(&mut reader, current);
    let pri = read_inputs(&mut reader, prior);
    let net_income = reader.read(current, Concept::NetIncome);
    let cfo = reader.read(current, Concept::CashFlowFromOperations);

    let (Some(cur), Some(pri), Some(net_income), Some(cfo)) = (cur, pri, net_income, cfo) else {
        debug!(fy = current.fiscal_year(), "beneish: missing concepts");
        return ModelResult::insufficient(
            "Required concepts are missing for one or more of the eight indices",
            reader.into_missing(),
        );
    };
    debug_assert!(!reader.has_missing());

    let indices = match compute_indices(&cur, &pri, net_income, cfo) {
        Ok(indices) => indices,
        Err(reason) => return ModelResult::insufficient(reason, vec![]),
    };
    let m = m_score(&indices);
    let (zone, level) = classify(m);
    let [dsri, gmi, aqi, sgi, depi, sgai, lvgi, tata] = indices;

    let mut warnings = anomalies_for(current, &PERIOD_CONCEPTS);
    warnings.extend(anomalies_for(prior, &PERIOD_CONCEPTS));

    debug!(fy = current.fiscal_year(), m_score = %m, ?zone, "beneish scored");

    ModelResult::scored(
        NativeScore::Continuous { value: m },
        level,
        BeneishDetail {
            dsri,
            gmi,
            aqi,
            sgi,
            depi,
            sgai,
            lvgi,
            tata,
            m_score: m,
            zone,
            current_year: current.fiscal_year(),
            prior_year: prior.fiscal_year(),
        },
        warnings,
    )
}

// ===========================================================================
// Tests
// ===========================================================================
