//! Fraud Triangle (Cressey) risk proxies: Pressure, Opportunity and
//! Rationalization, each scored in [0, 1] from financial-statement proxies.
//!
//! Every indicator maps a raw measure onto [0, 1] with a linear ramp and is
//! clamped. A side's score is the mean of the indicators that could be
//! computed; a side with no computable indicator is excluded from the
//! weighted mean rather than defaulted. Bands: < 0.3 LOW, < 0.6 MODERATE,
//! otherwise HIGH.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{clamp_unit, ratio, Comparison, FactReader};
use crate::config::FraudTriangleConfig;
use crate::facts::quality::anomalies_for;
use crate::facts::{Concept, PeriodFacts};
use crate::types::{ModelResult, NativeScore, RiskLevel};

// Ramp scales: the raw change that maps to a full indicator score of 1.
const MARGIN_DECLINE_SCALE: Decimal = dec!(0.10);
const LEVERAGE_FLOOR: Decimal = dec!(0.5);
const LEVERAGE_SPAN: Decimal = dec!(0.4);
const LEVERAGE_INCREASE_SCALE: Decimal = dec!(0.10);
const ASSET_GROWTH_FLOOR: Decimal = dec!(1.2);
const ASSET_GROWTH_SPAN: Decimal = dec!(0.8);
const RECEIVABLES_GAP_SCALE: Decimal = dec!(0.5);
const ACCRUAL_SCALE: Decimal = dec!(0.10);

pub const MODERATE_FROM: Decimal = dec!(0.3);
pub const HIGH_FROM: Decimal = dec!(0.6);

const USED_CONCEPTS: [Concept; 7] = [
    Concept::Revenue,
    Concept::CostOfGoodsSold,
    Concept::NetIncome,
    Concept::TotalAssets,
    Concept::TotalLiabilities,
    Concept::CashFlowFromOperations,
    Concept::Receivables,
];

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangleIndicator {
    pub name: String,
    /// The underlying measure before scaling.
    pub raw: Decimal,
    pub score: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleSide {
    /// Mean of the indicator scores; `None` when no indicator was computable.
    pub score: Option<Decimal>,
    pub indicators: Vec<TriangleIndicator>,
}

impl TriangleSide {
    fn from_indicators(indicators: Vec<TriangleIndicator>) -> Self {
        let score = if indicators.is_empty() {
            None
        } else {
            let sum: Decimal = indicators.iter().map(|i| i.score).sum();
            Some(sum / Decimal::from(indicators.len() as u64))
        };
        TriangleSide { score, indicators }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudTriangleDetail {
    pub pressure: TriangleSide,
    pub opportunity: TriangleSide,
    pub rationalization: TriangleSide,
    pub risk_score: Decimal,
    /// How many of the three sides contributed to `risk_score`.
    pub sub_scores_used: u8,
    pub fiscal_year: i32,
}

pub fn classify(risk: Decimal) -> RiskLevel {
    if risk < MODERATE_FROM {
        RiskLevel::Low
    } else if risk < HIGH_FROM {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

// ---------------------------------------------------------------------------
// Period snapshot
// ---------------------------------------------------------------------------

struct Snapshot {
    revenue: Option<Decimal>,
    cogs: Option<Decimal>,
    net_income: Option<Decimal>,
    total_assets: Option<Decimal>,
    total_liabilities: Option<Decimal>,
    cfo: Option<Decimal>,
    receivables: Option<Decimal>,
}

impl Snapshot {
    fn read(reader: &mut FactReader, pf: &PeriodFacts) -> Self {
        Snapshot {
            revenue: reader.read(pf, Concept::Revenue),
            cogs: reader.read(pf, Concept::CostOfGoodsSold),
            net_income: reader.read(pf, Concept::NetIncome),
            total_assets: reader.read(pf, Concept::TotalAssets),
            total_liabilities: reader.read(pf, Concept::TotalLiabilities),
            cfo: reader.read(pf, Concept::CashFlowFromOperations),
            receivables: reader.read(pf, Concept::Receivables),
        }
    }

    fn gross_margin(&self) -> Option<Decimal> {
        ratio(self.revenue? - self.cogs?, self.revenue?)
    }

    fn leverage(&self) -> Option<Decimal> {
        ratio(self.total_liabilities?, self.total_assets?)
    }
}

fn indicator(name: &str, raw: Decimal, score: Decimal) -> TriangleIndicator {
    TriangleIndicator {
        name: name.to_string(),
        raw,
        score: clamp_unit(score),
    }
}

fn flag_indicator(name: &str, present: Option<bool>) -> Option<TriangleIndicator> {
    present.map(|hit| {
        let v = if hit { Decimal::ONE } else { Decimal::ZERO };
        indicator(name, v, v)
    })
}

fn growth(current: Option<Decimal>, prior: Option<Decimal>) -> Option<Decimal> {
    ratio(current?, prior?)
}

// ---------------------------------------------------------------------------
// Sides
// ---------------------------------------------------------------------------

fn pressure(cur: &Snapshot, prior: Option<&Snapshot>) -> Vec<TriangleIndicator> {
    let mut out = Vec::new();
    if let Some(p) = prior {
        if let (Some(gm_p), Some(gm_c)) = (p.gross_margin(), cur.gross_margin()) {
            let decline = gm_p - gm_c;
            out.push(indicator(
                "gross_margin_decline",
                decline,
                decline / MARGIN_DECLINE_SCALE,
            ));
        }
        if let (Some(lev_p), Some(lev_c)) = (p.leverage(), cur.leverage()) {
            let delta = lev_c - lev_p;
            out.push(indicator(
                "leverage_increase",
                delta,
                delta / LEVERAGE_INCREASE_SCALE,
            ));
        }
    }
    if let Some(lev) = cur.leverage() {
        out.push(indicator(
            "leverage_level",
            lev,
            (lev - LEVERAGE_FLOOR) / LEVERAGE_SPAN,
        ));
    }
    if let Some(cfo) = cur.cfo {
        let shortfall = if cfo < Decimal::ZERO {
            Decimal::ONE
        } else {
            Decimal::ZERO
        };
        out.push(indicator("operating_cash_shortfall", cfo, shortfall));
    }
    out
}

fn opportunity(
    cur: &Snapshot,
    prior: Option<&Snapshot>,
    auditor_change: Option<bool>,
) -> Vec<TriangleIndicator> {
    let mut out = Vec::new();
    if let Some(p) = prior {
        if let Some(g) = growth(cur.total_assets, p.total_assets) {
            out.push(indicator(
                "asset_growth",
                g,
                (g - ASSET_GROWTH_FLOOR) / ASSET_GROWTH_SPAN,
            ));
        }
        if let (Some(recv_g), Some(rev_g)) = (
            growth(cur.receivables, p.receivables),
            growth(cur.revenue, p.revenue),
        ) {
            let gap = recv_g - rev_g;
            out.push(indicator(
                "receivables_outpacing_revenue",
                gap,
                gap / RECEIVABLES_GAP_SCALE,
            ));
        }
    }
    out.extend(flag_indicator("auditor_change", auditor_change));
    out
}

fn rationalization(cur: &Snapshot, restatement: Option<bool>) -> Vec<TriangleIndicator> {
    let mut out = Vec::new();
    if let (Some(ni), Some(cfo), Some(ta)) = (cur.net_income, cur.cfo, cur.total_assets) {
        if let Some(accruals) = ratio(ni - cfo, ta) {
            out.push(indicator("accrual_ratio", accruals, accruals / ACCRUAL_SCALE));
        }
    }
    if let (Some(ni), Some(cfo)) = (cur.net_income, cur.cfo) {
        // Only meaningful for profitable periods.
        if ni > Decimal::ZERO {
            let conversion = cfo / ni;
            out.push(indicator(
                "cash_conversion_gap",
                conversion,
                Decimal::ONE - conversion,
            ));
        }
    }
    out.extend(flag_indicator("restatement", restatement));
    out
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Score the Fraud Triangle for the most recent period, using the prior
/// period for trend proxies when the two are adjacent.
pub fn calculate_fraud_triangle(
    periods: &[PeriodFacts],
    config: &FraudTriangleConfig,
) -> ModelResult<FraudTriangleDetail> {
    let comparison = Comparison::latest(periods);
    let Some(current) = comparison.current() else {
        return ModelResult::insufficient("No period available for the Fraud Triangle", vec![]);
    };

    let mut reader = FactReader::new();
    let cur = Snapshot::read(&mut reader, current);
    let prior = comparison.pair().map(|(p, _)| Snapshot::read(&mut reader, p));
    let gov = current.facts.governance;

    let sides = [
        (
            "Pressure",
            config.pressure_weight,
            TriangleSide::from_indicators(pressure(&cur, prior.as_ref())),
        ),
        (
            "Opportunity",
            config.opportunity_weight,
            TriangleSide::from_indicators(opportunity(&cur, prior.as_ref(), gov.auditor_change)),
        ),
        (
            "Rationalization",
            config.rationalization_weight,
            TriangleSide::from_indicators(rationalization(&cur, gov.restatement)),
        ),
    ];

    let mut warnings = Vec::new();
    if matches!(comparison, Comparison::Gap { .. }) {
        warnings.push("Prior period is not adjacent; trend proxies were skipped.".to_string());
    }

    let (mut weighted, mut total_weight, mut used) = (Decimal::ZERO, Decimal::ZERO, 0u8);
    for (name, weight, side) in &sides {
        match side.score {
            Some(s) => {
                used += 1;
                weighted += *weight * s;
                total_weight += *weight;
            }
            None => warnings.push(format!("{name} sub-score excluded: no proxy could be computed.")),
        }
    }

    if used == 0 {
        return ModelResult::insufficient(
            "No Fraud Triangle proxy could be computed",
            reader.into_missing(),
        );
    }
    if total_weight.is_zero() {
        return ModelResult::insufficient(
            "Every available Fraud Triangle sub-score carries zero weight",
            vec![],
        );
    }

    let risk = weighted / total_weight;
    let level = classify(risk);
    warnings.extend(anomalies_for(current, &USED_CONCEPTS));
    debug!(fy = current.fiscal_year(), risk = %risk, used, "fraud triangle scored");

    let [(_, _, pressure), (_, _, opportunity), (_, _, rationalization)] = sides;
    ModelResult::scored(
        NativeScore::Probability { value: risk },
        level,
        FraudTriangleDetail {
            pressure,
            opportunity,
            rationalization,
            risk_score: risk,
            sub_scores_used: used,
            fiscal_year: current.fiscal_year(),
        },
        warnings,
    )
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::GovernanceSignals;
    use crate::models::test_support::annual;

    #[allow(clippy::too_many_arguments)]
    fn period(
        year: i32,
        rev: Decimal,
        cogs: Decimal,
        ni: Decimal,
        ta: Decimal,
        tl: Decimal,
        cfo: Decimal,
        recv: Decimal,
    ) -> PeriodFacts {
        annual(
            year,
            &[
                (Concept::Revenue, rev),
                (Concept::CostOfGoodsSold, cogs),
                (Concept::NetIncome, ni),
                (Concept::TotalAssets, ta),
                (Concept::TotalLiabilities, tl),
                (Concept::CashFlowFromOperations, cfo),
                (Concept::Receivables, recv),
            ],
        )
    }

    fn healthy() -> Vec<PeriodFacts> {
        vec![
            period(2019, dec!(1000), dec!(600), dec!(80), dec!(1000), dec!(400), dec!(100), dec!(100)),
            period(2020, dec!(1100), dec!(650), dec!(90), dec!(1050), dec!(400), dec!(120), dec!(105)),
        ]
    }

    fn stressed() -> Vec<PeriodFacts> {
        vec![
            period(2019, dec!(1000), dec!(600), dec!(50), dec!(1000), dec!(600), dec!(60), dec!(100)),
            period(2020, dec!(1200), dec!(900), dec!(100), dec!(2000), dec!(1800), dec!(-50), dec!(300)),
        ]
    }

    #[test]
    fn test_healthy_company_low_risk() {
        let r = calculate_fraud_triangle(&healthy(), &FraudTriangleConfig::default());
        let d = r.detail().unwrap();
        assert_eq!(d.risk_score, Decimal::ZERO);
        assert_eq!(d.sub_scores_used, 3);
        assert_eq!(r.risk_level(), Some(RiskLevel::Low));
    }

    #[test]
    fn test_stressed_company_high_risk() {
        let r = calculate_fraud_triangle(&stressed(), &FraudTriangleConfig::default());
        let d = r.detail().unwrap();
        assert_eq!(d.pressure.score, Some(Decimal::ONE));
        assert_eq!(d.opportunity.score, Some(Decimal::ONE));
        // accrual ratio 150/2000 = 0.075 -> 0.75; conversion gap 1.5 -> 1
        assert_eq!(d.rationalization.score, Some(dec!(0.875)));
        assert!(d.risk_score > dec!(0.95));
        assert_eq!(r.risk_level(), Some(RiskLevel::High));
        assert!(matches!(r.native_score(), Some(NativeScore::Probability { .. })));
    }

    #[test]
    fn test_single_period_drops_trend_proxies() {
        let periods = stressed();
        let r = calculate_fraud_triangle(&periods[1..], &FraudTriangleConfig::default());
        let s = r.as_scored().unwrap();
        assert_eq!(s.detail.opportunity.score, None);
        assert_eq!(s.detail.sub_scores_used, 2);
        // (1 + 0.875) / 2
        assert_eq!(s.detail.risk_score, dec!(0.9375));
        assert!(s.warnings.iter().any(|w| w.starts_with("Opportunity")));
    }

    #[test]
    fn test_gap_skips_trend_proxies() {
        let mut periods = stressed();
        periods[0] = period(2018, dec!(1000), dec!(600), dec!(50), dec!(1000), dec!(600), dec!(60), dec!(100));
        let r = calculate_fraud_triangle(&periods, &FraudTriangleConfig::default());
        let s = r.as_scored().unwrap();

        assert_eq!(s.detail.opportunity.score, None);
        let names: Vec<&str> = s
            .detail
            .pressure
            .indicators
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["leverage_level", "operating_cash_shortfall"]);
        assert_eq!(s.detail.sub_scores_used, 2);
        assert_eq!(s.detail.risk_score, dec!(0.9375));
        assert!(s
            .warnings
            .iter()
            .any(|w| w == "Prior period is not adjacent; trend proxies were skipped."));
    }

    #[test]
    fn test_missing_side_excluded_not_defaulted() {
        let pf = annual(
            2020,
            &[
                (Concept::TotalAssets, dec!(1000)),
                (Concept::TotalLiabilities, dec!(700)),
            ],
        );
        let r = calculate_fraud_triangle(&[pf], &FraudTriangleConfig::default());
        let d = r.detail().unwrap();
        assert_eq!(d.sub_scores_used, 1);
        assert_eq!(d.risk_score, dec!(0.5));
        assert_eq!(r.risk_level(), Some(RiskLevel::Moderate));
    }

    #[test]
    fn test_no_proxies_is_insufficient() {
        let pf = annual(2020, &[(Concept::Revenue, dec!(1000))]);
        let r = calculate_fraud_triangle(&[pf], &FraudTriangleConfig::default());
        let why = r.insufficiency().unwrap();
        assert!(why.missing.iter().any(|m| m.concept == Concept::CashFlowFromOperations));
    }

    #[test]
    fn test_auditor_change_feeds_opportunity() {
        let mut periods = healthy();
        periods[1].facts.governance = GovernanceSignals {
            auditor_change: Some(true),
            restatement: None,
        };
        let r = calculate_fraud_triangle(&periods, &FraudTriangleConfig::default());
        let opp = r.detail().unwrap().opportunity.score.unwrap();
        assert!(opp > dec!(0.33) && opp < dec!(0.34), "opportunity = {opp}");
        assert_eq!(r.detail().unwrap().opportunity.indicators.len(), 3);
    }

    #[test]
    fn test_weights_shift_risk() {
        let cfg = FraudTriangleConfig {
            pressure_weight: dec!(2),
            ..FraudTriangleConfig::default()
        };
        let r = calculate_fraud_triangle(&stressed(), &cfg);
        // (2*1 + 1 + 0.875) / 4
        assert_eq!(r.detail().unwrap().risk_score, dec!(0.96875));
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(classify(dec!(0.2999)), RiskLevel::Low);
        assert_eq!(classify(dec!(0.3)), RiskLevel::Moderate);
        assert_eq!(classify(dec!(0.5999)), RiskLevel::Moderate);
        assert_eq!(classify(dec!(0.6)), RiskLevel::High);
    }
}
