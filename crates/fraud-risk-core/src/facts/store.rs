//! Per-period financial facts and the ordered store a company's periods live in.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::concept::Concept;
use super::period::{FilingType, FiscalPeriod};
use crate::config::AnalysisParams;
use crate::error::FraudRiskError;
use crate::FraudRiskResult;

// ---------------------------------------------------------------------------
// FinancialFacts
// ---------------------------------------------------------------------------

/// Non-numeric governance disclosures, when the extractor found them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSignals {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub auditor_change: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub restatement: Option<bool>,
}

/// Standardized figures for one period. An absent concept is unknown, which
/// is not the same thing as a reported zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialFacts {
    values: BTreeMap<Concept, Decimal>,
    #[serde(default)]
    pub governance: GovernanceSignals,
}

/// How a canonical value was obtained from the raw filing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionNote {
    pub concept: Concept,
    pub source: String,
}

impl FinancialFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, concept: Concept, value: Decimal) -> Self {
        self.values.insert(concept, value);
        self
    }

    pub fn set(&mut self, concept: Concept, value: Decimal) {
        self.values.insert(concept, value);
    }

    pub fn remove(&mut self, concept: Concept) -> Option<Decimal> {
        self.values.remove(&concept)
    }

    pub fn get(&self, concept: Concept) -> Option<Decimal> {
        self.values.get(&concept).copied()
    }

    pub fn contains(&self, concept: Concept) -> bool {
        self.values.contains_key(&concept)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Concept, Decimal)> + '_ {
        self.values.iter().map(|(c, v)| (*c, *v))
    }

    /// Resolve raw `(tag, value)` pairs into canonical concepts. When several
    /// aliases of one concept are present, the highest-priority alias wins.
    /// Unknown tags are ignored. Derivations are applied afterwards.
    pub fn from_tagged<I, S>(pairs: I) -> (Self, Vec<ResolutionNote>)
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut best: BTreeMap<Concept, (usize, String, Decimal)> = BTreeMap::new();
        for (tag, value) in pairs {
            let tag = tag.as_ref();
            let Some((concept, rank)) = Concept::from_tag(tag) else {
                continue;
            };
            match best.get(&concept) {
                Some((existing, _, _)) if *existing <= rank => {}
                _ => {
                    best.insert(concept, (rank, tag.to_string(), value));
                }
            }
        }

        let mut facts = FinancialFacts::new();
        let mut notes = Vec::with_capacity(best.len());
        for (concept, (_, tag, value)) in best {
            facts.set(concept, value);
            notes.push(ResolutionNote {
                concept,
                source: format!("us-gaap:{tag}"),
            });
        }
        notes.extend(facts.derive_missing());
        (facts, notes)
    }

    /// Fill concepts that can be derived from others. Only absent values are
    /// written; a reported value is never overridden.
    pub fn derive_missing(&mut self) -> Vec<ResolutionNote> {
        let mut notes = Vec::new();

        if !self.contains(Concept::CostOfGoodsSold) {
            if let (Some(rev), Some(gp)) = (self.get(Concept::Revenue), self.get(Concept::GrossProfit)) {
                self.set(Concept::CostOfGoodsSold, rev - gp);
                notes.push(ResolutionNote {
                    concept: Concept::CostOfGoodsSold,
                    source: "derived: Revenue - GrossProfit".into(),
                });
            }
        }

        if !self.contains(Concept::TotalLiabilities) {
            if let (Some(ta), Some(eq)) = (
                self.get(Concept::TotalAssets),
                self.get(Concept::StockholdersEquity),
            ) {
                self.set(Concept::TotalLiabilities, ta - eq);
                notes.push(ResolutionNote {
                    concept: Concept::TotalLiabilities,
                    source: "derived: TotalAssets - StockholdersEquity".into(),
                });
            }
        }

        notes
    }
}

// ---------------------------------------------------------------------------
// Company store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyIdentity {
    pub cik: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ticker: Option<String>,
}

/// A period paired with its facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodFacts {
    pub period: FiscalPeriod,
    pub facts: FinancialFacts,
}

impl PeriodFacts {
    pub fn new(period: FiscalPeriod, facts: FinancialFacts) -> Self {
        PeriodFacts { period, facts }
    }

    pub fn fiscal_year(&self) -> i32 {
        self.period.fiscal_year
    }

    pub fn get(&self, concept: Concept) -> Option<Decimal> {
        self.facts.get(concept)
    }
}

/// Ordered periods for one company, most recent last.
#[derive(Debug, Clone, Serialize)]
pub struct FactsStore {
    company: CompanyIdentity,
    periods: Vec<PeriodFacts>,
}

/// The periods selected for one analysis, owned by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisWindow {
    /// Trailing periods of the primary series, most recent last.
    pub periods: Vec<PeriodFacts>,
    /// Every period kept after amendment resolution, for pooled statistics.
    pub pool: Vec<PeriodFacts>,
    /// Original filings replaced by an amendment.
    pub superseded: Vec<FiscalPeriod>,
    pub series: FilingType,
}

impl FactsStore {
    pub fn new(company: CompanyIdentity) -> Self {
        FactsStore {
            company,
            periods: Vec::new(),
        }
    }

    pub fn from_periods(
        company: CompanyIdentity,
        periods: Vec<PeriodFacts>,
    ) -> FraudRiskResult<Self> {
        let mut store = FactsStore::new(company);
        for pf in periods {
            store.insert(pf.period, pf.facts)?;
        }
        Ok(store)
    }

    /// Insert a period, keeping chronological order. Rejects a second period
    /// with the same `(fiscal_year, filing_type)` key.
    pub fn insert(&mut self, period: FiscalPeriod, facts: FinancialFacts) -> FraudRiskResult<()> {
        if self.periods.iter().any(|p| p.period.key() == period.key()) {
            return Err(FraudRiskError::invalid(
                "period",
                format!("Duplicate period {} for CIK {}", period.label(), self.company.cik),
            ));
        }
        let pos = self
            .periods
            .partition_point(|p| p.period.ordering_key() < period.ordering_key());
        self.periods.insert(pos, PeriodFacts::new(period, facts));
        Ok(())
    }

    pub fn company(&self) -> &CompanyIdentity {
        &self.company
    }

    pub fn periods(&self) -> &[PeriodFacts] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Select the periods an analysis will consider.
    ///
    /// Amendments are dropped unless requested; when included, an amendment
    /// replaces the original filing of the same fiscal year. The annual
    /// series is preferred over the quarterly one, and only the trailing
    /// `window_years` periods of it are kept.
    pub fn select_window(&self, params: &AnalysisParams) -> AnalysisWindow {
        let mut superseded = Vec::new();
        let mut pool: Vec<PeriodFacts> = Vec::with_capacity(self.periods.len());

        for pf in &self.periods {
            let ft = pf.period.filing_type;
            if ft.is_amendment() {
                if params.include_amendments {
                    pool.push(pf.clone());
                }
                continue;
            }
            let amended = params.include_amendments
                && self.periods.iter().any(|other| {
                    other.period.filing_type.is_amendment()
                        && other.period.filing_type.base() == ft
                        && other.period.fiscal_year == pf.period.fiscal_year
                });
            if amended {
                superseded.push(pf.period.clone());
            } else {
                pool.push(pf.clone());
            }
        }
        pool.sort_by_key(|p| p.period.ordering_key());

        let series = if pool
            .iter()
            .any(|p| p.period.filing_type.base() == FilingType::Annual)
        {
            FilingType::Annual
        } else {
            FilingType::Quarterly
        };

        let in_series: Vec<PeriodFacts> = pool
            .iter()
            .filter(|p| p.period.filing_type.base() == series)
            .cloned()
            .collect();
        let skip = in_series.len().saturating_sub(params.window_years as usize);
        let periods: Vec<PeriodFacts> = in_series.into_iter().skip(skip).collect();

        debug!(
            cik = %self.company.cik,
            selected = periods.len(),
            pooled = pool.len(),
            superseded = superseded.len(),
            "window selected"
        );

        AnalysisWindow {
            periods,
            pool,
            superseded,
            series,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn company() -> CompanyIdentity {
        CompanyIdentity {
            cik: "0000000001".into(),
            name: "Test Corp".into(),
            ticker: Some("TST".into()),
        }
    }

    fn annual(year: i32) -> FiscalPeriod {
        FiscalPeriod::new(
            year,
            NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
            FilingType::Annual,
        )
    }

    fn facts(revenue: Decimal) -> FinancialFacts {
        FinancialFacts::new().with(Concept::Revenue, revenue)
    }

    fn params(window_years: u8, include_amendments: bool) -> AnalysisParams {
        AnalysisParams {
            window_years,
            include_amendments,
        }
    }

    #[test]
    fn test_zero_is_distinct_from_absent() {
        let f = FinancialFacts::new().with(Concept::CashFlowFromOperations, Decimal::ZERO);
        assert_eq!(f.get(Concept::CashFlowFromOperations), Some(Decimal::ZERO));
        assert_eq!(f.get(Concept::NetIncome), None);
    }

    #[test]
    fn test_from_tagged_prefers_highest_priority_alias() {
        let (f, notes) = FinancialFacts::from_tagged(vec![
            ("SalesRevenueNet", dec!(900)),
            ("Revenues", dec!(1000)),
            ("Unrelated", dec!(5)),
        ]);
        assert_eq!(f.get(Concept::Revenue), Some(dec!(1000)));
        assert_eq!(f.len(), 1);
        assert_eq!(notes[0].source, "us-gaap:Revenues");
    }

    #[test]
    fn test_derives_cogs_and_liabilities() {
        let (f, notes) = FinancialFacts::from_tagged(vec![
            ("Revenues", dec!(1000)),
            ("GrossProfit", dec!(400)),
            ("Assets", dec!(2000)),
            ("StockholdersEquity", dec!(800)),
        ]);
        assert_eq!(f.get(Concept::CostOfGoodsSold), Some(dec!(600)));
        assert_eq!(f.get(Concept::TotalLiabilities), Some(dec!(1200)));
        assert!(notes.iter().any(|n| n.source.starts_with("derived")));
    }

    #[test]
    fn test_derivation_never_overrides_reported_value() {
        let mut f = FinancialFacts::new()
            .with(Concept::Revenue, dec!(1000))
            .with(Concept::GrossProfit, dec!(400))
            .with(Concept::CostOfGoodsSold, dec!(650));
        assert!(f.derive_missing().is_empty());
        assert_eq!(f.get(Concept::CostOfGoodsSold), Some(dec!(650)));
    }

    #[test]
    fn test_store_orders_periods() {
        let mut store = FactsStore::new(company());
        store.insert(annual(2021), facts(dec!(3))).unwrap();
        store.insert(annual(2019), facts(dec!(1))).unwrap();
        store.insert(annual(2020), facts(dec!(2))).unwrap();
        let years: Vec<i32> = store.periods().iter().map(|p| p.fiscal_year()).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut store = FactsStore::new(company());
        store.insert(annual(2020), facts(dec!(1))).unwrap();
        match store.insert(annual(2020), facts(dec!(2))).unwrap_err() {
            FraudRiskError::InvalidInput { field, .. } => assert_eq!(field, "period"),
            e => panic!("Expected InvalidInput, got {e}"),
        }
    }

    #[test]
    fn test_window_keeps_trailing_years() {
        let mut store = FactsStore::new(company());
        for y in 2015..=2022 {
            store.insert(annual(y), facts(Decimal::from(y))).unwrap();
        }
        let w = store.select_window(&params(3, false));
        let years: Vec<i32> = w.periods.iter().map(|p| p.fiscal_year()).collect();
        assert_eq!(years, vec![2020, 2021, 2022]);
        assert_eq!(w.pool.len(), 8);
        assert_eq!(w.series, FilingType::Annual);
    }

    #[test]
    fn test_amendments_excluded_by_default() {
        let mut store = FactsStore::new(company());
        store.insert(annual(2020), facts(dec!(1))).unwrap();
        let amended = FiscalPeriod::new(
            2020,
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            FilingType::AnnualAmendment,
        );
        store.insert(amended, facts(dec!(2))).unwrap();

        let w = store.select_window(&params(5, false));
        assert_eq!(w.periods.len(), 1);
        assert_eq!(w.periods[0].get(Concept::Revenue), Some(dec!(1)));
        assert!(w.superseded.is_empty());
    }

    #[test]
    fn test_amendment_supersedes_original_when_included() {
        let mut store = FactsStore::new(company());
        store.insert(annual(2019), facts(dec!(1))).unwrap();
        store.insert(annual(2020), facts(dec!(2))).unwrap();
        let amended = FiscalPeriod::new(
            2020,
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
            FilingType::AnnualAmendment,
        );
        store.insert(amended, facts(dec!(20))).unwrap();

        let w = store.select_window(&params(5, true));
        assert_eq!(w.periods.len(), 2);
        assert_eq!(w.periods[1].get(Concept::Revenue), Some(dec!(20)));
        assert_eq!(w.superseded, vec![annual(2020)]);
    }

    #[test]
    fn test_quarterly_series_used_when_no_annual() {
        let mut store = FactsStore::new(company());
        let q = FiscalPeriod::new(
            2021,
            NaiveDate::from_ymd_opt(2021, 3, 31).unwrap(),
            FilingType::Quarterly,
        );
        store.insert(q, facts(dec!(1))).unwrap();
        let w = store.select_window(&params(2, false));
        assert_eq!(w.series, FilingType::Quarterly);
        assert_eq!(w.periods.len(), 1);
    }
}
