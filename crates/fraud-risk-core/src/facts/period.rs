use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FraudRiskError;
use crate::FraudRiskResult;

/// Regulatory filing type of a reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilingType {
    #[serde(rename = "10-K")]
    Annual,
    #[serde(rename = "10-Q")]
    Quarterly,
    #[serde(rename = "10-K/A")]
    AnnualAmendment,
    #[serde(rename = "10-Q/A")]
    QuarterlyAmendment,
}

impl FilingType {
    /// Parse from an SEC form name.
    pub fn from_form(form: &str) -> FraudRiskResult<Self> {
        match form.trim().to_uppercase().as_str() {
            "10-K" | "10-K405" | "20-F" | "40-F" => Ok(FilingType::Annual),
            "10-Q" => Ok(FilingType::Quarterly),
            "10-K/A" | "10-K405/A" | "20-F/A" | "40-F/A" => Ok(FilingType::AnnualAmendment),
            "10-Q/A" => Ok(FilingType::QuarterlyAmendment),
            other => Err(FraudRiskError::invalid(
                "filing_type",
                format!("Unsupported form '{other}'; expected 10-K, 10-Q or an amendment."),
            )),
        }
    }

    pub fn form_name(self) -> &'static str {
        match self {
            FilingType::Annual => "10-K",
            FilingType::Quarterly => "10-Q",
            FilingType::AnnualAmendment => "10-K/A",
            FilingType::QuarterlyAmendment => "10-Q/A",
        }
    }

    pub fn is_amendment(self) -> bool {
        matches!(
            self,
            FilingType::AnnualAmendment | FilingType::QuarterlyAmendment
        )
    }

    /// The original filing type an amendment restates.
    pub fn base(self) -> Self {
        match self {
            FilingType::Annual | FilingType::AnnualAmendment => FilingType::Annual,
            FilingType::Quarterly | FilingType::QuarterlyAmendment => FilingType::Quarterly,
        }
    }
}

/// One reporting period for a company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiscalPeriod {
    pub fiscal_year: i32,
    pub period_end: NaiveDate,
    pub filing_type: FilingType,
}

impl FiscalPeriod {
    pub fn new(fiscal_year: i32, period_end: NaiveDate, filing_type: FilingType) -> Self {
        FiscalPeriod {
            fiscal_year,
            period_end,
            filing_type,
        }
    }

    /// Uniqueness key within a company's store.
    pub fn key(&self) -> (i32, FilingType) {
        (self.fiscal_year, self.filing_type)
    }

    /// Chronological ordering key: fiscal year, then period end, then type.
    pub fn ordering_key(&self) -> (i32, NaiveDate, FilingType) {
        (self.fiscal_year, self.period_end, self.filing_type)
    }

    pub fn label(&self) -> String {
        format!("FY{} {}", self.fiscal_year, self.filing_type.form_name())
    }

    /// Whether `prior` immediately precedes `self`, so period-over-period
    /// ratios between the two are meaningful.
    pub fn follows(&self, prior: &FiscalPeriod) -> bool {
        if self.filing_type.base() != prior.filing_type.base() {
            return false;
        }
        match self.filing_type.base() {
            FilingType::Annual => self.fiscal_year - prior.fiscal_year == 1,
            _ => {
                let gap_days = (self.period_end - prior.period_end).num_days();
                (1..=400).contains(&gap_days)
            }
        }
    }
}
