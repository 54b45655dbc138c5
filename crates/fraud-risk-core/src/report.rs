//! The immutable result of one analysis.

use serde::{Deserialize, Serialize};

use crate::assessment::{CompositeRisk, RedFlag, TrendSummary};
use crate::config::AnalysisParams;
use crate::facts::{CompanyIdentity, DataQualityIssue, FiscalPeriod, ResolutionNote};
use crate::models::ModelResults;
use crate::types::ReportMetadata;

/// A concept filled by derivation in one analysed period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedFact {
    pub fiscal_year: i32,
    #[serde(flatten)]
    pub note: ResolutionNote,
}

/// Everything one analysis produced. Built once by the engine and never
/// mutated; fields are exposed read-only.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    company: CompanyIdentity,
    params: AnalysisParams,
    filings_analyzed: Vec<FiscalPeriod>,
    overall_risk: CompositeRisk,
    models: ModelResults,
    red_flags: Vec<RedFlag>,
    trends: TrendSummary,
    data_quality: Vec<DataQualityIssue>,
    derived_facts: Vec<DerivedFact>,
    metadata: ReportMetadata,
}

pub(crate) struct ReportParts {
    pub company: CompanyIdentity,
    pub params: AnalysisParams,
    pub filings_analyzed: Vec<FiscalPeriod>,
    pub overall_risk: CompositeRisk,
    pub models: ModelResults,
    pub red_flags: Vec<RedFlag>,
    pub trends: TrendSummary,
    pub data_quality: Vec<DataQualityIssue>,
    pub derived_facts: Vec<DerivedFact>,
    pub metadata: ReportMetadata,
}

impl AnalysisReport {
    pub(crate) fn assemble(parts: ReportParts) -> Self {
        AnalysisReport {
            company: parts.company,
            params: parts.params,
            filings_analyzed: parts.filings_analyzed,
            overall_risk: parts.overall_risk,
            models: parts.models,
            red_flags: parts.red_flags,
            trends: parts.trends,
            data_quality: parts.data_quality,
            derived_facts: parts.derived_facts,
            metadata: parts.metadata,
        }
    }

    pub fn company(&self) -> &CompanyIdentity {
        &self.company
    }

    pub fn params(&self) -> &AnalysisParams {
        &self.params
    }

    /// Periods the models were evaluated over, oldest first.
    pub fn filings_analyzed(&self) -> &[FiscalPeriod] {
        &self.filings_analyzed
    }

    pub fn overall_risk(&self) -> &CompositeRisk {
        &self.overall_risk
    }

    pub fn models(&self) -> &ModelResults {
        &self.models
    }

    pub fn red_flags(&self) -> &[RedFlag] {
        &self.red_flags
    }

    pub fn trends(&self) -> &TrendSummary {
        &self.trends
    }

    pub fn data_quality(&self) -> &[DataQualityIssue] {
        &self.data_quality
    }

    /// Concepts filled by derivation rather than reported directly.
    pub fn derived_facts(&self) -> &[DerivedFact] {
        &self.derived_facts
    }

    pub fn metadata(&self) -> &ReportMetadata {
        &self.metadata
    }

    pub fn to_json(&self) -> crate::FraudRiskResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
