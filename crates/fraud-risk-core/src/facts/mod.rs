pub mod concept;
pub mod period;
pub mod quality;
pub mod store;

pub use concept::Concept;
pub use period::{FilingType, FiscalPeriod};
pub use quality::{DataQualityIssue, DataQualityKind};
pub use store::{
    AnalysisWindow, CompanyIdentity, FactsStore, FinancialFacts, GovernanceSignals, PeriodFacts,
    ResolutionNote,
};
