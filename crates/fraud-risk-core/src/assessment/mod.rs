//! Cross-model assessment: red flags, the composite risk and trends.

pub mod composite;
pub mod red_flags;
pub mod trends;

pub use composite::{aggregate, normalized_risk, CompositeRisk, ModelContribution};
pub use red_flags::{generate_red_flags, RedFlag, RedFlagKind};
pub use trends::{TrendDirection, TrendSummary};
