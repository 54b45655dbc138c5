use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::facts::Concept;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Dimensionless ratios (1.05 = 5% above the comparison period).
pub type Ratio = Decimal;

/// Model scores on their native scale.
pub type Score = Decimal;

// ---------------------------------------------------------------------------
// Risk levels
// ---------------------------------------------------------------------------

/// Discrete risk classification shared by every model and the composite.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Moderate,
    Elevated,
    High,
    Critical,
}

impl RiskLevel {
    /// Position on the common [0, 1] ordinal scale used by the composite.
    pub fn ordinal_weight(self) -> Decimal {
        match self {
            Self::Low => Decimal::ZERO,
            Self::Moderate => dec!(0.33),
            Self::Elevated => dec!(0.5),
            Self::High => dec!(0.67),
            Self::Critical => Decimal::ONE,
        }
    }

    /// Band a 0-100 composite score: LOW 0-25, MODERATE 26-50, HIGH 51-75,
    /// CRITICAL 76-100.
    pub fn from_composite_score(score: Decimal) -> Self {
        if score <= dec!(25) {
            Self::Low
        } else if score <= dec!(50) {
            Self::Moderate
        } else if score <= dec!(75) {
            Self::High
        } else {
            Self::Critical
        }
    }

    pub fn is_high_or_worse(self) -> bool {
        self >= Self::High
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Moderate => write!(f, "MODERATE"),
            Self::Elevated => write!(f, "ELEVATED"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Model identity and native scales
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelId {
    Beneish,
    Altman,
    Piotroski,
    Benford,
    FraudTriangle,
}

impl ModelId {
    pub const ALL: [ModelId; 5] = [
        ModelId::Beneish,
        ModelId::Altman,
        ModelId::Piotroski,
        ModelId::Benford,
        ModelId::FraudTriangle,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Beneish => "Beneish M-Score",
            Self::Altman => "Altman Z-Score",
            Self::Piotroski => "Piotroski F-Score",
            Self::Benford => "Benford's Law",
            Self::FraudTriangle => "Fraud Triangle",
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A model score expressed on the model's own scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scale", rename_all = "snake_case")]
pub enum NativeScore {
    /// Unbounded linear score (Beneish M, Altman Z).
    Continuous { value: Score },
    /// Integer score where higher is healthier (Piotroski 0-9).
    Ordinal { value: u8, max: u8 },
    /// Percentage points (Benford total absolute deviation).
    Percentage { value: Score },
    /// Risk probability in [0, 1] (Fraud Triangle).
    Probability { value: Score },
}

impl NativeScore {
    /// Headline value, for templating flag descriptions.
    pub fn value(&self) -> Decimal {
        match *self {
            Self::Continuous { value }
            | Self::Percentage { value }
            | Self::Probability { value } => value,
            Self::Ordinal { value, .. } => Decimal::from(value),
        }
    }
}

// ---------------------------------------------------------------------------
// Model results
// ---------------------------------------------------------------------------

/// A concept a model needed but the period did not report.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MissingFact {
    pub concept: Concept,
    pub fiscal_year: i32,
}

/// Why a model could not produce a score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsufficientData {
    pub reason: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub missing: Vec<MissingFact>,
}

/// A computed score with its classification and model-specific breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored<T> {
    pub score: NativeScore,
    pub risk_level: RiskLevel,
    pub detail: T,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

/// Outcome of one model. Insufficient data is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelResult<T> {
    Scored(Scored<T>),
    InsufficientData(InsufficientData),
}

impl<T> ModelResult<T> {
    pub fn scored(score: NativeScore, risk_level: RiskLevel, detail: T, warnings: Vec<String>) -> Self {
        ModelResult::Scored(Scored {
            score,
            risk_level,
            detail,
            warnings,
        })
    }

    pub fn insufficient(reason: impl Into<String>, missing: Vec<MissingFact>) -> Self {
        ModelResult::InsufficientData(InsufficientData {
            reason: reason.into(),
            missing,
        })
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, ModelResult::Scored(_))
    }

    pub fn as_scored(&self) -> Option<&Scored<T>> {
        match self {
            ModelResult::Scored(s) => Some(s),
            ModelResult::InsufficientData(_) => None,
        }
    }

    pub fn detail(&self) -> Option<&T> {
        self.as_scored().map(|s| &s.detail)
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.as_scored().map(|s| s.risk_level)
    }

    pub fn native_score(&self) -> Option<NativeScore> {
        self.as_scored().map(|s| s.score)
    }

    pub fn insufficiency(&self) -> Option<&InsufficientData> {
        match self {
            ModelResult::Scored(_) => None,
            ModelResult::InsufficientData(d) => Some(d),
        }
    }
}

/// Severity attached to a red flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// Metadata for every analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub methodology: String,
    pub precision: String,
}

impl ReportMetadata {
    pub(crate) fn new(methodology: &str, elapsed_us: u64) -> Self {
        ReportMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            methodology: methodology.to_string(),
            precision: "rust_decimal_128bit".to_string(),
        }
    }
}
