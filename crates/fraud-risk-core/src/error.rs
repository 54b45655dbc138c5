use thiserror::Error;

#[derive(Debug, Error)]
pub enum FraudRiskError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Analysis cancelled before the report was assembled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FraudRiskError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        FraudRiskError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FraudRiskError {
    fn from(e: serde_json::Error) -> Self {
        FraudRiskError::SerializationError(e.to_string())
    }
}
