//! Fatal errors and locally recovered warnings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a computation. Everything recoverable is an
/// [`EngineWarning`] instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Circular dependency detected between tasks")]
    CircularDependency,
    #[error("Task relation references unknown task uid {0}")]
    UnknownPredecessor(u32),
    #[error("Date arithmetic out of range: {0}")]
    DateOutOfRange(String),
    #[error("Unknown phase: {0}")]
    UnknownPhase(String),
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::MalformedInput(err.to_string())
    }
}

/// A condition that was recovered from with a safe default.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    #[error("Article {code} excluded: quantity {quantity:?} is missing or not positive")]
    InvalidQuantity { code: String, quantity: Option<f64> },
    #[error("Article {code} excluded: no matched unit cost")]
    UnmatchedCost { code: String },
    #[error("Article {code} excluded: no phase classification")]
    UnclassifiedArticle { code: String },
    #[error("Task {uid} ignored: finish date is before start date")]
    InconsistentDates { uid: u32 },
    #[error("Progress for unknown task uid {uid} ignored")]
    UnknownTask { uid: u32 },
    #[error("Progress for task {uid} clamped from {given}% to {clamped}%")]
    PercentClamped { uid: u32, given: f64, clamped: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_messages_name_the_article() {
        let warning = EngineWarning::InvalidQuantity {
            code: "03.01.002".to_string(),
            quantity: Some(0.0),
        };
        assert!(warning.to_string().contains("03.01.002"));
    }

    #[test]
    fn test_json_errors_become_malformed_input() {
        let err: EngineError = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(matches!(err, EngineError::MalformedInput(_)));
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let json = serde_json::to_string(&EngineWarning::UnknownTask { uid: 7 }).unwrap();
        assert_eq!(json, r#"{"kind":"unknown_task","uid":7}"#);
    }
}
