use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    /// No implementation is registered under the requested algorithm or criterion name.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("{kind} not found: {id}")]
    ObjectNotFound { kind: &'static str, id: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("{0}")]
    Other(String),
}

impl BenchError {
    pub fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        Self::ObjectNotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound { .. })
    }
}

impl From<serde_json::Error> for BenchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = BenchError::not_found("Execution", "abc");
        assert_eq!(err.to_string(), "Execution not found: abc");
        assert!(err.is_not_found());
        assert!(!BenchError::NotImplemented("x".into()).is_not_found());
    }
}
