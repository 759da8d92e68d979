//! Persisted entities of the benchmark catalog and its runs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BenchError;

pub type AlgorithmId = Uuid;
pub type InputId = Uuid;
pub type CriteriaId = Uuid;
pub type ExecutionId = Uuid;
pub type PayloadId = Uuid;
pub type ResultId = Uuid;

/// Maximum stored alias length (matches the `execution.alias` column).
pub const MAX_ALIAS_LEN: usize = 100;

/// Message recorded on an execution whose payload failed validation.
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid payload";

// ── Status ────────────────────────────────────────────────────

/// Lifecycle status shared by executions and per-criterion results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Queue,
    Processing,
    Done,
    Warning,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Queue => "QUEUE",
            Status::Processing => "PROCESSING",
            Status::Done => "DONE",
            Status::Warning => "WARNING",
            Status::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Done | Status::Warning | Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QUEUE" => Ok(Status::Queue),
            "PROCESSING" => Ok(Status::Processing),
            "DONE" => Ok(Status::Done),
            "WARNING" => Ok(Status::Warning),
            "ERROR" => Ok(Status::Error),
            other => Err(BenchError::UnknownStatus(other.to_string())),
        }
    }
}

// ── InputType ─────────────────────────────────────────────────

/// Declared type of an algorithm input.
///
/// Parsed leniently from the stored type name; unknown names are kept as
/// [`InputType::Other`] and receive no format check or coercion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InputType {
    Integer,
    Float,
    String,
    Boolean,
    List,
    Other(String),
}

impl InputType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => InputType::Integer,
            "float" => InputType::Float,
            "str" | "string" => InputType::String,
            "bool" | "boolean" => InputType::Boolean,
            "list" => InputType::List,
            _ => InputType::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            InputType::Integer => "integer",
            InputType::Float => "float",
            InputType::String => "string",
            InputType::Boolean => "boolean",
            InputType::List => "list",
            InputType::Other(raw) => raw,
        }
    }
}

impl From<String> for InputType {
    fn from(s: String) -> Self {
        InputType::parse(&s)
    }
}

impl From<InputType> for String {
    fn from(t: InputType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Catalog ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Algorithm {
    pub algorithm_id: AlgorithmId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Input {
    pub input_id: InputId,
    pub algorithm_id: AlgorithmId,
    pub name: String,
    pub input_type: InputType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Criteria {
    pub criteria_id: CriteriaId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
}

/// An algorithm together with its declared inputs and bound criteria.
#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmDetail {
    #[serde(flatten)]
    pub algorithm: Algorithm,
    pub inputs: Vec<Input>,
    pub criteria: Vec<Criteria>,
}

// ── Execution ─────────────────────────────────────────────────

/// One request to run an algorithm against a concrete payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub execution_id: ExecutionId,
    pub algorithm_id: AlgorithmId,
    pub alias: Option<String>,
    pub status: Status,
    pub message: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Execution {
    pub fn new(algorithm_id: AlgorithmId, alias: String) -> Self {
        let now = Utc::now();
        Self {
            execution_id: Uuid::new_v4(),
            algorithm_id,
            alias: Some(alias),
            status: Status::Queue,
            message: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_processing(&mut self) {
        self.transition(Status::Processing, None);
    }

    pub fn set_done(&mut self) {
        self.transition(Status::Done, None);
    }

    pub fn set_warning(&mut self, message: impl Into<String>) {
        self.transition(Status::Warning, Some(message.into()));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.transition(Status::Error, Some(message.into()));
    }

    fn transition(&mut self, status: Status, message: Option<String>) {
        self.status = status;
        self.message = message;
        self.updated_at = Utc::now();
    }
}

/// Default alias for an execution submitted without one.
pub fn default_alias(now: DateTime<Utc>) -> String {
    sanitize_alias(&format!("Execution_{}", now.format("%Y-%m-%d %H:%M:%S")))
}

/// Reduce an alias to ASCII alphanumerics and `_`, capped at [`MAX_ALIAS_LEN`].
pub fn sanitize_alias(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(MAX_ALIAS_LEN)
        .collect()
}

// ── Payload ───────────────────────────────────────────────────

/// A caller-supplied input value, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedInput {
    #[serde(alias = "id")]
    pub input_id: InputId,
    pub value: String,
}

/// Request body for creating an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExecution {
    pub algorithm_id: AlgorithmId,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default, alias = "input")]
    pub inputs: Vec<SubmittedInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    pub payload_id: PayloadId,
    pub execution_id: ExecutionId,
    pub input_id: InputId,
    pub input_value: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Payload {
    pub fn new(execution_id: ExecutionId, input_id: InputId, input_value: impl Into<String>) -> Self {
        Self {
            payload_id: Uuid::new_v4(),
            execution_id,
            input_id,
            input_value: input_value.into(),
            enabled: true,
            created_at: Utc::now(),
        }
    }
}

/// A persisted payload value joined to the input it fills.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadWithInput {
    pub payload: Payload,
    pub input: Input,
}

// ── Result ────────────────────────────────────────────────────

/// Outcome of evaluating one criterion for one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub result_id: ResultId,
    pub execution_id: ExecutionId,
    pub criteria_id: CriteriaId,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub status: Status,
    pub message: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn new(execution_id: ExecutionId, criteria_id: CriteriaId) -> Self {
        let now = Utc::now();
        Self {
            result_id: Uuid::new_v4(),
            execution_id,
            criteria_id,
            value: None,
            unit: None,
            status: Status::Queue,
            message: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_processing(&mut self) {
        self.status = Status::Processing;
        self.updated_at = Utc::now();
    }

    pub fn set_done(&mut self, value: Option<String>, unit: Option<String>, message: Option<String>) {
        self.value = value;
        self.unit = unit;
        self.message = message;
        self.status = Status::Done;
        self.updated_at = Utc::now();
    }

    pub fn set_warning(&mut self, message: impl Into<String>) {
        self.status = Status::Warning;
        self.message = Some(message.into());
        self.updated_at = Utc::now();
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = Status::Error;
        self.message = Some(message.into());
        self.updated_at = Utc::now();
    }
}

// ── Views ─────────────────────────────────────────────────────

/// Input value as shown in execution detail.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadView {
    pub input_id: InputId,
    pub name: String,
    pub value: String,
}

/// Result as shown in execution detail.
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    pub criteria: String,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub status: Status,
    pub message: Option<String>,
}

/// Execution detail: the execution, its algorithm name, payload and results.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionDetail {
    #[serde(flatten)]
    pub execution: Execution,
    pub algorithm_name: String,
    pub payload: Vec<PayloadView>,
    pub results: Vec<ResultView>,
}

/// One page of a listing plus the total number of matching items.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub total_items: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            total_items: 0,
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&Status::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
        assert_eq!("done".parse::<Status>().unwrap(), Status::Done);
        assert!("RUNNING".parse::<Status>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!Status::Queue.is_terminal());
        assert!(!Status::Processing.is_terminal());
        assert!(Status::Done.is_terminal());
        assert!(Status::Warning.is_terminal());
        assert!(Status::Error.is_terminal());
    }

    #[test]
    fn input_type_aliases() {
        assert_eq!(InputType::parse("int"), InputType::Integer);
        assert_eq!(InputType::parse(" Integer "), InputType::Integer);
        assert_eq!(InputType::parse("bool"), InputType::Boolean);
        assert_eq!(InputType::parse("str"), InputType::String);
        assert_eq!(InputType::parse("matrix"), InputType::Other("matrix".into()));
        assert_eq!(InputType::Other("matrix".into()).as_str(), "matrix");
    }

    #[test]
    fn alias_is_sanitized_and_truncated() {
        assert_eq!(sanitize_alias("my run #1!"), "myrun1");
        assert_eq!(sanitize_alias("keep_under_score"), "keep_under_score");
        let long = "a".repeat(250);
        assert_eq!(sanitize_alias(&long).len(), MAX_ALIAS_LEN);
    }

    #[test]
    fn default_alias_has_timestamp() {
        let now = DateTime::parse_from_rfc3339("2024-10-18T21:08:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(default_alias(now), "Execution_20241018210800");
    }

    #[test]
    fn execution_transitions_track_message() {
        let mut exec = Execution::new(Uuid::new_v4(), "a".into());
        assert_eq!(exec.status, Status::Queue);
        exec.set_error("boom");
        assert_eq!(exec.status, Status::Error);
        assert_eq!(exec.message.as_deref(), Some("boom"));
        exec.set_done();
        assert_eq!(exec.status, Status::Done);
        assert!(exec.message.is_none());
    }

    #[test]
    fn new_execution_accepts_short_field_names() {
        let body = r#"{"algorithm_id":"0192919b-2501-2fea-a93d-5d5541c4002b",
            "input":[{"id":"0192919b-2501-585f-1492-4f5d22c98267","value":"5"}]}"#;
        let req: NewExecution = serde_json::from_str(body).unwrap();
        assert_eq!(req.inputs.len(), 1);
        assert_eq!(req.inputs[0].value, "5");
        assert!(req.alias.is_none());
    }
}
