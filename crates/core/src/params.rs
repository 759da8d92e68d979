//! Typed parameter values passed from a payload into algorithms and evaluators.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{InputId, InputType, PayloadWithInput};

/// Weighted adjacency matrix; `graph[u][v] > 0` is an edge u→v with that weight.
pub type Graph = Vec<Vec<i64>>;

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("missing parameter: {0}")]
    Missing(String),

    #[error("parameter '{name}' is not a {expected}")]
    WrongType { name: String, expected: &'static str },

    #[error("cannot read '{value}' as {input_type} for parameter '{name}'")]
    Coerce {
        name: String,
        input_type: String,
        value: String,
    },
}

// ── ParamValue ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Graph(Graph),
}

impl ParamValue {
    /// Integer view; raw text is parsed after trimming.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(f) => Some(*f),
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_graph(&self) -> Option<&Graph> {
        match self {
            ParamValue::Graph(g) => Some(g),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "boolean",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Text(_) => "string",
            ParamValue::Graph(_) => "graph",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Graph(g) => write!(f, "<{}x{} graph>", g.len(), g.first().map_or(0, Vec::len)),
        }
    }
}

// ── PayloadEntry ──────────────────────────────────────────────

/// One named value of an execution's working payload.
///
/// Entries loaded from storage carry their input id and the raw stored text.
/// Entries appended by an algorithm's setup hook have no input id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadEntry {
    pub input_id: Option<InputId>,
    pub name: String,
    pub input_type: InputType,
    pub value: ParamValue,
}

impl PayloadEntry {
    pub fn from_persisted(row: &PayloadWithInput) -> Self {
        Self {
            input_id: Some(row.input.input_id),
            name: row.input.name.clone(),
            input_type: row.input.input_type.clone(),
            value: ParamValue::Text(row.payload.input_value.clone()),
        }
    }

    pub fn synthetic(name: impl Into<String>, input_type: InputType, value: ParamValue) -> Self {
        Self {
            input_id: None,
            name: name.into(),
            input_type,
            value,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.input_id.is_none()
    }

    /// Coerce the value according to the declared input type.
    ///
    /// Integer, float and string types are converted; any other type passes
    /// through unchanged.
    pub fn coerced(&self) -> Result<ParamValue, ParamError> {
        let fail = || ParamError::Coerce {
            name: self.name.clone(),
            input_type: self.input_type.to_string(),
            value: self.value.to_string(),
        };
        match self.input_type {
            InputType::Integer => self.value.as_int().map(ParamValue::Int).ok_or_else(fail),
            InputType::Float => self.value.as_float().map(ParamValue::Float).ok_or_else(fail),
            InputType::String => Ok(ParamValue::Text(self.value.to_string())),
            _ => Ok(self.value.clone()),
        }
    }
}

// ── Params ────────────────────────────────────────────────────

/// Flat name → typed value mapping handed to algorithms and evaluators.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the mapping from a payload; later entries win on duplicate names.
    pub fn from_payload(entries: &[PayloadEntry]) -> Result<Self, ParamError> {
        let mut params = Self::new();
        for entry in entries {
            params.insert(entry.name.clone(), entry.coerced()?);
        }
        Ok(params)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&ParamValue, ParamError> {
        self.get(name).ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    pub fn int(&self, name: &str) -> Result<i64, ParamError> {
        self.require(name)?.as_int().ok_or_else(|| ParamError::WrongType {
            name: name.to_string(),
            expected: "integer",
        })
    }

    pub fn graph(&self, name: &str) -> Result<&Graph, ParamError> {
        self.require(name)?.as_graph().ok_or_else(|| ParamError::WrongType {
            name: name.to_string(),
            expected: "graph",
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, ty: &str, value: &str) -> PayloadEntry {
        PayloadEntry {
            input_id: Some(uuid::Uuid::new_v4()),
            name: name.into(),
            input_type: InputType::parse(ty),
            value: ParamValue::Text(value.into()),
        }
    }

    #[test]
    fn coerces_declared_numeric_types() {
        let params = Params::from_payload(&[
            raw("n", "integer", " 9 "),
            raw("ratio", "float", "0.5"),
            raw("label", "str", "abc"),
        ])
        .unwrap();
        assert_eq!(params.int("n").unwrap(), 9);
        assert_eq!(params.get("ratio"), Some(&ParamValue::Float(0.5)));
        assert_eq!(params.get("label"), Some(&ParamValue::Text("abc".into())));
    }

    #[test]
    fn unknown_types_pass_through() {
        let entry = raw("flag", "boolean", "TRUE");
        assert_eq!(entry.coerced().unwrap(), ParamValue::Text("TRUE".into()));

        let graph = PayloadEntry::synthetic("graph", InputType::List, ParamValue::Graph(vec![vec![0]]));
        assert_eq!(graph.coerced().unwrap(), ParamValue::Graph(vec![vec![0]]));
        assert!(graph.is_synthetic());
    }

    #[test]
    fn bad_integer_is_a_coercion_error() {
        let err = Params::from_payload(&[raw("n", "int", "nine")]).unwrap_err();
        assert!(matches!(err, ParamError::Coerce { .. }), "got {err:?}");
    }

    #[test]
    fn typed_accessors_report_missing_and_wrong_type() {
        let params = Params::new().with("n", ParamValue::Text("x".into()));
        assert_eq!(params.int("m"), Err(ParamError::Missing("m".into())));
        assert!(matches!(params.int("n"), Err(ParamError::WrongType { .. })));
        assert!(matches!(params.graph("n"), Err(ParamError::WrongType { .. })));
    }
}
