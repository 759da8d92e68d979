//! Benchmarkable algorithms and the registry that resolves them by name.

pub mod dijkstra;
pub mod factorial;
pub mod fibonacci;
mod registry;

use std::fmt;

use serde::Serialize;

use algobench_core::{Params, PayloadEntry};

use crate::error::AlgorithmError;

pub use dijkstra::{generate_graph, shortest_distance, Dijkstra};
pub use factorial::Factorial;
pub use fibonacci::Fibonacci;
pub use registry::{AlgorithmFactory, AlgorithmRegistry};

pub const DIJKSTRA: &str = "Dijkstra";
pub const FACTORIAL: &str = "Factorial";
pub const FIBONACCI: &str = "Fibonacci sequence";

/// Value computed by an algorithm run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Integer(u128),
    Distance(u64),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Integer(n) => write!(f, "{n}"),
            Output::Distance(d) => write!(f, "{d}"),
        }
    }
}

/// An algorithm that can be executed and measured.
///
/// `run` is the workload evaluators time and sample. `setup` derives extra,
/// non-persisted payload entries the evaluators need (e.g. a generated graph);
/// it returns a new payload and never touches its input.
pub trait Algorithm: Send + Sync {
    /// Registered name, as stored in the catalog.
    fn name(&self) -> &str;

    fn run(&self, params: &Params) -> Result<Output, AlgorithmError>;

    fn setup(&self, payload: &[PayloadEntry]) -> Result<Vec<PayloadEntry>, AlgorithmError> {
        Ok(payload.to_vec())
    }
}
