//! Evaluation criteria: measure an algorithm run or inspect its synthesized inputs.

mod graph;
mod memory;
mod registry;
mod timing;

use serde::Serialize;

use algobench_core::{Params, PayloadEntry};

use crate::algorithms::Algorithm;
use crate::error::EvaluationError;

pub use graph::{has_cycle, CountEdges, CountNodes, DetectCycle};
pub use memory::MemoryConsume;
pub use registry::{EvaluationRegistry, EvaluatorFactory};
pub use timing::{RunningTime, SetupTime};

pub const RUNNING_TIME: &str = "Running Time";
pub const MEMORY_CONSUME: &str = "Memory Consume";
pub const SETUP_TIME: &str = "Setup Time";
pub const COUNT_NODES: &str = "Count Nodes";
pub const COUNT_EDGES: &str = "Count Edges";
pub const DETECT_CYCLE: &str = "Detect Cycle";

/// Inputs available to an evaluator.
pub struct EvaluationContext<'a> {
    /// Payload as loaded from storage, before the setup hook ran.
    pub payload: &'a [PayloadEntry],
    /// Flat mapping built from the setup-extended payload.
    pub params: &'a Params,
}

/// A measured criterion value. `value` is always a decimal or text string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub value: Option<String>,
    pub unit: Option<String>,
    pub message: Option<String>,
}

impl Measurement {
    pub fn new(value: impl Into<String>, unit: Option<&str>) -> Self {
        Self {
            value: Some(value.into()),
            unit: unit.map(str::to_string),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Measures one criterion for an algorithm.
pub trait Evaluator: Send + Sync {
    /// Criterion name, as stored in the catalog.
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        algorithm: &dyn Algorithm,
        ctx: &EvaluationContext<'_>,
    ) -> Result<Measurement, EvaluationError>;
}

/// Render a measurement with seven decimal places.
pub fn format_decimal(value: f64) -> String {
    format!("{value:.7}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_are_fixed_to_seven_places() {
        assert_eq!(format_decimal(0.5), "0.5000000");
        assert_eq!(format_decimal(1.0 / 3.0), "0.3333333");
        assert_eq!(format_decimal(12.0), "12.0000000");
    }
}
