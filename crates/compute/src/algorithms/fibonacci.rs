use algobench_core::Params;

use super::{Algorithm, Output, FIBONACCI};
use crate::error::AlgorithmError;

pub const NUMBER_INPUT: &str = "fibonacci number";

/// Largest n whose Fibonacci number fits in a `u128`.
pub const MAX_N: u32 = 186;

/// F(n) by naive double recursion. The exponential cost is the workload being measured.
pub struct Fibonacci;

fn fibonacci(n: u32) -> Option<u128> {
    match n {
        0 => Some(0),
        1 => Some(1),
        _ => fibonacci(n - 1)?.checked_add(fibonacci(n - 2)?),
    }
}

impl Algorithm for Fibonacci {
    fn name(&self) -> &str {
        FIBONACCI
    }

    fn run(&self, params: &Params) -> Result<Output, AlgorithmError> {
        let raw = params.int(NUMBER_INPUT)?;
        let n = u32::try_from(raw).map_err(|_| {
            AlgorithmError::InvalidInput(format!("{NUMBER_INPUT} must be a non-negative integer, got {raw}"))
        })?;
        if n > MAX_N {
            return Err(AlgorithmError::Overflow(format!("F({n})")));
        }
        fibonacci(n)
            .map(Output::Integer)
            .ok_or_else(|| AlgorithmError::Overflow(format!("F({n})")))
    }
}
