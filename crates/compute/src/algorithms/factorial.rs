use algobench_core::Params;

use super::{Algorithm, Output, FACTORIAL};
use crate::error::AlgorithmError;

pub const NUMBER_INPUT: &str = "factorial number";

/// Largest n whose factorial fits in a `u128`.
pub const MAX_N: u32 = 34;

/// n! computed by plain recursion.
pub struct Factorial;

fn factorial(n: u32) -> Option<u128> {
    if n <= 1 {
        return Some(1);
    }
    factorial(n - 1)?.checked_mul(u128::from(n))
}

impl Algorithm for Factorial {
    fn name(&self) -> &str {
        FACTORIAL
    }

    fn run(&self, params: &Params) -> Result<Output, AlgorithmError> {
        let raw = params.int(NUMBER_INPUT)?;
        let n = u32::try_from(raw).map_err(|_| {
            AlgorithmError::InvalidInput(format!("{NUMBER_INPUT} must be a non-negative integer, got {raw}"))
        })?;
        // Reject before recursing so huge inputs cannot exhaust the stack.
        if n > MAX_N {
            return Err(AlgorithmError::Overflow(format!("{n}!")));
        }
        factorial(n)
            .map(Output::Integer)
            .ok_or_else(|| AlgorithmError::Overflow(format!("{n}!")))
    }
}

#[cfg(test)]
mod tests {
    use algobench_core::ParamValue;

    use super::*;

    fn run(n: i64) -> Result<Output, AlgorithmError> {
        Factorial.run(&Params::new().with(NUMBER_INPUT, ParamValue::Int(n)))
    }

    #[test]
    fn five_factorial_is_120() {
        assert_eq!(run(5).unwrap(), Output::Integer(120));
    }

    #[test]
    fn zero_and_one() {
        assert_eq!(run(0).unwrap(), Output::Integer(1));
        assert_eq!(run(1).unwrap(), Output::Integer(1));
    }

    #[test]
    fn largest_fitting_value_then_overflow() {
        assert!(run(34).is_ok());
        assert!(matches!(run(35), Err(AlgorithmError::Overflow(_))));
    }

    #[test]
    fn huge_input_overflows_without_recursing() {
        assert!(matches!(run(10_000_000), Err(AlgorithmError::Overflow(_))));
        assert!(matches!(run(i64::from(u32::MAX)), Err(AlgorithmError::Overflow(_))));
    }

    #[test]
    fn negative_input_is_rejected() {
        assert!(matches!(run(-3), Err(AlgorithmError::InvalidInput(_))));
    }

    #[test]
    fn default_setup_returns_payload_unchanged() {
        let extended = Factorial.setup(&[]).unwrap();
        assert!(extended.is_empty());
    }
}
