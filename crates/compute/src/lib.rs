pub mod algorithms;
pub mod error;
pub mod evaluation;

pub use algorithms::{Algorithm, AlgorithmRegistry, Output};
pub use error::{AlgorithmError, EvaluationError};
pub use evaluation::{EvaluationContext, EvaluationRegistry, Evaluator, Measurement};
