use algobench_core::ParamError;
use thiserror::Error;

/// Failure inside an algorithm's `run` or `setup`.
#[derive(Debug, Error)]
pub enum AlgorithmError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("result of {0} does not fit in 128 bits")]
    Overflow(String),

    #[error("no path from node {from} to node {to}")]
    Unreachable { from: usize, to: usize },
}

/// Failure while measuring one criterion. Recorded on that criterion's result only.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),

    #[error("memory sampling unavailable: {0}")]
    Sampler(String),

    #[error("{0}")]
    Failed(String),
}
