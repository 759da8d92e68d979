use thiserror::Error;

use algobench_compute::AlgorithmError;
use algobench_core::BenchError;
use algobench_queue::QueueError;
use algobench_storage::StoreError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] BenchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("setup failed: {0}")]
    Setup(#[from] AlgorithmError),

    #[error("blocking task failed: {0}")]
    Join(String),
}

impl PipelineError {
    /// Missing or disabled row, from either layer.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Core(e) | Self::Store(StoreError::Core(e)) => e.is_not_found(),
            Self::Store(StoreError::NotFound { .. }) => true,
            _ => false,
        }
    }
}

impl PipelineError {
    /// The execution row itself is missing or disabled, so there is nothing to mark.
    pub fn is_missing_execution(&self) -> bool {
        matches!(
            self,
            Self::Core(BenchError::ObjectNotFound { kind: "Execution", .. })
                | Self::Store(StoreError::NotFound { kind: "Execution", .. })
        )
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Join(e.to_string())
    }
}
