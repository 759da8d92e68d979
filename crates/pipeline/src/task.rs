//! Outermost boundary of one asynchronous run.

use tracing::{error, info};

use algobench_core::ExecutionId;

use crate::error::PipelineError;
use crate::orchestrator::{Orchestrator, RunOutcome};

/// Runs an execution and records any escaping failure on it.
pub struct RunTask<'a> {
    orchestrator: &'a Orchestrator,
}

impl<'a> RunTask<'a> {
    pub fn new(orchestrator: &'a Orchestrator) -> Self {
        Self { orchestrator }
    }

    /// Process `id`. On failure the execution is set to ERROR with the error
    /// text and the original error is returned. Only a missing execution is
    /// left untouched; a missing algorithm or criterion still ends in ERROR.
    pub async fn run(&self, id: ExecutionId) -> Result<RunOutcome, PipelineError> {
        match self.orchestrator.run_execution(id).await {
            Ok(outcome) => {
                info!(
                    execution_id = %id,
                    algorithm = %outcome.algorithm,
                    failed_results = outcome.failed_results(),
                    "Execution is done"
                );
                Ok(outcome)
            }
            Err(e) => {
                error!(execution_id = %id, error = %e, "Execution failed");
                if !e.is_missing_execution() {
                    if let Err(mark) = self.orchestrator.set_execution_error(id, &e.to_string()).await {
                        error!(execution_id = %id, error = %mark, "Could not record execution failure");
                    }
                }
                Err(e)
            }
        }
    }
}
