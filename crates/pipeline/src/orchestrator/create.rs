use chrono::Utc;
use tracing::{info, warn};

use algobench_core::{
    default_alias, sanitize_alias, Execution, NewExecution, Status, INVALID_PAYLOAD_MESSAGE,
};

use crate::error::PipelineError;
use crate::validator::validate_payload;

use super::Orchestrator;

impl Orchestrator {
    /// Validate and persist a new execution without dispatching it.
    ///
    /// An invalid payload still persists the execution, already at ERROR with
    /// no payload rows, so QUEUE is never observable for it.
    pub async fn create_execution(&self, request: NewExecution) -> Result<Execution, PipelineError> {
        let algorithm = self.get_algorithm(request.algorithm_id).await?;

        let alias = request
            .alias
            .as_deref()
            .map(sanitize_alias)
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| default_alias(Utc::now()));
        let mut execution = Execution::new(algorithm.algorithm.algorithm_id, alias);

        let check = validate_payload(&algorithm.inputs, &request.inputs);
        let payload = if check.is_valid() {
            check.into_payload(execution.execution_id)
        } else {
            warn!(
                execution_id = %execution.execution_id,
                algorithm = %algorithm.algorithm.name,
                problems = ?check.problems(),
                "Rejecting payload"
            );
            execution.set_error(INVALID_PAYLOAD_MESSAGE);
            Vec::new()
        };

        self.store.create_execution(&execution, &payload).await?;
        info!(
            execution_id = %execution.execution_id,
            algorithm = %algorithm.algorithm.name,
            status = %execution.status,
            inputs = payload.len(),
            "Execution created"
        );
        Ok(execution)
    }

    /// Create an execution and, when its payload was valid, enqueue it for a worker.
    pub async fn submit(&self, request: NewExecution) -> Result<Execution, PipelineError> {
        let execution = self.create_execution(request).await?;
        if execution.status == Status::Queue {
            let message_id = self.queue.enqueue(execution.execution_id).await?;
            info!(execution_id = %execution.execution_id, %message_id, "Execution enqueued");
        }
        Ok(execution)
    }
}
