use tracing::info;

use algobench_core::{
    BenchError, Execution, ExecutionDetail, ExecutionId, Page, PayloadView, ResultId, ResultRecord,
    ResultView, Status,
};
use algobench_storage::{ExecutionFilter, PageRequest};

use crate::error::PipelineError;

use super::Orchestrator;

impl Orchestrator {
    async fn enabled_execution(&self, id: ExecutionId) -> Result<Execution, PipelineError> {
        self.store
            .load_execution(id)
            .await?
            .ok_or_else(|| BenchError::not_found("Execution", id).into())
    }

    async fn enabled_result(&self, id: ResultId) -> Result<ResultRecord, PipelineError> {
        self.store
            .load_result(id)
            .await?
            .ok_or_else(|| BenchError::not_found("Result", id).into())
    }

    // ── Execution corrections ────────────────────────────────────────

    pub async fn set_execution_warning(
        &self,
        id: ExecutionId,
        message: &str,
    ) -> Result<Execution, PipelineError> {
        let mut execution = self.enabled_execution(id).await?;
        execution.set_warning(message);
        self.store.save_execution(&execution).await?;
        info!(execution_id = %id, reason = message, "Execution set to WARNING");
        Ok(execution)
    }

    pub async fn set_execution_error(
        &self,
        id: ExecutionId,
        message: &str,
    ) -> Result<Execution, PipelineError> {
        let mut execution = self.enabled_execution(id).await?;
        execution.set_error(message);
        self.store.save_execution(&execution).await?;
        info!(execution_id = %id, reason = message, "Execution set to ERROR");
        Ok(execution)
    }

    /// Soft delete. The row stays for history but leaves every active query.
    pub async fn disable_execution(&self, id: ExecutionId) -> Result<(), PipelineError> {
        let mut execution = self.enabled_execution(id).await?;
        execution.enabled = false;
        execution.updated_at = chrono::Utc::now();
        self.store.save_execution(&execution).await?;
        info!(execution_id = %id, "Execution disabled");
        Ok(())
    }

    // ── Result corrections ───────────────────────────────────────────

    pub async fn set_result_warning(
        &self,
        id: ResultId,
        message: &str,
    ) -> Result<ResultRecord, PipelineError> {
        let mut result = self.enabled_result(id).await?;
        result.set_warning(message);
        self.store.save_result(&result).await?;
        Ok(result)
    }

    pub async fn set_result_error(
        &self,
        id: ResultId,
        message: &str,
    ) -> Result<ResultRecord, PipelineError> {
        let mut result = self.enabled_result(id).await?;
        result.set_error(message);
        self.store.save_result(&result).await?;
        Ok(result)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn list_executions(
        &self,
        filter: &ExecutionFilter,
        page: PageRequest,
    ) -> Result<Page<Execution>, PipelineError> {
        Ok(self.store.list_executions(filter, page).await?)
    }

    /// Execution with its payload; results are attached only once it is DONE.
    pub async fn get_execution(&self, id: ExecutionId) -> Result<ExecutionDetail, PipelineError> {
        let execution = self.enabled_execution(id).await?;
        let algorithm_name = match self.store.load_algorithm(execution.algorithm_id).await? {
            Some(detail) => detail.algorithm.name,
            None => return Err(BenchError::not_found("Algorithm", execution.algorithm_id).into()),
        };

        let payload = self
            .store
            .load_payload(id)
            .await?
            .into_iter()
            .map(|row| PayloadView {
                input_id: row.input.input_id,
                name: row.input.name,
                value: row.payload.input_value,
            })
            .collect();

        let mut results = Vec::new();
        if execution.status == Status::Done {
            for r in self.store.list_results(id).await? {
                let criteria = match self.store.load_criteria(r.criteria_id).await? {
                    Some(c) => c.name,
                    None => r.criteria_id.to_string(),
                };
                results.push(ResultView {
                    criteria,
                    value: r.value,
                    unit: r.unit,
                    status: r.status,
                    message: r.message,
                });
            }
        }

        Ok(ExecutionDetail {
            execution,
            algorithm_name,
            payload,
            results,
        })
    }
}
