use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use algobench_compute::{Algorithm, EvaluationContext, EvaluationError, Evaluator, Measurement};
use algobench_core::{
    BenchError, Criteria, Execution, ExecutionId, Params, PayloadEntry, ResultRecord, Status,
};

use crate::error::PipelineError;

use super::Orchestrator;

/// What one processed execution ended up as.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub execution: Execution,
    pub algorithm: String,
    pub results: Vec<ResultRecord>,
    pub duration: Duration,
}

impl RunOutcome {
    pub fn failed_results(&self) -> usize {
        self.results.iter().filter(|r| r.status == Status::Error).count()
    }
}

impl Orchestrator {
    /// Process one queued execution end to end.
    ///
    /// Every bound criterion gets its own result row; a failing evaluator marks
    /// only its row ERROR. Errors returned from here are infrastructure or
    /// configuration failures and leave the execution wherever it stopped;
    /// [`crate::task::RunTask`] records them on the execution.
    pub async fn run_execution(&self, id: ExecutionId) -> Result<RunOutcome, PipelineError> {
        let started = Instant::now();

        let mut execution = self
            .store
            .load_execution(id)
            .await?
            .ok_or_else(|| BenchError::not_found("Execution", id))?;

        execution.set_processing();
        self.store.save_execution(&execution).await?;
        info!(execution_id = %id, "Execution processing");

        // Re-materialize the run context.
        let algorithm = self.get_algorithm(execution.algorithm_id).await?;
        let name = algorithm.algorithm.name.clone();
        let implementation = self.algorithms.get(&name)?;
        let payload: Vec<PayloadEntry> = self
            .store
            .load_payload(id)
            .await?
            .iter()
            .map(PayloadEntry::from_persisted)
            .collect();
        let criteria = self.store.criteria_for_algorithm(execution.algorithm_id).await?;
        let evaluators = criteria
            .into_iter()
            .map(|c| self.evaluations.get(&c.name).map(|e| (c, e)))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            execution_id = %id,
            algorithm = %name,
            inputs = payload.len(),
            criteria = evaluators.len(),
            "Run context loaded"
        );

        let payload = Arc::new(payload);
        let extended = {
            let implementation = Arc::clone(&implementation);
            let payload = Arc::clone(&payload);
            tokio::task::spawn_blocking(move || implementation.setup(&payload)).await??
        };
        let extended = Arc::new(extended);

        let mut results = Vec::with_capacity(evaluators.len());
        for (criteria, evaluator) in evaluators {
            let result = self
                .evaluate_criterion(&execution, &criteria, evaluator, &implementation, &payload, &extended)
                .await?;
            results.push(result);
        }

        if !results.is_empty() && results.iter().all(|r| r.status == Status::Error) {
            warn!(execution_id = %id, algorithm = %name, "Every criterion failed");
        }

        execution.set_done();
        self.store.save_execution(&execution).await?;

        let duration = started.elapsed();
        info!(
            execution_id = %id,
            algorithm = %name,
            results = results.len(),
            duration_ms = duration.as_millis() as u64,
            "Execution done"
        );

        Ok(RunOutcome {
            execution,
            algorithm: name,
            results,
            duration,
        })
    }

    async fn evaluate_criterion(
        &self,
        execution: &Execution,
        criteria: &Criteria,
        evaluator: Arc<dyn Evaluator>,
        algorithm: &Arc<dyn Algorithm>,
        payload: &Arc<Vec<PayloadEntry>>,
        extended: &Arc<Vec<PayloadEntry>>,
    ) -> Result<ResultRecord, PipelineError> {
        let mut result = ResultRecord::new(execution.execution_id, criteria.criteria_id);
        self.store.insert_result(&result).await?;
        result.set_processing();
        self.store.save_result(&result).await?;
        debug!(execution_id = %execution.execution_id, criteria = %criteria.name, "Evaluating criterion");

        let outcome = measure(
            evaluator,
            Arc::clone(algorithm),
            Arc::clone(payload),
            Arc::clone(extended),
        )
        .await;

        match outcome {
            Ok(m) => {
                debug!(
                    execution_id = %execution.execution_id,
                    criteria = %criteria.name,
                    value = ?m.value,
                    unit = ?m.unit,
                    "Criterion done"
                );
                result.set_done(m.value, m.unit, m.message);
            }
            Err(e) => {
                warn!(
                    execution_id = %execution.execution_id,
                    criteria = %criteria.name,
                    error = %e,
                    "Criterion failed"
                );
                result.set_error(e.to_string());
            }
        }

        self.store.save_result(&result).await?;
        Ok(result)
    }
}

/// Run one evaluator on the blocking pool. A panic inside it becomes an error.
async fn measure(
    evaluator: Arc<dyn Evaluator>,
    algorithm: Arc<dyn Algorithm>,
    payload: Arc<Vec<PayloadEntry>>,
    extended: Arc<Vec<PayloadEntry>>,
) -> Result<Measurement, EvaluationError> {
    tokio::task::spawn_blocking(move || -> Result<Measurement, EvaluationError> {
        let params = Params::from_payload(&extended)?;
        let ctx = EvaluationContext {
            payload: payload.as_slice(),
            params: &params,
        };
        evaluator.evaluate(algorithm.as_ref(), &ctx)
    })
    .await
    .map_err(|e| EvaluationError::Failed(format!("evaluation aborted: {e}")))?
}
