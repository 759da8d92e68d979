//! Run orchestrator: creates executions, runs them against every bound
//! criterion, and exposes the read/correction operations around them.
//!
//! Split into focused submodules:
//! - `create`: payload validation and execution creation/enqueueing
//! - `run`: the asynchronous processing of one execution
//! - `transitions`: manual status corrections, soft delete and execution queries

mod create;
mod run;
mod transitions;

use std::sync::Arc;

use algobench_compute::{AlgorithmRegistry, EvaluationRegistry};
use algobench_core::{AlgorithmDetail, AlgorithmId, BenchError, Page};
use algobench_queue::RunQueue;
use algobench_storage::{BenchStore, PageRequest};

use crate::error::PipelineError;

pub use run::RunOutcome;

/// Sequences the life of executions. All collaborators are injected.
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn BenchStore>,
    queue: Arc<dyn RunQueue>,
    algorithms: Arc<AlgorithmRegistry>,
    evaluations: Arc<EvaluationRegistry>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn BenchStore>,
        queue: Arc<dyn RunQueue>,
        algorithms: Arc<AlgorithmRegistry>,
        evaluations: Arc<EvaluationRegistry>,
    ) -> Self {
        Self {
            store,
            queue,
            algorithms,
            evaluations,
        }
    }

    pub fn store(&self) -> &Arc<dyn BenchStore> {
        &self.store
    }

    // ── Catalog ──────────────────────────────────────────────────────

    pub async fn list_algorithms(
        &self,
        name: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<AlgorithmDetail>, PipelineError> {
        Ok(self.store.list_algorithms(name, page).await?)
    }

    pub async fn get_algorithm(&self, id: AlgorithmId) -> Result<AlgorithmDetail, PipelineError> {
        self.store
            .load_algorithm(id)
            .await?
            .ok_or_else(|| BenchError::not_found("Algorithm", id).into())
    }
}
