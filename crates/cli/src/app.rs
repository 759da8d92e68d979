use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use algobench_compute::{AlgorithmRegistry, EvaluationRegistry};
use algobench_core::Config;
use algobench_pipeline::{Orchestrator, ReportAggregator};
use algobench_queue::{LocalQueue, PgQueue, QueueConsumer, RunQueue};
use algobench_storage::{BenchStore, MemoryStore, PgStore};

/// Wired pipeline for one CLI invocation.
pub struct App {
    pub orchestrator: Orchestrator,
    pub reports: ReportAggregator,
    pub consumer: Arc<dyn QueueConsumer>,
    pub backend: &'static str,
}

impl App {
    /// Postgres store and queue when configured (and not overridden),
    /// otherwise the seeded in-memory store with a local queue.
    pub async fn connect(config: &Config, force_memory: bool) -> Result<Self> {
        let store: Arc<dyn BenchStore>;
        let queue: Arc<dyn RunQueue>;
        let consumer: Arc<dyn QueueConsumer>;
        let backend;

        if config.postgres.is_configured() && !force_memory {
            let pg = PgStore::connect(&config.postgres)
                .await
                .context("failed to connect to PostgreSQL")?;
            let pg_queue = Arc::new(PgQueue::new(
                pg.pool().clone(),
                Duration::from_secs(config.worker.visibility_timeout_secs),
            ));
            store = Arc::new(pg);
            queue = pg_queue.clone();
            consumer = pg_queue;
            backend = "postgres";
        } else {
            let local = Arc::new(LocalQueue::new());
            store = Arc::new(MemoryStore::seeded().await);
            queue = local.clone();
            consumer = local;
            backend = "memory";
        }
        info!(backend, "Store ready");

        let algorithms = Arc::new(AlgorithmRegistry::builtin(config.evaluation.max_graph_nodes));
        let evaluations = Arc::new(EvaluationRegistry::builtin(&config.evaluation));
        let orchestrator = Orchestrator::new(Arc::clone(&store), queue, algorithms, evaluations);
        let reports = ReportAggregator::new(store, config.report.clone());

        Ok(Self {
            orchestrator,
            reports,
            consumer,
            backend,
        })
    }
}
