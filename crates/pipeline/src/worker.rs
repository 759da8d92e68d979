//! Queue-driven worker loop: claims run messages and processes them one at a time.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use algobench_core::config::WorkerConfig;
use algobench_queue::{parse_batch, QueueConsumer, QueueMessage};
use algobench_storage::StoreError;

use crate::error::PipelineError;
use crate::metrics::RunMetrics;
use crate::orchestrator::Orchestrator;
use crate::task::RunTask;

pub struct Worker {
    orchestrator: Orchestrator,
    consumer: Arc<dyn QueueConsumer>,
    config: WorkerConfig,
    metrics: Arc<RwLock<RunMetrics>>,
}

impl Worker {
    pub fn new(orchestrator: Orchestrator, consumer: Arc<dyn QueueConsumer>, config: WorkerConfig) -> Self {
        Self {
            orchestrator,
            consumer,
            config,
            metrics: Arc::new(RwLock::new(RunMetrics::default())),
        }
    }

    /// Snapshot of the run metrics.
    pub fn metrics(&self) -> RunMetrics {
        self.metrics.read().map(|m| m.clone()).unwrap_or_default()
    }

    /// Get an Arc to the metrics (for external reads without cloning).
    pub fn metrics_handle(&self) -> Arc<RwLock<RunMetrics>> {
        Arc::clone(&self.metrics)
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let idle = Duration::from_millis(self.config.poll_interval_ms.max(1));
        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            batch_size = self.config.batch_size,
            "Worker starting"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let handled = match self.poll_once().await {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "Queue poll failed");
                    0
                }
            };

            if handled == 0 {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(idle) => {}
                }
            }
        }

        let m = self.metrics();
        info!(
            runs = m.total_runs(),
            failed = m.runs_failed,
            dropped = m.messages_dropped,
            "Worker stopped"
        );
    }

    /// Claim one batch and process it. Returns the number of messages handled.
    pub async fn poll_once(&self) -> Result<usize, PipelineError> {
        let batch = self.consumer.poll_batch(self.config.batch_size.max(1)).await?;
        if batch.is_empty() {
            return Ok(0);
        }
        debug!(count = batch.len(), "Claimed run messages");

        let (requests, errors) = parse_batch(&batch);
        for (msg, _) in errors {
            self.drop_message(msg).await;
        }

        for (msg, request) in requests {
            if msg.attempt_count > self.config.max_attempts {
                warn!(
                    message_id = %msg.id,
                    execution_id = %request.execution_id,
                    attempts = msg.attempt_count,
                    "Attempt limit reached"
                );
                if let Err(e) = self
                    .orchestrator
                    .set_execution_error(request.execution_id, "Run abandoned after repeated delivery")
                    .await
                {
                    debug!(execution_id = %request.execution_id, error = %e, "Could not mark abandoned run");
                }
                self.drop_message(msg).await;
                continue;
            }

            match RunTask::new(&self.orchestrator).run(request.execution_id).await {
                Ok(outcome) => {
                    if let Ok(mut m) = self.metrics.write() {
                        m.record_run(&outcome.algorithm, outcome.duration);
                    }
                    self.settle(msg, true).await;
                }
                Err(e) => {
                    if let Ok(mut m) = self.metrics.write() {
                        m.record_failure();
                    }
                    // Only a store outage is worth another delivery.
                    let retry = matches!(e, PipelineError::Store(StoreError::Database(_)));
                    self.settle(msg, !retry).await;
                }
            }
        }

        Ok(batch.len())
    }

    async fn drop_message(&self, msg: &QueueMessage) {
        if let Ok(mut m) = self.metrics.write() {
            m.record_dropped();
        }
        self.settle(msg, true).await;
    }

    async fn settle(&self, msg: &QueueMessage, ack: bool) {
        let outcome = if ack {
            self.consumer.ack(&msg.receipt_handle).await
        } else {
            self.consumer.nack(&msg.receipt_handle).await
        };
        if let Err(e) = outcome {
            error!(message_id = %msg.id, ack, error = %e, "Failed to settle queue message");
        }
    }
}
