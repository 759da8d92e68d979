//! The two ends of the run queue: `RunQueue` hands an execution id to the
//! workers, `QueueConsumer` is how a worker claims and settles it.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use algobench_core::ExecutionId;

use crate::error::QueueError;

/// One claimed run request. `body` is the JSON that [`crate::parse_message`]
/// turns into a [`crate::RunRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMessage {
    pub id: String,
    pub body: String,
    /// Settles the claim through `ack` or `nack`. The local queue mints a new
    /// one per claim; Postgres uses the row's message id.
    pub receipt_handle: String,
    pub timestamp: DateTime<Utc>,
    /// Deliveries so far, this one included once claimed.
    pub attempt_count: u32,
}

/// Snapshot a worker logs before it starts polling.
#[derive(Debug, Clone, Serialize)]
pub struct QueueHealth {
    pub connected: bool,
    /// Runs a poll could claim right now.
    pub visible_runs: Option<u64>,
    pub provider: String,
}

impl fmt::Display for QueueHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.connected { "up" } else { "down" };
        match self.visible_runs {
            Some(n) => write!(f, "{} queue {state}, {n} run(s) waiting", self.provider),
            None => write!(f, "{} queue {state}", self.provider),
        }
    }
}

#[async_trait]
pub trait RunQueue: Send + Sync {
    /// Publish a run for `execution_id`; returns the queue's message id.
    async fn enqueue(&self, execution_id: ExecutionId) -> Result<String, QueueError>;
}

/// Worker side of the run queue.
///
/// A claimed message stays invisible to other pollers until it is acked
/// (the run finished, whatever its status) or nacked (hand it back).
#[async_trait]
pub trait QueueConsumer: Send + Sync {
    /// Claim at most `max_messages` visible runs. Empty when idle.
    async fn poll_batch(&self, max_messages: u32) -> Result<Vec<QueueMessage>, QueueError>;

    async fn ack(&self, receipt_handle: &str) -> Result<(), QueueError>;

    async fn nack(&self, receipt_handle: &str) -> Result<(), QueueError>;

    async fn health_check(&self) -> Result<QueueHealth, QueueError>;
}
