//! In-process queue for single-binary use and tests.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use algobench_core::ExecutionId;

use crate::consumer::{QueueConsumer, QueueHealth, QueueMessage, RunQueue};
use crate::error::QueueError;
use crate::parser::RunRequest;

#[derive(Default)]
struct State {
    ready: VecDeque<QueueMessage>,
    in_flight: HashMap<String, QueueMessage>,
}

/// FIFO queue held in memory. Claimed messages stay in flight until acked;
/// a nack puts them back at the front.
#[derive(Default)]
pub struct LocalQueue {
    state: Mutex<State>,
}

impl LocalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages waiting to be claimed.
    pub async fn pending(&self) -> usize {
        self.state.lock().await.ready.len()
    }

    /// Messages claimed but not yet acked.
    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.in_flight.len()
    }
}

#[async_trait]
impl RunQueue for LocalQueue {
    async fn enqueue(&self, execution_id: ExecutionId) -> Result<String, QueueError> {
        let id = Uuid::new_v4().to_string();
        let msg = QueueMessage {
            id: id.clone(),
            body: RunRequest::new(execution_id).to_body(),
            receipt_handle: String::new(),
            timestamp: Utc::now(),
            attempt_count: 0,
        };
        self.state.lock().await.ready.push_back(msg);
        debug!(message_id = %id, %execution_id, "Run enqueued");
        Ok(id)
    }
}

#[async_trait]
impl QueueConsumer for LocalQueue {
    async fn poll_batch(&self, max_messages: u32) -> Result<Vec<QueueMessage>, QueueError> {
        let mut state = self.state.lock().await;
        let take = (max_messages as usize).min(state.ready.len());
        let mut claimed = Vec::with_capacity(take);
        for mut msg in state.ready.drain(..take).collect::<Vec<_>>() {
            msg.attempt_count += 1;
            msg.receipt_handle = Uuid::new_v4().to_string();
            state.in_flight.insert(msg.receipt_handle.clone(), msg.clone());
            claimed.push(msg);
        }
        Ok(claimed)
    }

    async fn ack(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.state
            .lock()
            .await
            .in_flight
            .remove(receipt_handle)
            .map(|_| ())
            .ok_or_else(|| QueueError::NotFound(receipt_handle.to_string()))
    }

    async fn nack(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        let msg = state
            .in_flight
            .remove(receipt_handle)
            .ok_or_else(|| QueueError::NotFound(receipt_handle.to_string()))?;
        state.ready.push_front(msg);
        Ok(())
    }

    async fn health_check(&self) -> Result<QueueHealth, QueueError> {
        Ok(QueueHealth {
            connected: true,
            visible_runs: Some(self.pending().await as u64),
            provider: "local".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_message;

    #[tokio::test]
    async fn enqueue_poll_ack() {
        let queue = LocalQueue::new();
        let id = Uuid::new_v4();
        queue.enqueue(id).await.unwrap();

        let batch = queue.poll_batch(10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].attempt_count, 1);
        assert_eq!(parse_message(&batch[0]).unwrap().execution_id, id);
        assert_eq!(queue.in_flight().await, 1);

        queue.ack(&batch[0].receipt_handle).await.unwrap();
        assert_eq!(queue.in_flight().await, 0);
        assert!(queue.poll_batch(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn nack_redelivers_first() {
        let queue = LocalQueue::new();
        let first = Uuid::new_v4();
        queue.enqueue(first).await.unwrap();
        queue.enqueue(Uuid::new_v4()).await.unwrap();

        let batch = queue.poll_batch(1).await.unwrap();
        queue.nack(&batch[0].receipt_handle).await.unwrap();

        let again = queue.poll_batch(1).await.unwrap();
        assert_eq!(parse_message(&again[0]).unwrap().execution_id, first);
        assert_eq!(again[0].attempt_count, 2);
    }

    #[tokio::test]
    async fn unknown_receipt_is_rejected() {
        let queue = LocalQueue::new();
        assert!(matches!(queue.ack("nope").await, Err(QueueError::NotFound(_))));
        let health = queue.health_check().await.unwrap();
        assert_eq!(health.visible_runs, Some(0));
    }
}
