//! PostgreSQL-backed run queue over the `run_queue` table.
//!
//! Claiming bumps `visible_at` past the visibility timeout, so a worker that
//! dies mid-run lets the message reappear. `FOR UPDATE SKIP LOCKED` keeps
//! concurrent workers from claiming the same row.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use algobench_core::ExecutionId;

use crate::consumer::{QueueConsumer, QueueHealth, QueueMessage, RunQueue};
use crate::error::QueueError;
use crate::parser::RunRequest;

#[derive(Debug, FromRow)]
struct QueueRow {
    message_id: Uuid,
    body: String,
    enqueued_at: DateTime<Utc>,
    attempt_count: i32,
}

pub struct PgQueue {
    pool: PgPool,
    visibility_timeout: Duration,
}

impl PgQueue {
    pub fn new(pool: PgPool, visibility_timeout: Duration) -> Self {
        info!(
            visibility_timeout_secs = visibility_timeout.as_secs(),
            "Postgres run queue initialized"
        );
        Self {
            pool,
            visibility_timeout,
        }
    }

    fn parse_handle(receipt_handle: &str) -> Result<Uuid, QueueError> {
        Uuid::parse_str(receipt_handle)
            .map_err(|_| QueueError::NotFound(receipt_handle.to_string()))
    }
}

#[async_trait]
impl RunQueue for PgQueue {
    async fn enqueue(&self, execution_id: ExecutionId) -> Result<String, QueueError> {
        let message_id = Uuid::new_v4();
        sqlx::query("INSERT INTO run_queue (message_id, body) VALUES ($1, $2)")
            .bind(message_id)
            .bind(RunRequest::new(execution_id).to_body())
            .execute(&self.pool)
            .await
            .map_err(|e| QueueError::Enqueue(e.to_string()))?;

        debug!(%message_id, %execution_id, "Run enqueued");
        Ok(message_id.to_string())
    }
}

#[async_trait]
impl QueueConsumer for PgQueue {
    async fn poll_batch(&self, max_messages: u32) -> Result<Vec<QueueMessage>, QueueError> {
        let visibility_secs = self.visibility_timeout.as_secs_f64();

        let rows = sqlx::query_as::<_, QueueRow>(
            "UPDATE run_queue
             SET visible_at = now() + make_interval(secs => $2),
                 attempt_count = attempt_count + 1
             WHERE message_id IN (
                 SELECT message_id FROM run_queue
                 WHERE visible_at <= now()
                 ORDER BY enqueued_at
                 LIMIT $1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING message_id, body, enqueued_at, attempt_count",
        )
        .bind(max_messages as i64)
        .bind(visibility_secs)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| QueueError::Connection(format!("run_queue claim failed: {e}")))?;

        debug!(count = rows.len(), "Claimed run_queue messages");

        let mut messages: Vec<QueueMessage> = rows
            .into_iter()
            .map(|r| QueueMessage {
                id: r.message_id.to_string(),
                body: r.body,
                receipt_handle: r.message_id.to_string(),
                timestamp: r.enqueued_at,
                attempt_count: r.attempt_count.max(0) as u32,
            })
            .collect();
        // RETURNING does not preserve the subquery order.
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn ack(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let id = Self::parse_handle(receipt_handle)?;
        sqlx::query("DELETE FROM run_queue WHERE message_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| QueueError::Ack(format!("run_queue delete failed: {e}")))?;
        Ok(())
    }

    async fn nack(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let id = Self::parse_handle(receipt_handle)?;
        sqlx::query("UPDATE run_queue SET visible_at = now() WHERE message_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| QueueError::Provider(format!("run_queue release failed: {e}")))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<QueueHealth, QueueError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM run_queue WHERE visible_at <= now()")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| QueueError::Connection(format!("run_queue health check failed: {e}")))?;

        Ok(QueueHealth {
            connected: true,
            visible_runs: Some(count.max(0) as u64),
            provider: "postgres".to_string(),
        })
    }
}
