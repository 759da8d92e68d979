//! Parse queue message bodies into [`RunRequest`]s.

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use algobench_core::ExecutionId;

use crate::consumer::QueueMessage;
use crate::error::QueueError;

/// Body of a run message: `{"execution_id": "<uuid>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    #[serde(alias = "id")]
    pub execution_id: ExecutionId,
}

impl RunRequest {
    pub fn new(execution_id: ExecutionId) -> Self {
        Self { execution_id }
    }

    pub fn to_body(&self) -> String {
        // A struct holding one Uuid always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"execution_id":"{}"}}"#, self.execution_id)
        })
    }
}

/// Parse a single queue message body into a [`RunRequest`].
///
/// Accepts either the JSON object form or a bare UUID string.
pub fn parse_message(msg: &QueueMessage) -> Result<RunRequest, QueueError> {
    let body = msg.body.trim();
    if let Ok(id) = Uuid::parse_str(body) {
        return Ok(RunRequest::new(id));
    }

    serde_json::from_str::<RunRequest>(body)
        .map_err(|e| QueueError::Parse(format!("Invalid run request in message {}: {}", msg.id, e)))
}

/// Parse a batch of messages, separating successes from failures.
///
/// Good messages are never blocked by bad ones; each side keeps a reference
/// to its message so the caller can ack it.
pub fn parse_batch(
    messages: &[QueueMessage],
) -> (Vec<(&QueueMessage, RunRequest)>, Vec<(&QueueMessage, QueueError)>) {
    let mut requests = Vec::with_capacity(messages.len());
    let mut errors = Vec::new();

    for msg in messages {
        match parse_message(msg) {
            Ok(req) => requests.push((msg, req)),
            Err(e) => {
                warn!(message_id = %msg.id, error = %e, "Failed to parse queue message");
                errors.push((msg, e));
            }
        }
    }

    (requests, errors)
}
