//! Broker payload types.
//!
//! Decoding worker payloads into these types is the broker adapter's job;
//! the ingestion handlers only ever see the typed forms.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The queue does not exist or has no consumer side.
    #[error("unknown queue: {0}")]
    UnknownQueue(String),

    /// The broker refused or failed the enqueue.
    #[error("publish failed on queue {queue}: {reason}")]
    PublishFailed { queue: String, reason: String },
}

/// Minimal outbound payload: workers look everything else up themselves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkOrder {
    pub task_id: String,
}

impl WorkOrder {
    pub fn new(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
        }
    }
}

/// Inbound events reported by the worker fleet.
///
/// The three shapes map to the three report channels: periodic progress,
/// completion, and failure. Delivery may be duplicated or out of order;
/// every consumer of these must be idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerEvent {
    Progress { task_id: String, progress: f64 },
    Done { task_id: String },
    Error { task_id: String, error: String },
}

impl WorkerEvent {
    pub fn task_id(&self) -> &str {
        match self {
            WorkerEvent::Progress { task_id, .. }
            | WorkerEvent::Done { task_id }
            | WorkerEvent::Error { task_id, .. } => task_id,
        }
    }
}
