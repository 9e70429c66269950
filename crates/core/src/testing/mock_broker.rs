//! Mock work broker for testing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::broker::{BrokerError, WorkBroker, WorkOrder};

/// A recorded publish for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedPublish {
    /// The queue the order was published to.
    pub queue: String,
    /// The published order.
    pub order: WorkOrder,
    /// When the publish happened.
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the WorkBroker trait.
///
/// Provides controllable behavior for testing:
/// - Record every publish for assertions
/// - Simulate publish failures
///
/// # Example
///
/// ```rust,ignore
/// let broker = MockBroker::new();
///
/// broker.publish("transcribe", &WorkOrder { task_id: "t-1".into() }).await?;
///
/// let published = broker.published().await;
/// assert_eq!(published.len(), 1);
/// assert_eq!(published[0].queue, "transcribe");
/// ```
#[derive(Debug, Default)]
pub struct MockBroker {
    /// Recorded publish calls in order.
    published: Arc<RwLock<Vec<RecordedPublish>>>,
    /// If set, the next publish will fail with this error.
    next_error: Arc<RwLock<Option<BrokerError>>>,
}

impl MockBroker {
    /// Create a new mock broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded publishes, oldest first.
    pub async fn published(&self) -> Vec<RecordedPublish> {
        self.published.read().await.clone()
    }

    /// Get the task ids published to a specific queue, oldest first.
    pub async fn published_to(&self, queue: &str) -> Vec<String> {
        self.published
            .read()
            .await
            .iter()
            .filter(|p| p.queue == queue)
            .map(|p| p.order.task_id.clone())
            .collect()
    }

    /// Count publishes per queue.
    pub async fn queue_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for publish in self.published.read().await.iter() {
            *counts.entry(publish.queue.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Clear recorded publishes.
    pub async fn clear_recorded(&self) {
        self.published.write().await.clear();
    }

    /// Configure the next publish to fail with the given error.
    pub async fn set_next_error(&self, error: BrokerError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl WorkBroker for MockBroker {
    async fn publish(&self, queue: &str, order: &WorkOrder) -> Result<(), BrokerError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        self.published.write().await.push(RecordedPublish {
            queue: queue.to_string(),
            order: order.clone(),
            timestamp: Utc::now(),
        });
        Ok(())
    }
}
