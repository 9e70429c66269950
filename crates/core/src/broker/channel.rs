//! In-process channel-backed broker.
//!
//! Outbound queues are named tokio mpsc channels a worker side subscribes
//! to; inbound reports funnel through one typed event channel consumed by
//! the orchestrator's ingest loop. A networked broker (e.g. AMQP) would
//! implement [`WorkBroker`] the same way with its client in place of the
//! channels.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{BrokerError, WorkBroker, WorkOrder, WorkerEvent};

/// Channel capacity for each outbound queue.
const QUEUE_CAPACITY: usize = 256;

/// Capacity of the inbound worker event funnel.
const EVENT_CAPACITY: usize = 1024;

/// In-process queue broker.
pub struct ChannelBroker {
    queues: Mutex<HashMap<String, mpsc::Sender<WorkOrder>>>,
    event_tx: mpsc::Sender<WorkerEvent>,
    event_rx: Mutex<Option<mpsc::Receiver<WorkerEvent>>>,
}

impl ChannelBroker {
    pub fn new() -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CAPACITY);
        Self {
            queues: Mutex::new(HashMap::new()),
            event_tx,
            event_rx: Mutex::new(Some(event_rx)),
        }
    }

    /// Open the consumer side of a named queue. Work published to `queue`
    /// after this call is delivered to the returned receiver.
    pub fn subscribe(&self, queue: &str) -> mpsc::Receiver<WorkOrder> {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        self.queues.lock().unwrap().insert(queue.to_string(), tx);
        rx
    }

    /// Sender handed to workers for reporting progress/done/error back.
    pub fn event_sender(&self) -> mpsc::Sender<WorkerEvent> {
        self.event_tx.clone()
    }

    /// Take the inbound event receiver. Consumed once, by the ingest loop.
    pub fn take_event_receiver(&self) -> Option<mpsc::Receiver<WorkerEvent>> {
        self.event_rx.lock().unwrap().take()
    }
}

impl Default for ChannelBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkBroker for ChannelBroker {
    async fn publish(&self, queue: &str, order: &WorkOrder) -> Result<(), BrokerError> {
        let tx = {
            let queues = self.queues.lock().unwrap();
            queues
                .get(queue)
                .cloned()
                .ok_or_else(|| BrokerError::UnknownQueue(queue.to_string()))?
        };

        tx.send(order.clone())
            .await
            .map_err(|e| BrokerError::PublishFailed {
                queue: queue.to_string(),
                reason: e.to_string(),
            })
    }
}
