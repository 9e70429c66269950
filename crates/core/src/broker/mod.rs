//! Work queue broker: outbound dispatch to the worker fleet and the typed
//! inbound event funnel the fleet reports back through.

mod channel;
mod types;

pub use channel::ChannelBroker;
pub use types::{BrokerError, WorkOrder, WorkerEvent};

use async_trait::async_trait;

/// Outbound side of the queue broker.
///
/// Publishing is fire-and-forget: the caller waits for a successful
/// enqueue, never for processing. Delivery guarantees beyond that are the
/// broker's own concern.
#[async_trait]
pub trait WorkBroker: Send + Sync {
    /// Publish one work order onto the named queue.
    async fn publish(&self, queue: &str, order: &WorkOrder) -> Result<(), BrokerError>;
}
