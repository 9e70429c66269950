//! Ephemeral status cache shared between the orchestrator, the event
//! ingestion handlers and the live update streams.
//!
//! Every entry carries an explicit TTL, so stale markers self-heal without a
//! cleanup pass. A missing key always means "unknown", never "false" -
//! consumers must treat expiry as the absence of new information.

pub mod keys;
mod memory;

pub use memory::MemoryStatusCache;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for status cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache backend is unreachable or failed internally.
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Keyed read/write/delete/TTL store used as the only channel between the
/// worker fleet and the orchestrator/API processes.
///
/// Writes are last-writer-wins with no ordering guarantee under concurrent
/// writers; the design tolerates this because progress values only need
/// freshness and done/error transitions are monotonic.
#[async_trait]
pub trait StatusCache: Send + Sync {
    /// Set a key with an explicit expiry.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Get a key, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// List all live keys starting with the given prefix.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}
