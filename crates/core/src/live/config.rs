//! Live stream configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for live update streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// How often each producer polls its sources (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Wall-clock cutoff for one stream (seconds). When reached the
    /// stream emits a terminal expiry event and stops polling; clients
    /// reconnect to keep watching.
    #[serde(default = "default_max_stream")]
    pub max_stream_secs: u64,

    /// TTL in seconds for relayed collaborative document bytes.
    #[serde(default = "default_doc_ttl")]
    pub doc_ttl_secs: u64,
}

fn default_poll_interval() -> u64 {
    500
}

fn default_max_stream() -> u64 {
    7200 // 2 hours
}

fn default_doc_ttl() -> u64 {
    60
}

impl LiveConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_stream(&self) -> Duration {
        Duration::from_secs(self.max_stream_secs)
    }

    pub fn doc_ttl(&self) -> Duration {
        Duration::from_secs(self.doc_ttl_secs)
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            max_stream_secs: default_max_stream(),
            doc_ttl_secs: default_doc_ttl(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LiveConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.max_stream(), Duration::from_secs(7200));
        assert_eq!(config.doc_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: LiveConfig = toml::from_str("poll_interval_ms = 50").unwrap();
        assert_eq!(config.poll_interval_ms, 50);
        assert_eq!(config.max_stream_secs, 7200);
    }
}
