use std::fmt::Debug;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

/// Configuration for the follower's ingress queue and shutdown drain.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReplicationConfig {
    /// Initial capacity of the pending append-entries queue. The queue grows
    /// beyond this without bound; the value only pre-sizes the heap.
    #[serde(default = "default_cached_requests")]
    pub cached_requests: usize,

    /// Interval between queue-emptiness polls while a stopping follower
    /// drains accepted requests.
    #[serde(default = "default_drain_poll_interval_ms")]
    pub drain_poll_interval_ms: u64,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            cached_requests: default_cached_requests(),
            drain_poll_interval_ms: default_drain_poll_interval_ms(),
        }
    }
}

impl ReplicationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cached_requests < 1 {
            return Err(ConfigError::Message(format!(
                "cached_requests must be >= 1, (got {})",
                self.cached_requests
            ))
            .into());
        }
        if self.drain_poll_interval_ms < 1 {
            return Err(ConfigError::Message(format!(
                "drain_poll_interval_ms must be >= 1, (got {})",
                self.drain_poll_interval_ms
            ))
            .into());
        }
        Ok(())
    }
}

fn default_cached_requests() -> usize {
    1024
}

fn default_drain_poll_interval_ms() -> u64 {
    50
}
