//! Session controller configuration.

use std::time::Duration;

/// Delay between two job status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Capacity of the session event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Tunables for a `SessionController`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between the resolution of one status request and the next one.
    pub poll_interval: Duration,
    /// Whether the controller spawns its own poll task. When `false` the
    /// embedder drives polling by calling `poll_tick`.
    pub auto_poll: bool,
    /// Capacity of the event channel returned by `subscribe`.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            auto_poll: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Configuration for an embedder that calls `poll_tick` itself.
    #[must_use]
    pub fn manual() -> Self {
        Self {
            auto_poll: false,
            ..Self::default()
        }
    }
}
