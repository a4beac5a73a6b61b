use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delivery policy for the notification stream and the pollers.
///
/// Controls:
/// - the fixed delay between stream reconnection attempts
/// - how many consecutive stream failures are tolerated before the consumer
///   switches to polling for good
/// - the polling intervals of the count fallback and the security poll
///
/// # Example
///
/// ```rust
/// use fleet_link::ConnectionOptions;
///
/// let options = ConnectionOptions::default()
///     .with_reconnect_delay_ms(2000)
///     .with_max_reconnect_attempts(3);
/// assert_eq!(options.reconnect_delay().as_millis(), 2000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Fixed delay between stream reconnection attempts.
    /// Default: 5000ms
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// Consecutive stream failures tolerated before switching to polling.
    /// Default: 2. `0` behaves like `1`: the first failure ends streaming.
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// Interval of the unread-count fallback poll.
    /// Default: 60000ms
    #[serde(default = "default_fallback_poll_interval_ms")]
    pub fallback_poll_interval_ms: u64,

    /// Interval of the suspicious-movement poll.
    /// Default: 30000ms
    #[serde(default = "default_security_poll_interval_ms")]
    pub security_poll_interval_ms: u64,

    /// Per-connection fan-out buffer for raw frames.
    /// Default: 256
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

fn default_max_reconnect_attempts() -> u32 {
    2
}

fn default_fallback_poll_interval_ms() -> u64 {
    60_000
}

fn default_security_poll_interval_ms() -> u64 {
    30_000
}

fn default_event_channel_capacity() -> usize {
    256
}

/// Lower bound applied to every polling interval so a zero value from a
/// config file cannot turn a poller into a busy loop.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
            fallback_poll_interval_ms: default_fallback_poll_interval_ms(),
            security_poll_interval_ms: default_security_poll_interval_ms(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl ConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reconnect_delay_ms(mut self, delay_ms: u64) -> Self {
        self.reconnect_delay_ms = delay_ms;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, max_attempts: u32) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self
    }

    pub fn with_fallback_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.fallback_poll_interval_ms = interval_ms;
        self
    }

    pub fn with_security_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.security_poll_interval_ms = interval_ms;
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn fallback_poll_interval(&self) -> Duration {
        Duration::from_millis(self.fallback_poll_interval_ms).max(MIN_POLL_INTERVAL)
    }

    pub fn security_poll_interval(&self) -> Duration {
        Duration::from_millis(self.security_poll_interval_ms).max(MIN_POLL_INTERVAL)
    }

    /// Broadcast channels reject a zero capacity.
    pub(crate) fn channel_capacity(&self) -> usize {
        self.event_channel_capacity.max(1)
    }
}
