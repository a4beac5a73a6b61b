use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one unread-count consumer.
///
/// ```text
/// Connecting ──open──▶ Open ──error──▶ Error ──budget left──▶ Reconnecting ──open──▶ Open
///                                        │                        │
///                                        └────budget spent────────┴──error──▶ Polling
/// ```
///
/// `Polling` is terminal for the lifetime of the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Open,
    Error,
    Reconnecting,
    Polling,
}

impl ConnectionState {
    /// Whether the consumer is currently fed by the push stream.
    pub fn is_streaming(self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Whether no further stream attempts will be made.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Polling)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Open => "OPEN",
            ConnectionState::Error => "ERROR",
            ConnectionState::Reconnecting => "RECONNECTING",
            ConnectionState::Polling => "POLLING",
        };
        f.write_str(label)
    }
}
