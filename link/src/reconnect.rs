//! Reconnection budget for a single stream consumer.
//!
//! Counts consecutive stream failures. Each failure either schedules one
//! more attempt after a fixed delay, or exhausts the budget, after which the
//! consumer stays on polling for the rest of its lifetime. A successful open
//! resets the count.

use std::time::Duration;

use crate::models::{ConnectionOptions, ConnectionState};

/// Outcome of a stream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Open the stream again after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// Budget spent; switch to polling.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct ReconnectionController {
    state: ConnectionState,
    attempts: u32,
    max_attempts: u32,
    delay: Duration,
}

impl ReconnectionController {
    pub fn new(options: &ConnectionOptions) -> Self {
        Self {
            state: ConnectionState::Connecting,
            attempts: 0,
            max_attempts: options.max_reconnect_attempts.max(1),
            delay: options.reconnect_delay(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive failures since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Stream completed its handshake.
    pub fn on_open(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.attempts = 0;
        self.state = ConnectionState::Open;
    }

    /// Record a failure and decide what comes next.
    pub fn on_error(&mut self) -> ReconnectDecision {
        if self.state.is_terminal() {
            return ReconnectDecision::Exhausted;
        }

        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            self.state = ConnectionState::Polling;
            log::info!(
                "[fleet-link] Stream failed {} time(s); falling back to polling",
                self.attempts
            );
            ReconnectDecision::Exhausted
        } else {
            self.state = ConnectionState::Reconnecting;
            log::info!(
                "[fleet-link] Stream failed; reconnect attempt {} in {:?}",
                self.attempts,
                self.delay
            );
            ReconnectDecision::Retry {
                attempt: self.attempts,
                delay: self.delay,
            }
        }
    }

    /// Scheduled attempt has started.
    pub fn on_retry(&mut self) {
        if !self.state.is_terminal() {
            self.state = ConnectionState::Connecting;
        }
    }

    /// Give up on streaming without spending the budget.
    pub fn abandon(&mut self) {
        self.state = ConnectionState::Polling;
    }
}
