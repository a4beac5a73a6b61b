//! Consumer side of a shared notification stream.
//!
//! A [`StreamClient`] wraps one [`StreamLease`] and turns the raw lines of
//! the shared connection into unread-count updates, in arrival order:
//!
//! - comment and keep-alive lines are skipped
//! - `unread_count` frames replace the counter
//! - `notification` frames add one to it
//! - malformed frames are logged and dropped; the stream stays open
//! - if the consumer falls behind and frames are skipped, the count is
//!   re-fetched once through the resync poller, when one is attached
//!
//! It returns once the connection fails, is taken over by another key, or
//! the consumer is cancelled. The lease is released when it returns.

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::{
    connection::{LinkEvent, LinkStatus, StreamLease},
    models::{CountUpdate, StreamFrame},
    polling::PollingFallback,
};

/// Why [`StreamClient::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamExit {
    /// Transport failure or end of stream.
    Failed(String),
    /// Another key took over the registry slot.
    Superseded,
    /// The registry closed the connection.
    Closed,
    /// The consumer was torn down.
    Cancelled,
}

pub struct StreamClient {
    lease: StreamLease,
    resync: Option<PollingFallback>,
}

impl StreamClient {
    pub fn attach(lease: StreamLease) -> Self {
        Self {
            lease,
            resync: None,
        }
    }

    /// Re-fetch the authoritative count through `fallback` after skipped frames.
    pub fn with_resync(mut self, fallback: PollingFallback) -> Self {
        self.resync = Some(fallback);
        self
    }

    pub fn lease(&self) -> &StreamLease {
        &self.lease
    }

    /// Apply frames to `count` until the stream ends.
    ///
    /// `on_open` runs once when the handshake completes, or immediately if it
    /// already had when this client attached.
    pub async fn run<F>(
        self,
        count: &watch::Sender<u64>,
        cancel: &CancellationToken,
        mut on_open: F,
    ) -> StreamExit
    where
        F: FnMut(),
    {
        let (status, mut events) = self.lease.subscribe();
        match status {
            LinkStatus::Connecting => {},
            LinkStatus::Open => on_open(),
            LinkStatus::Failed => {
                return StreamExit::Failed("Notification stream failed while connecting".into())
            },
            LinkStatus::Closed => return StreamExit::Closed,
        }

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => return StreamExit::Cancelled,
                event = events.recv() => event,
            };

            match event {
                Ok(LinkEvent::Opened) => on_open(),
                Ok(LinkEvent::Frame(line)) => handle_line(count, &line),
                Ok(LinkEvent::Failed(message)) => return StreamExit::Failed(message),
                Ok(LinkEvent::Superseded) => return StreamExit::Superseded,
                Ok(LinkEvent::Closed) => return StreamExit::Closed,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!(
                        "[fleet-link] Consumer fell behind on {}; {} frame(s) skipped",
                        self.lease.key(),
                        skipped
                    );
                    if let Some(fallback) = &self.resync {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return StreamExit::Cancelled,
                            result = fallback.refresh(count) => match result {
                                Ok(value) => log::debug!("[fleet-link] Count resynced to {}", value),
                                Err(e) => log::warn!("[fleet-link] Count resync failed: {}", e),
                            },
                        }
                    }
                },
                Err(broadcast::error::RecvError::Closed) => {
                    return StreamExit::Failed("Notification stream channel closed".into())
                },
            }
        }
    }
}

fn handle_line(count: &watch::Sender<u64>, line: &str) {
    match StreamFrame::parse_line(line) {
        Ok(Some(frame)) => apply_count_update(count, frame.count_update()),
        Ok(None) => {},
        Err(e) => log::debug!("[fleet-link] Dropping malformed frame: {}", e),
    }
}

/// Apply one update; snapshots replace, notifications add one.
pub fn apply_count_update(count: &watch::Sender<u64>, update: CountUpdate) {
    match update {
        CountUpdate::Snapshot(value) => {
            count.send_if_modified(|current| {
                if *current == value {
                    return false;
                }
                *current = value;
                true
            });
        },
        CountUpdate::Increment => count.send_modify(|current| *current = current.saturating_add(1)),
    }
}
