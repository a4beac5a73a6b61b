//! Live unread-notification counter.
//!
//! Mounting a counter starts a background task that drives one consumer
//! through its lifecycle:
//!
//! ```text
//! CONNECTING -> OPEN -(failure)-> ERROR -> RECONNECTING -(delay)-> CONNECTING
//!                                   \
//!                                    `-(budget spent / superseded)-> POLLING
//! ```
//!
//! Exactly one of the stream and the fallback poller feeds the counter at a
//! time. POLLING is terminal until the counter is unmounted and mounted again.
//!
//! Teardown cancels the task, which in turn clears a pending reconnect delay,
//! stops the poll timer and releases the registry lease.

use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    connection::ConnectionRegistry,
    event_handlers::EventHandlers,
    models::{ConnectionOptions, ConnectionState, StreamEndpointKey},
    polling::PollingFallback,
    reconnect::{ReconnectDecision, ReconnectionController},
    stream_client::{StreamClient, StreamExit},
    transport::NotificationApi,
};

/// A mounted unread counter. Dropping it tears the consumer down.
pub struct UnreadCounter {
    key: StreamEndpointKey,
    count: watch::Receiver<u64>,
    state: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl UnreadCounter {
    /// Acquire the stream for `key` and start tracking the count.
    ///
    /// Must be called within a tokio runtime.
    pub fn mount(
        registry: &ConnectionRegistry,
        key: StreamEndpointKey,
        api: Arc<dyn NotificationApi>,
        options: &ConnectionOptions,
        event_handlers: EventHandlers,
    ) -> Self {
        let (count_tx, count) = watch::channel(0u64);
        let (state_tx, state) = watch::channel(ConnectionState::Connecting);
        let cancel = CancellationToken::new();

        let consumer = Consumer {
            registry: registry.clone(),
            key: key.clone(),
            fallback: PollingFallback::new(api, options.fallback_poll_interval()),
            controller: ReconnectionController::new(options),
            count: count_tx,
            state: StatePublisher {
                tx: state_tx,
                event_handlers,
            },
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(consumer.drive());

        Self {
            key,
            count,
            state,
            cancel,
            task: Some(task),
        }
    }

    pub fn key(&self) -> &StreamEndpointKey {
        &self.key
    }

    pub fn count(&self) -> u64 {
        *self.count.borrow()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_count(&self) -> watch::Receiver<u64> {
        self.count.clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Tear down and wait until the timers and the lease are gone.
    pub async fn unmount(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("[fleet-link] Unread counter task ended abnormally: {}", e);
            }
        }
        log::debug!("[fleet-link] Unread counter unmounted from {}", self.key);
    }
}

impl Drop for UnreadCounter {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct StatePublisher {
    tx: watch::Sender<ConnectionState>,
    event_handlers: EventHandlers,
}

impl StatePublisher {
    fn set(&self, next: ConnectionState) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        if changed {
            log::debug!("[fleet-link] Unread counter state -> {}", next);
            self.event_handlers.emit_state_change(next);
        }
    }
}

struct Consumer {
    registry: ConnectionRegistry,
    key: StreamEndpointKey,
    fallback: PollingFallback,
    controller: ReconnectionController,
    count: watch::Sender<u64>,
    state: StatePublisher,
    cancel: CancellationToken,
}

impl Consumer {
    async fn drive(mut self) {
        if !self.stream().await {
            return;
        }
        self.state.set(ConnectionState::Polling);
        self.fallback.run(&self.count, &self.cancel).await;
    }

    /// Stream until the budget is spent. Returns `false` when cancelled.
    async fn stream(&mut self) -> bool {
        loop {
            self.state.set(self.controller.state());

            let client = StreamClient::attach(self.registry.acquire(&self.key))
                .with_resync(self.fallback.clone());
            let controller = &mut self.controller;
            let state = &self.state;
            let exit = client
                .run(&self.count, &self.cancel, || {
                    controller.on_open();
                    state.set(ConnectionState::Open);
                })
                .await;

            match exit {
                StreamExit::Cancelled => return false,
                StreamExit::Superseded | StreamExit::Closed => {
                    log::info!(
                        "[fleet-link] Stream for {} was closed by the registry; polling instead",
                        self.key
                    );
                    self.controller.abandon();
                    return true;
                },
                StreamExit::Failed(message) => {
                    log::debug!("[fleet-link] Stream for {} failed: {}", self.key, message);
                    self.state.set(ConnectionState::Error);
                    match self.controller.on_error() {
                        ReconnectDecision::Exhausted => return true,
                        ReconnectDecision::Retry { delay, .. } => {
                            self.state.set(ConnectionState::Reconnecting);
                            tokio::select! {
                                biased;
                                _ = self.cancel.cancelled() => return false,
                                _ = tokio::time::sleep(delay) => {},
                            }
                            self.controller.on_retry();
                        },
                    }
                },
            }
        }
    }
}
