//! Registry of shared notification stream connections.
//!
//! Holds at most one connection at a time, keyed by [`StreamEndpointKey`],
//! plus the number of outstanding [`StreamLease`]s on it:
//!
//! - `acquire` joins a live connection under the same key, otherwise closes
//!   whatever occupies the slot and opens a new one
//! - dropping (or `release`-ing) the last lease closes the connection
//! - leases carry the generation of the connection they joined, so a lease
//!   outliving a replaced connection cannot decrement its successor
//!
//! The registry is an ordinary value: build it once at startup, hand it to
//! consumers by `Arc`, and call [`ConnectionRegistry::shutdown`] on exit.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;

use super::shared::{CloseReason, LinkEvent, LinkStatus, SharedConnection};
use crate::{
    event_handlers::EventHandlers,
    models::{ConnectionOptions, StreamEndpointKey},
    transport::StreamTransport,
};

struct RegistryEntry {
    generation: u64,
    ref_count: usize,
    connection: Arc<SharedConnection>,
}

#[derive(Default)]
struct RegistryState {
    entry: Option<RegistryEntry>,
    next_generation: u64,
}

struct RegistryInner {
    transport: Arc<dyn StreamTransport>,
    event_handlers: EventHandlers,
    channel_capacity: usize,
    state: Mutex<RegistryState>,
}

impl RegistryInner {
    fn release(&self, key: &StreamEndpointKey, generation: u64) {
        let mut state = self.state.lock();
        let last = match state.entry.as_mut() {
            Some(entry) if entry.generation == generation => {
                entry.ref_count = entry.ref_count.saturating_sub(1);
                entry.ref_count == 0
            },
            _ => {
                log::debug!(
                    "[fleet-link] Ignoring stale release for {} (gen={})",
                    key,
                    generation
                );
                return;
            },
        };

        if last {
            if let Some(entry) = state.entry.take() {
                log::debug!("[fleet-link] Last holder released {}; closing stream", key);
                entry.connection.close(CloseReason::Released);
            }
        }
    }
}

/// Table of shared notification stream connections.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

impl ConnectionRegistry {
    /// Registry with default channel capacity and no event handlers.
    pub fn new(transport: Arc<dyn StreamTransport>) -> Self {
        Self::with_options(transport, &ConnectionOptions::default(), EventHandlers::default())
    }

    pub fn with_options(
        transport: Arc<dyn StreamTransport>,
        options: &ConnectionOptions,
        event_handlers: EventHandlers,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                transport,
                event_handlers,
                channel_capacity: options.channel_capacity(),
                state: Mutex::new(RegistryState::default()),
            }),
        }
    }

    /// Join the live connection for `key`, or open a new one.
    ///
    /// Opening happens on a background task; the returned lease reports the
    /// handshake through its event channel. Must be called within a tokio
    /// runtime.
    pub fn acquire(&self, key: &StreamEndpointKey) -> StreamLease {
        let mut state = self.inner.state.lock();

        if let Some(entry) = state.entry.as_mut() {
            if entry.connection.key() == key && entry.connection.is_live() {
                entry.ref_count += 1;
                log::debug!(
                    "[fleet-link] Sharing stream {} (holders={})",
                    key,
                    entry.ref_count
                );
                return self.lease(key, entry.generation, entry.connection.clone());
            }
        }

        if let Some(stale) = state.entry.take() {
            let reason = if stale.connection.key() == key {
                CloseReason::Released
            } else {
                CloseReason::Superseded
            };
            log::info!(
                "[fleet-link] Replacing stream {} ({:?}, holders={})",
                stale.connection.key(),
                reason,
                stale.ref_count
            );
            stale.connection.close(reason);
        }

        let generation = state.next_generation;
        state.next_generation += 1;
        let connection = Arc::new(SharedConnection::spawn(
            key.clone(),
            self.inner.transport.clone(),
            self.inner.channel_capacity,
            self.inner.event_handlers.clone(),
        ));
        state.entry = Some(RegistryEntry {
            generation,
            ref_count: 1,
            connection: connection.clone(),
        });

        self.lease(key, generation, connection)
    }

    /// Give a lease back. Equivalent to dropping it.
    pub fn release(&self, lease: StreamLease) {
        drop(lease);
    }

    /// Number of leases held on the live connection for `key`.
    pub fn ref_count(&self, key: &StreamEndpointKey) -> usize {
        let state = self.inner.state.lock();
        match &state.entry {
            Some(entry) if entry.connection.key() == key => entry.ref_count,
            _ => 0,
        }
    }

    /// Whether the connection for `key` has completed its handshake.
    pub fn is_open(&self, key: &StreamEndpointKey) -> bool {
        let state = self.inner.state.lock();
        matches!(
            &state.entry,
            Some(entry) if entry.connection.key() == key
                && entry.connection.status() == LinkStatus::Open
        )
    }

    /// Whether any connection currently occupies the registry.
    pub fn has_connection(&self) -> bool {
        self.inner.state.lock().entry.is_some()
    }

    /// Close the current connection regardless of holders.
    pub fn shutdown(&self) {
        let entry = self.inner.state.lock().entry.take();
        if let Some(entry) = entry {
            log::info!(
                "[fleet-link] Registry shutdown; closing {} (holders={})",
                entry.connection.key(),
                entry.ref_count
            );
            entry.connection.close(CloseReason::Shutdown);
        }
    }

    fn lease(
        &self,
        key: &StreamEndpointKey,
        generation: u64,
        connection: Arc<SharedConnection>,
    ) -> StreamLease {
        StreamLease {
            key: key.clone(),
            generation,
            connection,
            registry: Arc::downgrade(&self.inner),
        }
    }
}

/// One consumer's hold on a shared connection. Released on drop.
pub struct StreamLease {
    key: StreamEndpointKey,
    generation: u64,
    connection: Arc<SharedConnection>,
    registry: Weak<RegistryInner>,
}

impl StreamLease {
    pub fn key(&self) -> &StreamEndpointKey {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> LinkStatus {
        self.connection.status()
    }

    pub(crate) fn subscribe(&self) -> (LinkStatus, broadcast::Receiver<LinkEvent>) {
        self.connection.subscribe()
    }
}

impl std::fmt::Debug for StreamLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamLease")
            .field("key", &self.key)
            .field("generation", &self.generation)
            .field("status", &self.connection.status())
            .finish()
    }
}

impl Drop for StreamLease {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.release(&self.key, self.generation);
        }
    }
}
