//! One physical push connection, fanned out to every holder of its key.
//!
//! A background task owns the transport stream. It:
//!
//! 1. Opens the stream through the injected [`StreamTransport`]
//! 2. Publishes `Opened` once the handshake succeeds
//! 3. Forwards every raw line, in arrival order, as a `Frame`
//! 4. Publishes `Failed` and exits on a transport error or end of body
//!
//! Holders observe the task through a broadcast channel. Status updates and
//! their events are published under the same lock that [`subscribe`] takes,
//! so a late subscriber either sees `Opened` in its channel or `Open` in the
//! snapshot, never both and never neither.
//!
//! [`subscribe`]: SharedConnection::subscribe

use futures_util::StreamExt;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    error::FleetLinkError,
    event_handlers::{ConnectionError, DisconnectReason, EventHandlers},
    models::StreamEndpointKey,
    transport::StreamTransport,
};

/// Status of the physical connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connecting,
    Open,
    Failed,
    Closed,
}

/// Events delivered to every holder of a connection.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// Handshake completed.
    Opened,
    /// One raw line of the stream body.
    Frame(Arc<str>),
    /// Transport failure or end of stream; the task has exited.
    Failed(String),
    /// Closed because another key took over the registry slot.
    Superseded,
    /// Closed because the registry shut down.
    Closed,
}

/// Why the registry is closing a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseReason {
    /// Last holder released it.
    Released,
    Superseded,
    Shutdown,
}

pub(crate) struct SharedConnection {
    key: StreamEndpointKey,
    status: Arc<Mutex<LinkStatus>>,
    events: broadcast::Sender<LinkEvent>,
    cancel: CancellationToken,
}

impl SharedConnection {
    /// Spawn the connection task. Must be called within a tokio runtime.
    pub(crate) fn spawn(
        key: StreamEndpointKey,
        transport: Arc<dyn StreamTransport>,
        capacity: usize,
        event_handlers: EventHandlers,
    ) -> Self {
        let (events, _) = broadcast::channel(capacity);
        let status = Arc::new(Mutex::new(LinkStatus::Connecting));
        let cancel = CancellationToken::new();

        tokio::spawn(connection_task(
            key.clone(),
            transport,
            status.clone(),
            events.clone(),
            cancel.clone(),
            event_handlers,
        ));

        Self {
            key,
            status,
            events,
            cancel,
        }
    }

    pub(crate) fn key(&self) -> &StreamEndpointKey {
        &self.key
    }

    pub(crate) fn status(&self) -> LinkStatus {
        *self.status.lock()
    }

    /// Connecting or open: new holders may share it.
    pub(crate) fn is_live(&self) -> bool {
        matches!(self.status(), LinkStatus::Connecting | LinkStatus::Open)
    }

    /// Current status plus a receiver for everything published after it.
    pub(crate) fn subscribe(&self) -> (LinkStatus, broadcast::Receiver<LinkEvent>) {
        let status = self.status.lock();
        (*status, self.events.subscribe())
    }

    /// Stop the task; dropping its stream closes the physical connection.
    pub(crate) fn close(&self, reason: CloseReason) {
        {
            let mut status = self.status.lock();
            if *status == LinkStatus::Closed {
                return;
            }
            *status = LinkStatus::Closed;
            let event = match reason {
                CloseReason::Released => None,
                CloseReason::Superseded => Some(LinkEvent::Superseded),
                CloseReason::Shutdown => Some(LinkEvent::Closed),
            };
            if let Some(event) = event {
                let _ = self.events.send(event);
            }
        }
        self.cancel.cancel();
    }
}

impl Drop for SharedConnection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Set the status and publish the matching event, unless already closed.
fn publish(
    status: &Mutex<LinkStatus>,
    events: &broadcast::Sender<LinkEvent>,
    next: LinkStatus,
    event: LinkEvent,
) -> bool {
    let mut current = status.lock();
    if *current == LinkStatus::Closed {
        return false;
    }
    *current = next;
    let _ = events.send(event);
    true
}

fn fail(
    status: &Mutex<LinkStatus>,
    events: &broadcast::Sender<LinkEvent>,
    event_handlers: &EventHandlers,
    message: String,
    recoverable: bool,
) {
    log::warn!("[fleet-link] Notification stream failed: {}", message);
    event_handlers.emit_error(ConnectionError::new(&message, recoverable));
    if publish(status, events, LinkStatus::Failed, LinkEvent::Failed(message.clone())) {
        event_handlers.emit_disconnect(DisconnectReason::new(message));
    }
}

async fn connection_task(
    key: StreamEndpointKey,
    transport: Arc<dyn StreamTransport>,
    status: Arc<Mutex<LinkStatus>>,
    events: broadcast::Sender<LinkEvent>,
    cancel: CancellationToken,
    event_handlers: EventHandlers,
) {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = transport.open(&key) => result,
    };

    let mut stream = match opened {
        Ok(stream) => stream,
        Err(e) => {
            let recoverable = !matches!(e, FleetLinkError::AuthenticationError(_));
            fail(&status, &events, &event_handlers, e.to_string(), recoverable);
            return;
        },
    };

    if !publish(&status, &events, LinkStatus::Open, LinkEvent::Opened) {
        return;
    }
    log::info!("[fleet-link] Notification stream open: {}", key);
    event_handlers.emit_connect();

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                log::debug!("[fleet-link] Closing notification stream {}", key);
                event_handlers.emit_disconnect(DisconnectReason::new("Client closed stream"));
                return;
            }

            line = stream.next() => match line {
                Some(Ok(line)) => {
                    event_handlers.emit_receive(&line);
                    let _ = events.send(LinkEvent::Frame(Arc::from(line)));
                },
                Some(Err(e)) => {
                    fail(&status, &events, &event_handlers, e.to_string(), true);
                    return;
                },
                None => {
                    fail(
                        &status,
                        &events,
                        &event_handlers,
                        "Server closed notification stream".to_string(),
                        true,
                    );
                    return;
                },
            },
        }
    }
}
