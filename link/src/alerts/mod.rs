//! Security alert delivery.
//!
//! This module contains:
//! - [`poller`]: fetches suspicious movements and deduplicates occurrences
//! - [`dispatcher`]: picks the active alert, drives the presenter, records
//!   operator resolution
//! - [`presenter`]: the side-effect capability injected into the dispatcher
//!
//! [`AlertMonitor`] runs the poller on its own timer, independent of the
//! notification stream.

pub mod dispatcher;
pub mod poller;
pub mod presenter;

pub use dispatcher::AlertDispatcher;
pub use poller::{AlertPoller, SeenEventSet};
pub use presenter::{AlertPresenter, LogPresenter};

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tokio_util::sync::CancellationToken;

use crate::{
    error::Result,
    models::{BikeId, ConnectionOptions, SuspiciousMovementEvent},
    transport::MonitoringApi,
};

struct AlertDesk {
    poller: AlertPoller,
    dispatcher: AlertDispatcher,
    active: watch::Sender<Option<SuspiciousMovementEvent>>,
}

impl AlertDesk {
    async fn cycle(&mut self) -> Result<usize> {
        let new_events = self.poller.poll().await?;
        if !new_events.is_empty() {
            self.dispatcher.dispatch(&new_events);
            self.publish_active();
        }
        Ok(new_events.len())
    }

    fn publish_active(&self) {
        let next = self.dispatcher.active_alert().cloned();
        self.active.send_if_modified(|current| {
            let unchanged = current.as_ref().map(|e| e.key()) == next.as_ref().map(|e| e.key());
            if unchanged {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// A mounted security alert monitor. Dropping it stops polling.
pub struct AlertMonitor {
    desk: Arc<Mutex<AlertDesk>>,
    active: watch::Receiver<Option<SuspiciousMovementEvent>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AlertMonitor {
    /// Start polling on `options.security_poll_interval()`; the first poll
    /// runs immediately. Must be called within a tokio runtime.
    pub fn mount(
        api: Arc<dyn MonitoringApi>,
        presenter: Arc<dyn AlertPresenter>,
        options: &ConnectionOptions,
    ) -> Self {
        let (active_tx, active) = watch::channel(None);
        let desk = Arc::new(Mutex::new(AlertDesk {
            poller: AlertPoller::new(api.clone()),
            dispatcher: AlertDispatcher::new(api, presenter),
            active: active_tx,
        }));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            desk.clone(),
            options.security_poll_interval(),
            cancel.clone(),
        ));

        Self {
            desk,
            active,
            cancel,
            task: Some(task),
        }
    }

    pub fn active_alert(&self) -> Option<SuspiciousMovementEvent> {
        self.active.borrow().clone()
    }

    pub fn watch_active(&self) -> watch::Receiver<Option<SuspiciousMovementEvent>> {
        self.active.clone()
    }

    /// Number of occurrences currently remembered as seen.
    pub async fn seen_count(&self) -> usize {
        self.desk.lock().await.poller.seen().len()
    }

    /// Poll now instead of waiting for the next tick. Returns how many new
    /// events were surfaced.
    pub async fn poll_now(&self) -> Result<usize> {
        self.desk.lock().await.cycle().await
    }

    /// Resolve the alert for `bike_id` on the backend.
    ///
    /// On success every seen occurrence of the bike is forgotten and the
    /// active alert is cleared if it was for this bike. On failure nothing
    /// changes and the error is returned.
    pub async fn mark_handled(
        &self,
        bike_id: &BikeId,
        action: &str,
        note: Option<String>,
    ) -> Result<usize> {
        let mut desk = self.desk.lock().await;
        let AlertDesk {
            poller, dispatcher, ..
        } = &mut *desk;
        let removed = dispatcher.mark_handled(poller, bike_id, action, note).await?;
        desk.publish_active();
        Ok(removed)
    }

    /// Clear the active alert locally.
    pub async fn dismiss(&self) -> Option<SuspiciousMovementEvent> {
        let mut desk = self.desk.lock().await;
        let dismissed = desk.dispatcher.dismiss();
        desk.publish_active();
        dismissed
    }

    /// Stop polling and wait for the timer task to exit.
    pub async fn unmount(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("[ALERTS] Alert poll task ended abnormally: {}", e);
            }
        }
        log::debug!("[ALERTS] Alert monitor unmounted");
    }
}

impl Drop for AlertMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop(desk: Arc<Mutex<AlertDesk>>, period: Duration, cancel: CancellationToken) {
    log::info!("[ALERTS] Polling suspicious movements every {:?}", period);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {},
        }

        let mut guard = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            locked = desk.lock() => locked,
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = guard.cycle() => {
                if let Err(e) = result {
                    log::warn!("[ALERTS] Suspicious movement poll failed: {}", e);
                }
            },
        }
    }
    log::debug!("[ALERTS] Suspicious movement polling stopped");
}
