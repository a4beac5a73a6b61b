use std::sync::Arc;

use super::{poller::AlertPoller, presenter::AlertPresenter};
use crate::{
    error::Result,
    models::{AlertNotice, BikeId, HandleAlertRequest, SuspiciousMovementEvent},
    transport::MonitoringApi,
};

/// Pick the event to put in front of the operator: the first one outside an
/// authorized zone, else the first one.
pub fn select(batch: &[SuspiciousMovementEvent]) -> Option<&SuspiciousMovementEvent> {
    batch
        .iter()
        .find(|event| event.outside_authorized_zone)
        .or_else(|| batch.first())
}

/// Presents new alerts and records their resolution.
pub struct AlertDispatcher {
    api: Arc<dyn MonitoringApi>,
    presenter: Arc<dyn AlertPresenter>,
    active: Option<SuspiciousMovementEvent>,
}

impl AlertDispatcher {
    pub fn new(api: Arc<dyn MonitoringApi>, presenter: Arc<dyn AlertPresenter>) -> Self {
        Self {
            api,
            presenter,
            active: None,
        }
    }

    pub fn active_alert(&self) -> Option<&SuspiciousMovementEvent> {
        self.active.as_ref()
    }

    /// Surface a batch of new events. An empty batch does nothing.
    ///
    /// The selection replaces any alert that is already active.
    pub fn dispatch(&mut self, batch: &[SuspiciousMovementEvent]) -> Option<&SuspiciousMovementEvent> {
        let selected = select(batch)?.clone();
        log::info!(
            "[ALERTS] {} new event(s); active alert -> {}",
            batch.len(),
            selected.key()
        );

        if let Err(e) = self.presenter.play_cue() {
            log::warn!("[ALERTS] Alert cue failed: {}", e);
        }
        self.presenter.show_notice(&AlertNotice::summarize(batch));
        self.presenter.show_alert(&selected);

        self.active = Some(selected);
        self.active.as_ref()
    }

    /// Report the operator's action and forget every occurrence of the bike.
    ///
    /// Nothing changes locally if the backend call fails; the error is
    /// returned so the operator can retry.
    pub async fn mark_handled(
        &mut self,
        poller: &mut AlertPoller,
        bike_id: &BikeId,
        action: &str,
        note: Option<String>,
    ) -> Result<usize> {
        let request = HandleAlertRequest::new(bike_id.clone(), action, note);
        if let Err(e) = self.api.handle_alert(&request).await {
            log::warn!("[ALERTS] Failed to mark bike {} handled: {}", bike_id, e);
            return Err(e);
        }

        let removed = poller.forget_bike(bike_id);
        if self.active.as_ref().is_some_and(|event| &event.bike_id == bike_id) {
            self.active = None;
            self.presenter.clear_alert(bike_id);
        }
        log::info!(
            "[ALERTS] Bike {} handled with '{}'; {} occurrence(s) forgotten",
            bike_id,
            action,
            removed
        );
        Ok(removed)
    }

    /// Clear the active alert without contacting the backend.
    pub fn dismiss(&mut self) -> Option<SuspiciousMovementEvent> {
        self.active.take()
    }
}
