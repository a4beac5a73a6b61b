use crate::{
    error::Result,
    models::{AlertNotice, BikeId, SuspiciousMovementEvent},
};

/// Operator-facing side effects of an alert.
///
/// Everything except [`play_cue`](AlertPresenter::play_cue) is infallible;
/// a failed cue is logged by the dispatcher and otherwise ignored.
pub trait AlertPresenter: Send + Sync + 'static {
    /// Audible cue for a new batch.
    fn play_cue(&self) -> Result<()>;

    /// One transient summary for the whole batch.
    fn show_notice(&self, notice: &AlertNotice);

    /// Bring the selected event to the operator's attention.
    fn show_alert(&self, event: &SuspiciousMovementEvent);

    /// The active alert for `bike_id` was resolved.
    fn clear_alert(&self, _bike_id: &BikeId) {}
}

/// Presenter that only writes to the log. Has no audible cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

impl AlertPresenter for LogPresenter {
    fn play_cue(&self) -> Result<()> {
        Ok(())
    }

    fn show_notice(&self, notice: &AlertNotice) {
        log::warn!("[ALERTS] {}", notice.headline);
    }

    fn show_alert(&self, event: &SuspiciousMovementEvent) {
        log::warn!(
            "[ALERTS] Bike {} ({}) moved {:.0} m at {}{}",
            event.bike_code,
            event.bike_id,
            event.distance_moved,
            event.detection_timestamp.to_rfc3339(),
            if event.outside_authorized_zone {
                " outside authorized zone"
            } else {
                ""
            }
        );
    }

    fn clear_alert(&self, bike_id: &BikeId) {
        log::info!("[ALERTS] Alert for bike {} handled", bike_id);
    }
}
