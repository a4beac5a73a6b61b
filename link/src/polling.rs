//! Request/response replacement for the notification stream.

use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{error::Result, transport::NotificationApi};

/// Re-fetches the authoritative unread count on a fixed interval.
///
/// Once a consumer falls back it stays here until torn down. Fetch failures
/// are logged and the tick is skipped; there is no retry in between.
#[derive(Clone)]
pub struct PollingFallback {
    api: Arc<dyn NotificationApi>,
    interval: Duration,
}

impl PollingFallback {
    pub fn new(api: Arc<dyn NotificationApi>, interval: Duration) -> Self {
        Self { api, interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetch once and replace `count` with the result.
    pub async fn refresh(&self, count: &watch::Sender<u64>) -> Result<u64> {
        let value = self.api.fetch_unread_count().await?;
        count.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
        Ok(value)
    }

    /// Poll until `cancel` fires. The first fetch happens immediately.
    pub async fn run(&self, count: &watch::Sender<u64>, cancel: &CancellationToken) {
        log::info!("[POLL] Polling unread count every {:?}", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {},
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = self.refresh(count) => match result {
                    Ok(value) => log::debug!("[POLL] Unread count = {}", value),
                    Err(e) => log::warn!("[POLL] Unread count fetch failed: {}", e),
                },
            }
        }
        log::debug!("[POLL] Unread count polling stopped");
    }
}
