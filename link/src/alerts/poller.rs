use std::{collections::HashMap, sync::Arc};

use crate::{
    error::Result,
    models::{AlertKey, BikeId, SuspiciousMovementEvent},
    transport::MonitoringApi,
};

/// Occurrences already surfaced, keyed by (bike, detection time).
///
/// Grows by union on every poll; shrinks only when a bike's alert is handled.
#[derive(Debug, Default, Clone)]
pub struct SeenEventSet {
    entries: HashMap<AlertKey, SuspiciousMovementEvent>,
}

impl SeenEventSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &AlertKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns `true` if the occurrence was not seen before.
    pub fn insert(&mut self, event: SuspiciousMovementEvent) -> bool {
        let key = event.key();
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, event);
        true
    }

    /// Drop every occurrence of `bike_id`. Returns how many were removed.
    pub fn remove_bike(&mut self, bike_id: &BikeId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| &key.bike_id != bike_id);
        before - self.entries.len()
    }

    pub fn events(&self) -> impl Iterator<Item = &SuspiciousMovementEvent> {
        self.entries.values()
    }
}

/// Fetches suspicious movements and forwards each occurrence exactly once.
pub struct AlertPoller {
    api: Arc<dyn MonitoringApi>,
    seen: SeenEventSet,
}

impl AlertPoller {
    pub fn new(api: Arc<dyn MonitoringApi>) -> Self {
        Self {
            api,
            seen: SeenEventSet::new(),
        }
    }

    /// Fetch the current list and return the occurrences not seen before.
    ///
    /// A failed fetch leaves the seen set untouched.
    pub async fn poll(&mut self) -> Result<Vec<SuspiciousMovementEvent>> {
        let events = self.api.fetch_suspicious_movements().await?;
        let fetched = events.len();
        let new_events = self.observe(events);
        log::debug!(
            "[ALERTS] Poll returned {} event(s), {} new (seen={})",
            fetched,
            new_events.len(),
            self.seen.len()
        );
        Ok(new_events)
    }

    /// Merge `events` into the seen set, keeping fetch order.
    pub fn observe(&mut self, events: Vec<SuspiciousMovementEvent>) -> Vec<SuspiciousMovementEvent> {
        events
            .into_iter()
            .filter(|event| self.seen.insert(event.clone()))
            .collect()
    }

    pub fn forget_bike(&mut self, bike_id: &BikeId) -> usize {
        self.seen.remove_bike(bike_id)
    }

    pub fn seen(&self) -> &SeenEventSet {
        &self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::tests::{event, NoMonitoring};

    fn poller() -> AlertPoller {
        AlertPoller::new(Arc::new(NoMonitoring))
    }

    #[test]
    fn test_observe_forwards_once() {
        let mut poller = poller();
        let first = poller.observe(vec![event("1", 0, false)]);
        let second = poller.observe(vec![event("1", 0, false)]);

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(poller.seen().len(), 1);
    }

    #[test]
    fn test_same_bike_new_timestamp_is_new() {
        let mut poller = poller();
        poller.observe(vec![event("1", 0, false)]);
        let next = poller.observe(vec![event("1", 0, false), event("1", 5, false)]);

        assert_eq!(next.len(), 1);
        assert_eq!(next[0].key(), event("1", 5, false).key());
    }

    #[test]
    fn test_duplicates_within_one_batch() {
        let mut poller = poller();
        let new_events = poller.observe(vec![event("1", 0, false), event("1", 0, true)]);
        assert_eq!(new_events.len(), 1);
    }

    #[test]
    fn test_forget_bike_removes_all_occurrences() {
        let mut poller = poller();
        poller.observe(vec![event("1", 0, false), event("1", 5, false), event("2", 0, false)]);

        assert_eq!(poller.forget_bike(&BikeId::new("1")), 2);
        assert_eq!(poller.seen().len(), 1);
        assert_eq!(poller.observe(vec![event("1", 0, false)]).len(), 1);
    }
}
