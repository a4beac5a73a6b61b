#![allow(dead_code)]
//! Scripted fakes shared by the integration tests.
//!
//! Nothing here touches the network: the stream transport hands out
//! channel-backed frame streams and the REST seams answer from memory.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use fleet_link::{
    AlertNotice, AlertPresenter, BikeId, FleetLinkError, FrameStream, GeoPoint,
    HandleAlertRequest, MonitoringApi, NotificationApi, Result, StreamEndpointKey,
    StreamTransport, SuspiciousMovementEvent,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub const BASE_URL: &str = "http://fleet.test/api";

pub fn key(token: &str) -> StreamEndpointKey {
    StreamEndpointKey::new(BASE_URL, Some(token.to_string()))
}

/// Yield to spawned tasks until `condition` holds.
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    for _ in 0..2000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("timed out waiting for {}", what);
}

/// Let spawned tasks run without advancing time.
pub async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

// ── stream transport ─────────────────────────────────────────────────────────

/// Server side of one opened stream.
#[derive(Clone)]
pub struct FakeStream {
    tx: mpsc::UnboundedSender<Result<String>>,
}

impl FakeStream {
    pub fn send_line(&self, line: &str) {
        let _ = self.tx.send(Ok(line.to_string()));
    }

    /// Break the stream with a transport error.
    pub fn fail(&self, message: &str) {
        let _ = self.tx.send(Err(FleetLinkError::StreamError(message.to_string())));
    }

    /// Whether the client side dropped the stream.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Default)]
pub struct FakeTransport {
    failures: Mutex<VecDeque<FleetLinkError>>,
    fail_all: AtomicBool,
    streams: Mutex<Vec<FakeStream>>,
    opens: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next open fail.
    pub fn fail_next_open(&self, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .push_back(FleetLinkError::NetworkError(message.to_string()));
    }

    /// Make every open fail from now on.
    pub fn fail_all_opens(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    /// Number of open attempts, successful or not.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Stream handed out by the `index`-th successful open.
    pub fn stream(&self, index: usize) -> FakeStream {
        self.streams.lock().unwrap()[index].clone()
    }

    /// Successful opens whose stream is still held by a client.
    pub fn live_streams(&self) -> usize {
        self.streams
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.is_closed())
            .count()
    }
}

#[async_trait]
impl StreamTransport for FakeTransport {
    async fn open(&self, _key: &StreamEndpointKey) -> Result<FrameStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(FleetLinkError::NetworkError("connection refused".into()));
        }
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.streams.lock().unwrap().push(FakeStream { tx });
        Ok(Box::pin(futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })))
    }
}

// ── REST seams ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeNotificationApi {
    count: AtomicU64,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeNotificationApi {
    pub fn with_count(count: u64) -> Arc<Self> {
        let api = Self::default();
        api.count.store(count, Ordering::SeqCst);
        Arc::new(api)
    }

    pub fn set_count(&self, count: u64) {
        self.count.store(count, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationApi for FakeNotificationApi {
    async fn fetch_unread_count(&self) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FleetLinkError::ServerError {
                status_code: 503,
                message: "unavailable".into(),
            });
        }
        Ok(self.count.load(Ordering::SeqCst))
    }
}

/// Backend that keeps returning the same events until they are replaced,
/// like a monitoring endpoint without acknowledgement.
#[derive(Default)]
pub struct FakeMonitoringApi {
    events: Mutex<Vec<SuspiciousMovementEvent>>,
    fail_fetch: AtomicBool,
    fail_handle: AtomicBool,
    fetches: AtomicUsize,
    handled: Mutex<Vec<HandleAlertRequest>>,
}

impl FakeMonitoringApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_events(&self, events: Vec<SuspiciousMovementEvent>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_handle(&self, fail: bool) {
        self.fail_handle.store(fail, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn handled(&self) -> Vec<HandleAlertRequest> {
        self.handled.lock().unwrap().clone()
    }
}

#[async_trait]
impl MonitoringApi for FakeMonitoringApi {
    async fn fetch_suspicious_movements(&self) -> Result<Vec<SuspiciousMovementEvent>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(FleetLinkError::NetworkError("connection reset".into()));
        }
        Ok(self.events.lock().unwrap().clone())
    }

    async fn handle_alert(&self, request: &HandleAlertRequest) -> Result<()> {
        if self.fail_handle.load(Ordering::SeqCst) {
            return Err(FleetLinkError::ServerError {
                status_code: 500,
                message: "handle-alert failed".into(),
            });
        }
        self.handled.lock().unwrap().push(request.clone());
        Ok(())
    }
}

// ── presenter ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingPresenter {
    pub fail_cue: AtomicBool,
    cues: AtomicUsize,
    notices: Mutex<Vec<AlertNotice>>,
    alerts: Mutex<Vec<SuspiciousMovementEvent>>,
    cleared: Mutex<Vec<BikeId>>,
}

impl RecordingPresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn cues(&self) -> usize {
        self.cues.load(Ordering::SeqCst)
    }

    pub fn notices(&self) -> Vec<AlertNotice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<SuspiciousMovementEvent> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn cleared(&self) -> Vec<BikeId> {
        self.cleared.lock().unwrap().clone()
    }
}

impl AlertPresenter for RecordingPresenter {
    fn play_cue(&self) -> Result<()> {
        self.cues.fetch_add(1, Ordering::SeqCst);
        if self.fail_cue.load(Ordering::SeqCst) {
            return Err(FleetLinkError::InternalError("audio unavailable".into()));
        }
        Ok(())
    }

    fn show_notice(&self, notice: &AlertNotice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn show_alert(&self, event: &SuspiciousMovementEvent) {
        self.alerts.lock().unwrap().push(event.clone());
    }

    fn clear_alert(&self, bike_id: &BikeId) {
        self.cleared.lock().unwrap().push(bike_id.clone());
    }
}

// ── data ─────────────────────────────────────────────────────────────────────

/// Movement of `bike` detected `minute` minutes past 08:00.
pub fn movement(bike: &str, minute: u32, outside_zone: bool) -> SuspiciousMovementEvent {
    SuspiciousMovementEvent {
        bike_id: BikeId::new(bike),
        bike_code: format!("BK-{}", bike),
        current_location: GeoPoint {
            latitude: 10.7769,
            longitude: 106.7009,
        },
        last_known_location: GeoPoint {
            latitude: 10.7801,
            longitude: 106.6990,
        },
        distance_moved: 320.0,
        detection_timestamp: Utc.with_ymd_and_hms(2026, 10, 19, 8, minute, 0).unwrap(),
        outside_authorized_zone: outside_zone,
        bike_status: "AVAILABLE".to_string(),
        last_rider: None,
    }
}
