//! UnreadCounter lifecycle: streaming, bounded reconnection, polling fallback
//! and teardown. Time is paused so the 5 s and 60 s timers run instantly.

use fleet_link::{
    ConnectionOptions, ConnectionRegistry, ConnectionState, EventHandlers, UnreadCounter,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout};

mod common;
use common::{key, settle, FakeNotificationApi, FakeTransport};

const LONG: Duration = Duration::from_secs(600);

struct Harness {
    transport: Arc<FakeTransport>,
    registry: ConnectionRegistry,
    api: Arc<FakeNotificationApi>,
}

impl Harness {
    fn new() -> Self {
        let transport = FakeTransport::new();
        Self {
            registry: ConnectionRegistry::new(transport.clone()),
            transport,
            api: FakeNotificationApi::with_count(11),
        }
    }

    fn mount(&self, token: &str) -> UnreadCounter {
        self.mount_with(token, EventHandlers::default())
    }

    fn mount_with(&self, token: &str, handlers: EventHandlers) -> UnreadCounter {
        UnreadCounter::mount(
            &self.registry,
            key(token),
            self.api.clone(),
            &ConnectionOptions::default(),
            handlers,
        )
    }
}

async fn wait_state(counter: &UnreadCounter, state: ConnectionState) {
    let mut rx = counter.watch_state();
    timeout(LONG, rx.wait_for(|s| *s == state))
        .await
        .unwrap_or_else(|_| panic!("never reached {}", state))
        .unwrap();
}

async fn wait_count(counter: &UnreadCounter, count: u64) {
    let mut rx = counter.watch_count();
    timeout(LONG, rx.wait_for(|c| *c == count))
        .await
        .unwrap_or_else(|_| panic!("count never reached {}", count))
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_then_notification() {
    let h = Harness::new();
    let counter = h.mount("op");
    wait_state(&counter, ConnectionState::Open).await;

    let stream = h.transport.stream(0);
    stream.send_line(": connected");
    stream.send_line(r#"{"type":"unread_count","count":7}"#);
    wait_count(&counter, 7).await;

    stream.send_line(r#"data: {"type":"notification","id":"n-1","title":"Refund approved"}"#);
    wait_count(&counter, 8).await;

    counter.unmount().await;
    assert_eq!(h.api.calls(), 0, "count endpoint is not used while streaming");
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frame_keeps_stream_open() {
    let h = Harness::new();
    let counter = h.mount("op");
    wait_state(&counter, ConnectionState::Open).await;

    let stream = h.transport.stream(0);
    stream.send_line("{this is not json");
    stream.send_line(r#"{"type":"mystery"}"#);
    stream.send_line(r#"{"type":"unread_count","count":3}"#);
    wait_count(&counter, 3).await;

    assert_eq!(counter.state(), ConnectionState::Open);
    assert_eq!(h.transport.opens(), 1);
    assert!(!stream.is_closed());
    counter.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_two_failures_switch_to_polling() {
    let h = Harness::new();
    h.transport.fail_all_opens();

    let counter = h.mount("op");
    wait_state(&counter, ConnectionState::Polling).await;
    assert_eq!(h.transport.opens(), 2);

    // Polling fetches immediately on entry.
    wait_count(&counter, 11).await;

    h.api.set_count(4);
    sleep(Duration::from_secs(61)).await;
    settle().await;
    assert_eq!(counter.count(), 4);

    sleep(Duration::from_secs(600)).await;
    assert_eq!(h.transport.opens(), 2, "no stream attempts after POLLING");
    assert_eq!(counter.state(), ConnectionState::Polling);
    counter.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_waits_fixed_delay() {
    let h = Harness::new();
    h.transport.fail_next_open("refused");

    let counter = h.mount("op");
    wait_state(&counter, ConnectionState::Reconnecting).await;
    assert_eq!(h.transport.opens(), 1);

    sleep(Duration::from_millis(4900)).await;
    assert_eq!(h.transport.opens(), 1, "retried before the delay elapsed");

    wait_state(&counter, ConnectionState::Open).await;
    assert_eq!(h.transport.opens(), 2);
    counter.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_successful_open_resets_budget() {
    let h = Harness::new();
    let counter = h.mount("op");
    wait_state(&counter, ConnectionState::Open).await;

    // Fail, recover, fail again: two failures but never consecutive.
    h.transport.stream(0).fail("reset");
    wait_state(&counter, ConnectionState::Reconnecting).await;
    wait_state(&counter, ConnectionState::Open).await;

    h.transport.stream(1).fail("reset");
    wait_state(&counter, ConnectionState::Reconnecting).await;
    wait_state(&counter, ConnectionState::Open).await;

    assert_eq!(h.transport.opens(), 3);
    assert_eq!(h.api.calls(), 0);
    counter.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_state_hook_sequence() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handlers = EventHandlers::new().on_state_change({
        let seen = seen.clone();
        move |state| seen.lock().unwrap().push(state)
    });

    let h = Harness::new();
    h.transport.fail_all_opens();
    let counter = h.mount_with("op", handlers);
    wait_state(&counter, ConnectionState::Polling).await;

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ConnectionState::Error,
            ConnectionState::Reconnecting,
            ConnectionState::Connecting,
            ConnectionState::Error,
            ConnectionState::Polling,
        ]
    );
    counter.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_unmount_stops_polling() {
    let h = Harness::new();
    h.transport.fail_all_opens();
    let counter = h.mount("op");
    wait_state(&counter, ConnectionState::Polling).await;
    wait_count(&counter, 11).await;

    counter.unmount().await;
    let calls = h.api.calls();

    sleep(Duration::from_secs(300)).await;
    settle().await;
    assert_eq!(h.api.calls(), calls, "poll timer survived unmount");
    assert_eq!(h.transport.opens(), 2);
    assert!(!h.registry.has_connection());
}

#[tokio::test(start_paused = true)]
async fn test_unmount_clears_pending_reconnect() {
    let h = Harness::new();
    h.transport.fail_next_open("refused");
    let counter = h.mount("op");
    wait_state(&counter, ConnectionState::Reconnecting).await;

    counter.unmount().await;
    sleep(Duration::from_secs(60)).await;
    settle().await;

    assert_eq!(h.transport.opens(), 1, "reconnect timer survived unmount");
    assert_eq!(h.api.calls(), 0);
    assert!(!h.registry.has_connection());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_counter_releases_stream() {
    let h = Harness::new();
    let counter = h.mount("op");
    wait_state(&counter, ConnectionState::Open).await;

    drop(counter);
    settle().await;
    assert_eq!(h.transport.live_streams(), 0);
    assert!(!h.registry.has_connection());
}

#[tokio::test(start_paused = true)]
async fn test_counters_share_stream_until_last_unmount() {
    let h = Harness::new();
    let first = h.mount("op");
    let second = h.mount("op");
    wait_state(&first, ConnectionState::Open).await;
    wait_state(&second, ConnectionState::Open).await;
    assert_eq!(h.transport.opens(), 1);

    h.transport
        .stream(0)
        .send_line(r#"{"type":"unread_count","count":5}"#);
    wait_count(&first, 5).await;
    wait_count(&second, 5).await;

    first.unmount().await;
    settle().await;
    assert_eq!(h.transport.live_streams(), 1);

    second.unmount().await;
    settle().await;
    assert_eq!(h.transport.live_streams(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_counter_falls_back_to_polling() {
    let h = Harness::new();
    let old = h.mount("old-token");
    wait_state(&old, ConnectionState::Open).await;

    let new = h.mount("new-token");
    wait_state(&new, ConnectionState::Open).await;
    wait_state(&old, ConnectionState::Polling).await;

    assert_eq!(h.transport.opens(), 2);
    wait_count(&old, 11).await;

    old.unmount().await;
    assert!(h.registry.is_open(&key("new-token")));
    new.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_lagging_consumer_resyncs_count() {
    let transport = FakeTransport::new();
    let options = ConnectionOptions::default().with_event_channel_capacity(2);
    let registry =
        ConnectionRegistry::with_options(transport.clone(), &options, EventHandlers::default());
    let api = FakeNotificationApi::with_count(11);
    let counter = UnreadCounter::mount(
        &registry,
        key("op"),
        api.clone(),
        &options,
        EventHandlers::default(),
    );
    wait_state(&counter, ConnectionState::Open).await;

    // Queue far more frames than the fan-out buffer holds before the
    // consumer gets to run.
    let stream = transport.stream(0);
    for _ in 0..40 {
        stream.send_line(r#"{"type":"notification"}"#);
    }
    stream.send_line(": ping");
    stream.send_line(": ping");

    wait_count(&counter, 11).await;
    settle().await;
    assert_eq!(counter.count(), 11);
    assert_eq!(api.calls(), 1, "one resync fetch after the lag");
    assert_eq!(counter.state(), ConnectionState::Open, "still streaming");

    counter.unmount().await;
}
