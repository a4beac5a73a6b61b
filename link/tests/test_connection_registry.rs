//! ConnectionRegistry sharing, reference counting and replacement.

use fleet_link::{ConnectionOptions, ConnectionRegistry, EventHandlers, LinkStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

mod common;
use common::{key, settle, wait_until, FakeTransport};

#[tokio::test]
async fn test_same_key_shares_one_connection() {
    let transport = FakeTransport::new();
    let registry = ConnectionRegistry::new(transport.clone());
    let stream_key = key("operator-1");

    let a = registry.acquire(&stream_key);
    let b = registry.acquire(&stream_key);
    let c = registry.acquire(&stream_key);
    wait_until("stream open", || registry.is_open(&stream_key)).await;

    assert_eq!(transport.opens(), 1);
    assert_eq!(registry.ref_count(&stream_key), 3);
    assert_eq!(a.generation(), c.generation());

    drop(a);
    registry.release(b);
    settle().await;
    assert_eq!(registry.ref_count(&stream_key), 1);
    assert_eq!(transport.live_streams(), 1, "closed before the last holder released");

    drop(c);
    wait_until("stream closed", || transport.live_streams() == 0).await;
    assert!(!registry.has_connection());
    assert_eq!(transport.opens(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acquires_open_once() {
    let transport = FakeTransport::new();
    let registry = ConnectionRegistry::new(transport.clone());
    let stream_key = key("operator-1");

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            let stream_key = stream_key.clone();
            tokio::spawn(async move { registry.acquire(&stream_key) })
        })
        .collect();
    let mut leases = Vec::new();
    for task in tasks {
        leases.push(task.await.unwrap());
    }

    assert_eq!(registry.ref_count(&stream_key), 8);
    for _ in 0..200 {
        if registry.is_open(&stream_key) {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(transport.opens(), 1);

    let last = leases.pop().unwrap();
    drop(leases);
    assert_eq!(registry.ref_count(&stream_key), 1);
    drop(last);
    assert!(!registry.has_connection());
}

#[tokio::test]
async fn test_different_key_supersedes_connection() {
    let transport = FakeTransport::new();
    let registry = ConnectionRegistry::new(transport.clone());
    let first = key("operator-1");
    let second = key("operator-2");

    let old = registry.acquire(&first);
    wait_until("first open", || registry.is_open(&first)).await;

    let new = registry.acquire(&second);
    wait_until("second open", || registry.is_open(&second)).await;

    assert_eq!(transport.opens(), 2);
    assert_eq!(old.status(), LinkStatus::Closed);
    wait_until("first stream closed", || transport.stream(0).is_closed()).await;
    assert_eq!(registry.ref_count(&first), 0);

    // Releasing the replaced lease must not touch its successor.
    drop(old);
    assert_eq!(registry.ref_count(&second), 1);
    assert!(!transport.stream(1).is_closed());
    drop(new);
}

#[tokio::test]
async fn test_failed_connection_is_replaced() {
    let transport = FakeTransport::new();
    let registry = ConnectionRegistry::new(transport.clone());
    let stream_key = key("operator-1");

    let stale = registry.acquire(&stream_key);
    wait_until("open", || registry.is_open(&stream_key)).await;
    transport.stream(0).fail("connection reset");
    wait_until("failed", || stale.status() == LinkStatus::Failed).await;

    let fresh = registry.acquire(&stream_key);
    assert_ne!(stale.generation(), fresh.generation());
    wait_until("reopened", || registry.is_open(&stream_key)).await;
    assert_eq!(transport.opens(), 2);

    drop(stale);
    assert_eq!(registry.ref_count(&stream_key), 1);
    assert!(registry.is_open(&stream_key));
    drop(fresh);
}

#[tokio::test]
async fn test_shutdown_closes_regardless_of_holders() {
    let transport = FakeTransport::new();
    let registry = ConnectionRegistry::new(transport.clone());
    let stream_key = key("operator-1");

    let lease = registry.acquire(&stream_key);
    wait_until("open", || registry.is_open(&stream_key)).await;

    registry.shutdown();
    assert!(!registry.has_connection());
    assert_eq!(lease.status(), LinkStatus::Closed);
    wait_until("stream closed", || transport.live_streams() == 0).await;

    drop(lease);
    assert!(!registry.has_connection());
}

#[tokio::test]
async fn test_event_handlers_see_connect_and_disconnect() {
    let connects = Arc::new(AtomicUsize::new(0));
    let disconnects = Arc::new(AtomicUsize::new(0));
    let handlers = EventHandlers::new()
        .on_connect({
            let connects = connects.clone();
            move || {
                connects.fetch_add(1, Ordering::SeqCst);
            }
        })
        .on_disconnect({
            let disconnects = disconnects.clone();
            move |_| {
                disconnects.fetch_add(1, Ordering::SeqCst);
            }
        });

    let transport = FakeTransport::new();
    let registry =
        ConnectionRegistry::with_options(transport.clone(), &ConnectionOptions::default(), handlers);
    let stream_key = key("operator-1");

    let a = registry.acquire(&stream_key);
    let b = registry.acquire(&stream_key);
    wait_until("open", || registry.is_open(&stream_key)).await;
    assert_eq!(connects.load(Ordering::SeqCst), 1);

    drop(a);
    drop(b);
    wait_until("disconnect", || disconnects.load(Ordering::SeqCst) == 1).await;
}
