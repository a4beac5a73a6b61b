//! # fleet-link: Fleet Operator Notification and Alert Delivery
//!
//! Client-side core that keeps an operator console's unread-notification
//! counter live and surfaces suspicious bike movements as actionable alerts.
//!
//! ## Features
//!
//! - **Shared Streams**: One physical push connection per endpoint, however
//!   many consumers mount it ([`ConnectionRegistry`])
//! - **Bounded Reconnection**: Fixed-delay retries with a small budget, then a
//!   permanent switch to polling for that consumer
//! - **Polling Fallback**: Authoritative count re-fetched on a fixed interval
//! - **Security Alerts**: Independent poll of suspicious movements,
//!   deduplicated by (bike, detection time) and surfaced exactly once
//! - **Injected Side Effects**: Audible cue and visible alerts go through an
//!   [`AlertPresenter`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleet_link::{FleetLinkClient, LogPresenter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FleetLinkClient::builder()
//!         .base_url("https://fleet.example.com/api")
//!         .jwt_token("your-jwt-token")
//!         .build()?;
//!
//!     let registry = client.connection_registry()?;
//!     let counter = client.mount_unread_counter(&registry);
//!     let monitor = client.mount_alert_monitor(Arc::new(LogPresenter));
//!
//!     let mut count = counter.watch_count();
//!     while count.changed().await.is_ok() {
//!         println!("unread: {} ({})", *count.borrow(), counter.state());
//!         if let Some(alert) = monitor.active_alert() {
//!             monitor.mark_handled(&alert.bike_id, "dispatch_staff", None).await?;
//!         }
//!     }
//!
//!     counter.unmount().await;
//!     monitor.unmount().await;
//!     registry.shutdown();
//!     Ok(())
//! }
//! ```

pub mod alerts;
pub mod auth;
pub mod client;
pub mod connection;
pub mod error;
pub mod event_handlers;
pub mod models;
pub mod polling;
pub mod reconnect;
pub mod stream_client;
pub mod timeouts;
pub mod transport;
pub mod unread_counter;

// Re-export main types for convenience
pub use alerts::{
    AlertDispatcher, AlertMonitor, AlertPoller, AlertPresenter, LogPresenter, SeenEventSet,
};
pub use auth::AuthProvider;
pub use client::{FleetLinkClient, FleetLinkClientBuilder};
pub use connection::{ConnectionRegistry, LinkEvent, LinkStatus, StreamLease};
pub use error::{FleetLinkError, Result};
pub use event_handlers::{ConnectionError, DisconnectReason, EventHandlers};
pub use models::{
    AlertKey, AlertNotice, BikeId, ConnectionOptions, ConnectionState, CountUpdate, GeoPoint,
    HandleAlertRequest, RiderInfo, StreamEndpointKey, StreamFrame, SuspiciousMovementEvent,
    UnreadCountResponse,
};
pub use polling::PollingFallback;
pub use reconnect::{ReconnectDecision, ReconnectionController};
pub use stream_client::{StreamClient, StreamExit};
pub use timeouts::{FleetLinkTimeouts, FleetLinkTimeoutsBuilder};
pub use transport::{
    FrameStream, HttpStreamTransport, MonitoringApi, NotificationApi, StreamTransport,
};
pub use unread_counter::UnreadCounter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
