//! Data models for the fleet-link client library.
//!
//! Defines the wire shapes of the notification stream, the count and
//! monitoring endpoints, and the client-side state types built from them.

pub mod alert_notice;
pub mod connection_options;
pub mod connection_state;
pub mod handle_alert;
pub mod stream_frame;
pub mod stream_key;
pub mod suspicious_movement;
pub mod unread_count;


pub use alert_notice::AlertNotice;
pub use connection_options::ConnectionOptions;
pub use connection_state::ConnectionState;
pub use handle_alert::HandleAlertRequest;
pub use stream_frame::{CountUpdate, StreamFrame};
pub use stream_key::StreamEndpointKey;
pub use suspicious_movement::{AlertKey, BikeId, GeoPoint, RiderInfo, SuspiciousMovementEvent};
pub use unread_count::UnreadCountResponse;
