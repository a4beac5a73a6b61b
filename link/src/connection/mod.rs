//! Shared notification stream connections.
//!
//! This module contains:
//! - [`registry`]: reference-counted table handing out [`StreamLease`]s
//! - [`shared`]: the physical connection task behind each lease

pub mod registry;
pub mod shared;

pub use registry::{ConnectionRegistry, StreamLease};
pub use shared::{LinkEvent, LinkStatus};
