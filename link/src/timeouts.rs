//! Timeout configuration for fleet-link HTTP operations.
//!
//! The push stream only honours `connection_timeout`: a whole-request timeout
//! would cut a healthy long-lived stream, so it applies to the REST calls
//! (count fetch, security poll, alert resolution) alone.

use std::time::Duration;

/// Timeout configuration for fleet-link operations.
///
/// # Examples
///
/// ```rust
/// use fleet_link::FleetLinkTimeouts;
/// use std::time::Duration;
///
/// let timeouts = FleetLinkTimeouts::builder()
///     .connection_timeout(Duration::from_secs(5))
///     .request_timeout_secs(15)
///     .build();
/// assert_eq!(timeouts.request_timeout, Duration::from_secs(15));
/// ```
#[derive(Debug, Clone)]
pub struct FleetLinkTimeouts {
    /// Timeout for establishing connections (TCP + TLS handshake).
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Timeout for a complete REST request/response exchange.
    /// Default: 30 seconds
    pub request_timeout: Duration,
}

impl Default for FleetLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl FleetLinkTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> FleetLinkTimeoutsBuilder {
        FleetLinkTimeoutsBuilder::new()
    }

    /// Short timeouts for a backend on localhost.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Long timeouts for high-latency or unreliable networks.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365)
    }
}

/// Builder for creating custom [`FleetLinkTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct FleetLinkTimeoutsBuilder {
    timeouts: FleetLinkTimeouts,
}

impl FleetLinkTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: FleetLinkTimeouts::default(),
        }
    }

    /// Set the connection timeout (TCP + TLS handshake).
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the connection timeout in seconds.
    pub fn connection_timeout_secs(self, secs: u64) -> Self {
        self.connection_timeout(Duration::from_secs(secs))
    }

    /// Set the REST request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    /// Set the REST request timeout in seconds.
    pub fn request_timeout_secs(self, secs: u64) -> Self {
        self.request_timeout(Duration::from_secs(secs))
    }

    /// Build the timeout configuration.
    pub fn build(self) -> FleetLinkTimeouts {
        self.timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = FleetLinkTimeouts::default();
        assert_eq!(timeouts.connection_timeout, Duration::from_secs(10));
        assert_eq!(timeouts.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder() {
        let timeouts = FleetLinkTimeouts::builder()
            .connection_timeout_secs(60)
            .request_timeout_secs(120)
            .build();

        assert_eq!(timeouts.connection_timeout, Duration::from_secs(60));
        assert_eq!(timeouts.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_presets() {
        assert!(FleetLinkTimeouts::fast().connection_timeout <= Duration::from_secs(5));
        assert!(FleetLinkTimeouts::relaxed().request_timeout >= Duration::from_secs(60));
    }

    #[test]
    fn test_is_no_timeout() {
        assert!(FleetLinkTimeouts::is_no_timeout(Duration::ZERO));
        assert!(!FleetLinkTimeouts::is_no_timeout(Duration::from_secs(1)));
        assert!(!FleetLinkTimeouts::is_no_timeout(Duration::from_secs(3600)));
    }
}
