//! Fleet backend client with builder pattern.
//!
//! Provides the REST calls used by the delivery core and mounts the
//! unread counter and the alert monitor against them.

use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    alerts::{AlertMonitor, AlertPresenter},
    auth::AuthProvider,
    connection::ConnectionRegistry,
    error::{FleetLinkError, Result},
    event_handlers::EventHandlers,
    models::{
        ConnectionOptions, HandleAlertRequest, StreamEndpointKey, SuspiciousMovementEvent,
        UnreadCountResponse,
    },
    timeouts::FleetLinkTimeouts,
    transport::{HttpStreamTransport, MonitoringApi, NotificationApi, StreamTransport},
    unread_counter::UnreadCounter,
};

const UNREAD_COUNT_PATH: &str = "/notifications/unread-count";
const SUSPICIOUS_MOVEMENTS_PATH: &str = "/monitoring/suspicious-movements";
const HANDLE_ALERT_PATH: &str = "/monitoring/handle-alert";

/// Main fleet backend client.
///
/// Use [`FleetLinkClientBuilder`] to construct instances with custom configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use fleet_link::{FleetLinkClient, LogPresenter};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = FleetLinkClient::builder()
///     .base_url("http://localhost:8080/api")
///     .jwt_token("eyJhbGc...")
///     .build()?;
///
/// let registry = client.connection_registry()?;
/// let counter = client.mount_unread_counter(&registry);
/// let monitor = client.mount_alert_monitor(Arc::new(LogPresenter));
///
/// println!("unread: {} ({})", counter.count(), counter.state());
///
/// counter.unmount().await;
/// monitor.unmount().await;
/// registry.shutdown();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FleetLinkClient {
    base_url: String,
    http_client: reqwest::Client,
    auth: AuthProvider,
    timeouts: FleetLinkTimeouts,
    connection_options: ConnectionOptions,
    event_handlers: EventHandlers,
}

impl FleetLinkClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> FleetLinkClientBuilder {
        FleetLinkClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the configured timeouts
    pub fn timeouts(&self) -> &FleetLinkTimeouts {
        &self.timeouts
    }

    pub fn connection_options(&self) -> &ConnectionOptions {
        &self.connection_options
    }

    /// Identity of the notification stream for this base URL and token.
    pub fn stream_key(&self) -> StreamEndpointKey {
        StreamEndpointKey::new(&self.base_url, self.auth.token().map(str::to_string))
    }

    /// HTTP transport for the push stream, bounded by the connection timeout only.
    pub fn stream_transport(&self) -> Result<Arc<dyn StreamTransport>> {
        Ok(Arc::new(HttpStreamTransport::new(&self.timeouts)?))
    }

    /// A registry over [`Self::stream_transport`] with this client's options
    /// and event handlers. Build one per application and share it.
    pub fn connection_registry(&self) -> Result<ConnectionRegistry> {
        Ok(ConnectionRegistry::with_options(
            self.stream_transport()?,
            &self.connection_options,
            self.event_handlers.clone(),
        ))
    }

    /// Mount an unread counter on this client's stream key.
    pub fn mount_unread_counter(&self, registry: &ConnectionRegistry) -> UnreadCounter {
        UnreadCounter::mount(
            registry,
            self.stream_key(),
            Arc::new(self.clone()),
            &self.connection_options,
            self.event_handlers.clone(),
        )
    }

    /// Start the security poll against this client.
    pub fn mount_alert_monitor(&self, presenter: Arc<dyn AlertPresenter>) -> AlertMonitor {
        AlertMonitor::mount(Arc::new(self.clone()), presenter, &self.connection_options)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(FleetLinkError::from_status(status, body))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path);
        let start = std::time::Instant::now();
        let response = self
            .auth
            .apply_to_request(self.http_client.get(&url))
            .send()
            .await?;
        log::debug!(
            "[fleet-link] GET {} -> {} in {:?}",
            path,
            response.status(),
            start.elapsed()
        );
        Ok(Self::check(response).await?.json::<T>().await?)
    }
}

#[async_trait]
impl NotificationApi for FleetLinkClient {
    async fn fetch_unread_count(&self) -> Result<u64> {
        let body: UnreadCountResponse = self.get_json(UNREAD_COUNT_PATH).await?;
        Ok(body.unread_count)
    }
}

#[async_trait]
impl MonitoringApi for FleetLinkClient {
    async fn fetch_suspicious_movements(&self) -> Result<Vec<SuspiciousMovementEvent>> {
        let raw: Vec<serde_json::Value> = self.get_json(SUSPICIOUS_MOVEMENTS_PATH).await?;
        Ok(SuspiciousMovementEvent::from_batch(raw))
    }

    async fn handle_alert(&self, request: &HandleAlertRequest) -> Result<()> {
        let url = self.endpoint(HANDLE_ALERT_PATH);
        log::debug!(
            "[fleet-link] POST {} bike={} action={}",
            HANDLE_ALERT_PATH,
            request.bike_id,
            request.action
        );
        let response = self
            .auth
            .apply_to_request(self.http_client.post(&url))
            .json(request)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Builder for configuring [`FleetLinkClient`] instances.
pub struct FleetLinkClientBuilder {
    base_url: Option<String>,
    auth: AuthProvider,
    timeouts: FleetLinkTimeouts,
    connection_options: ConnectionOptions,
    event_handlers: EventHandlers,
}

impl FleetLinkClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            auth: AuthProvider::none(),
            timeouts: FleetLinkTimeouts::default(),
            connection_options: ConnectionOptions::default(),
            event_handlers: EventHandlers::default(),
        }
    }

    /// Set the base URL of the fleet backend API (e.g. `https://host/api`)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set JWT token authentication
    pub fn jwt_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthProvider::jwt_token(token.into());
        self
    }

    /// Set authentication provider directly
    pub fn auth(mut self, auth: AuthProvider) -> Self {
        self.auth = auth;
        self
    }

    /// Set the REST request timeout, keeping the other timeouts
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    /// Set comprehensive timeout configuration for all operations
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use fleet_link::{FleetLinkClient, FleetLinkTimeouts};
    ///
    /// # fn example() -> fleet_link::Result<()> {
    /// let client = FleetLinkClient::builder()
    ///     .base_url("http://localhost:8080")
    ///     .timeouts(FleetLinkTimeouts::fast())
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn timeouts(mut self, timeouts: FleetLinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Set reconnection and polling behavior
    pub fn connection_options(mut self, options: ConnectionOptions) -> Self {
        self.connection_options = options;
        self
    }

    /// Set connection lifecycle hooks
    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<FleetLinkClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| FleetLinkError::ConfigurationError("base_url is required".into()))?;
        let base_url = base_url.trim().trim_end_matches('/').to_string();

        let parsed = reqwest::Url::parse(&base_url).map_err(|e| {
            FleetLinkError::ConfigurationError(format!("Invalid base_url '{}': {}", base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FleetLinkError::ConfigurationError(format!(
                "Unsupported scheme '{}' in base_url",
                parsed.scheme()
            )));
        }

        let mut client_builder = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90));
        if !FleetLinkTimeouts::is_no_timeout(self.timeouts.request_timeout) {
            client_builder = client_builder.timeout(self.timeouts.request_timeout);
        }
        if !FleetLinkTimeouts::is_no_timeout(self.timeouts.connection_timeout) {
            client_builder = client_builder.connect_timeout(self.timeouts.connection_timeout);
        }

        let http_client = client_builder
            .build()
            .map_err(|e| FleetLinkError::ConfigurationError(e.to_string()))?;

        log::debug!(
            "[fleet-link] Client for {} (authenticated={})",
            base_url,
            self.auth.is_authenticated()
        );

        Ok(FleetLinkClient {
            base_url,
            http_client,
            auth: self.auth,
            timeouts: self.timeouts,
            connection_options: self.connection_options,
            event_handlers: self.event_handlers,
        })
    }
}
