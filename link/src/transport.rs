//! Transport seams between the delivery core and the network.
//!
//! - [`StreamTransport`] opens the physical push connection for a key and
//!   yields its body as text lines.
//! - [`NotificationApi`] and [`MonitoringApi`] cover the request/response
//!   endpoints used by the pollers and by alert resolution.
//!
//! The HTTP implementations live in [`HttpStreamTransport`] and
//! [`crate::FleetLinkClient`]; tests inject scripted fakes.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;

use crate::{
    error::{FleetLinkError, Result},
    models::{HandleAlertRequest, StreamEndpointKey, SuspiciousMovementEvent},
    timeouts::FleetLinkTimeouts,
};

/// Body of an open push connection, one item per line.
///
/// Dropping the stream closes the physical connection.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Opens physical server-push connections.
#[async_trait]
pub trait StreamTransport: Send + Sync + 'static {
    /// Connect and complete the handshake. Resolving `Ok` means OPEN.
    async fn open(&self, key: &StreamEndpointKey) -> Result<FrameStream>;
}

/// Authoritative unread count (`GET /notifications/unread-count`).
#[async_trait]
pub trait NotificationApi: Send + Sync + 'static {
    async fn fetch_unread_count(&self) -> Result<u64>;
}

/// Security monitoring endpoints.
#[async_trait]
pub trait MonitoringApi: Send + Sync + 'static {
    /// `GET /monitoring/suspicious-movements`
    async fn fetch_suspicious_movements(&self) -> Result<Vec<SuspiciousMovementEvent>>;

    /// `POST /monitoring/handle-alert`
    async fn handle_alert(&self, request: &HandleAlertRequest) -> Result<()>;
}

/// [`StreamTransport`] over a long-lived HTTP response body.
#[derive(Clone)]
pub struct HttpStreamTransport {
    http_client: reqwest::Client,
}

impl HttpStreamTransport {
    /// Build a transport whose client only bounds the connect phase.
    pub fn new(timeouts: &FleetLinkTimeouts) -> Result<Self> {
        let mut builder =
            reqwest::Client::builder().tcp_keepalive(std::time::Duration::from_secs(30));
        if !FleetLinkTimeouts::is_no_timeout(timeouts.connection_timeout) {
            builder = builder.connect_timeout(timeouts.connection_timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| FleetLinkError::ConfigurationError(e.to_string()))?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl StreamTransport for HttpStreamTransport {
    async fn open(&self, key: &StreamEndpointKey) -> Result<FrameStream> {
        let url = key.stream_url()?;
        log::debug!("[fleet-link] Opening notification stream {}", key);

        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| FleetLinkError::StreamError(format!("Connection failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FleetLinkError::from_status(status, body));
        }

        Ok(split_lines(response.bytes_stream()))
    }
}

/// Re-frame a chunked byte body into text lines.
///
/// Partial lines are buffered across chunks, `\r\n` is accepted, and an
/// unterminated last line is flushed when the body ends. A body error is
/// yielded once and ends the stream.
pub fn split_lines<S, E>(body: S) -> FrameStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = (Box::pin(body), Vec::<u8>::new(), false);
    Box::pin(futures_util::stream::unfold(
        state,
        |(mut body, mut buf, mut done)| async move {
            loop {
                if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    return Some((Ok(decode_line(&line)), (body, buf, done)));
                }
                if done {
                    return None;
                }
                match body.next().await {
                    Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        buf.clear();
                        done = true;
                        let err = FleetLinkError::StreamError(format!("Stream read failed: {}", e));
                        return Some((Err(err), (body, buf, done)));
                    },
                    None => {
                        done = true;
                        if !buf.is_empty() {
                            let line = decode_line(&buf);
                            buf.clear();
                            return Some((Ok(line), (body, buf, done)));
                        }
                    },
                }
            }
        },
    ))
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}
