use std::fmt;

use crate::error::{FleetLinkError, Result};

/// Path of the server-push endpoint relative to the base URL.
pub const STREAM_PATH: &str = "/notifications/stream";

/// Identity of a logical notification stream: base URL plus auth token.
///
/// Two consumers holding equal keys share one physical connection. The token
/// is part of the identity (a re-login produces a new key) but is never
/// printed by `Debug` or `Display`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StreamEndpointKey {
    base_url: String,
    token: Option<String>,
}

impl StreamEndpointKey {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, token }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// `GET {base}/notifications/stream?token={token}`
    pub fn stream_url(&self) -> Result<reqwest::Url> {
        let raw = format!("{}{}", self.base_url, STREAM_PATH);
        let mut url = reqwest::Url::parse(&raw).map_err(|e| {
            FleetLinkError::ConfigurationError(format!("Invalid stream URL '{}': {}", raw, e))
        })?;
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url)
    }
}

impl fmt::Debug for StreamEndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamEndpointKey")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

impl fmt::Display for StreamEndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.token.is_some() {
            write!(f, "{}{}?token=***", self.base_url, STREAM_PATH)
        } else {
            write!(f, "{}{}", self.base_url, STREAM_PATH)
        }
    }
}
