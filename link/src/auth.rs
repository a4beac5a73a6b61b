//! Authentication provider for the fleet backend.
//!
//! REST calls carry the operator token as `Authorization: Bearer <token>`.
//! The push stream cannot carry headers in every deployment, so the same token
//! travels as the `token` query parameter of the stream URL instead.

/// Authentication credentials for the fleet backend.
///
/// # Examples
///
/// ```rust
/// use fleet_link::AuthProvider;
///
/// let auth = AuthProvider::jwt_token("eyJhbGc...".to_string());
/// assert!(auth.is_authenticated());
///
/// let anonymous = AuthProvider::none();
/// assert!(!anonymous.is_authenticated());
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthProvider {
    /// JWT token authentication
    JwtToken(String),

    /// No authentication (local development backends)
    #[default]
    None,
}

impl AuthProvider {
    /// Create JWT token authentication
    pub fn jwt_token(token: String) -> Self {
        Self::JwtToken(token)
    }

    /// No authentication
    pub fn none() -> Self {
        Self::None
    }

    /// Attach the `Authorization` header to an HTTP request builder.
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::JwtToken(token) => request.bearer_auth(token),
            Self::None => request,
        }
    }

    /// Token value used in the stream URL, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::JwtToken(token) => Some(token.as_str()),
            Self::None => None,
        }
    }

    /// Check if authentication is configured
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl std::fmt::Debug for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JwtToken(_) => f.write_str("JwtToken(***)"),
            Self::None => f.write_str("None"),
        }
    }
}
