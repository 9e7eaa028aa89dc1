//! Header token authenticator
//!
//! Holds a token and the header it travels in, and applies both to
//! outgoing requests.

use reqwest::RequestBuilder;

/// Header the Brella integration API reads the access token from
pub const DEFAULT_AUTH_HEADER: &str = "Brella-API-Access-Token";

/// Immutable header-token authentication policy
#[derive(Clone, PartialEq, Eq)]
pub struct TokenAuthenticator {
    /// Header name
    auth_header: String,
    /// Token value
    token: String,
}

impl TokenAuthenticator {
    /// Create an authenticator using the default Brella header
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_header(token, DEFAULT_AUTH_HEADER)
    }

    /// Create an authenticator using a custom header
    pub fn with_header(token: impl Into<String>, auth_header: impl Into<String>) -> Self {
        Self {
            auth_header: auth_header.into(),
            token: token.into(),
        }
    }

    /// Header name
    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }

    /// Token value
    pub fn token(&self) -> &str {
        &self.token
    }

    /// `(header_name, header_value)` pair attached to every request
    pub fn header_pair(&self) -> (&str, &str) {
        (&self.auth_header, &self.token)
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(self.auth_header.as_str(), self.token.as_str())
    }
}

impl std::fmt::Debug for TokenAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuthenticator")
            .field("auth_header", &self.auth_header)
            .field("token", &"***")
            .finish()
    }
}
