//! HTTP client and captured responses

use crate::auth::TokenAuthenticator;
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::types::{JsonValue, StringMap};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            default_headers: HashMap::new(),
            user_agent: format!("brella-source/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// A fully read HTTP response
///
/// The body is buffered so parsing and pagination can both look at it.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body text
    pub body: String,
    /// Final request URL
    pub url: Option<Url>,
}

impl ApiResponse {
    /// Build a response from parts
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            url: None,
        }
    }

    /// Build a 200 response carrying the given JSON body
    pub fn ok_json(body: &JsonValue) -> Self {
        Self::new(StatusCode::OK, body.to_string())
    }

    /// Read a `reqwest` response to completion
    pub async fn from_response(response: Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = Some(response.url().clone());
        let body = response.text().await?;
        Ok(Self {
            status,
            headers,
            body,
            url,
        })
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Fail with `HttpStatus` unless the status is 2xx
    pub fn error_for_status(&self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(Error::http_status(self.status.as_u16(), self.body.clone()))
        }
    }

    /// Parse the body as JSON
    pub fn json(&self) -> Result<JsonValue> {
        serde_json::from_str(&self.body)
            .map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
    }
}

/// HTTP client bound to one API base URL
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    base_url: Option<Url>,
    authenticator: Option<TokenAuthenticator>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let base_url = config
            .base_url
            .as_deref()
            .map(|raw| {
                if raw.ends_with('/') {
                    Url::parse(raw)
                } else {
                    Url::parse(&format!("{raw}/"))
                }
            })
            .transpose()?;

        Ok(Self {
            client,
            config,
            base_url,
            authenticator: None,
        })
    }

    /// Create a client with authentication
    pub fn with_auth(config: HttpClientConfig, authenticator: TokenAuthenticator) -> Result<Self> {
        let mut client = Self::with_config(config)?;
        client.authenticator = Some(authenticator);
        Ok(client)
    }

    /// Create the client a sync run uses from the source config
    pub fn for_source(config: &SourceConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .base_url(config.base_url()?.as_str())
            .timeout(config.timeout())
            .header("Accept", "application/json")
            .build();
        Self::with_auth(http_config, config.authenticator())
    }

    /// Get the authenticator, if any
    pub fn authenticator(&self) -> Option<&TokenAuthenticator> {
        self.authenticator.as_ref()
    }

    /// Make a GET request
    ///
    /// Non-2xx statuses are returned as responses, not errors; callers
    /// decide via [`ApiResponse::error_for_status`].
    pub async fn get(&self, path: &str, query: &StringMap) -> Result<ApiResponse> {
        let url = self.build_url(path)?;

        let mut req = self.client.get(url.clone());

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if !query.is_empty() {
            // Sorted for stable URLs in logs and mocks
            let mut params: Vec<_> = query.iter().collect();
            params.sort();
            req = req.query(&params);
        }

        if let Some(ref auth) = self.authenticator {
            req = auth.apply(req);
        }

        let response = req.send().await?;
        debug!("GET {} -> {}", url, response.status().as_u16());

        ApiResponse::from_response(response).await
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        match &self.base_url {
            Some(base) => Ok(base.join(path.trim_start_matches('/'))?),
            None => Ok(Url::parse(path)?),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_authenticator", &self.authenticator.is_some())
            .finish_non_exhaustive()
    }
}
