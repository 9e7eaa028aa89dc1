//! Source configuration
//!
//! The configuration is supplied once per sync run by the harness, as a JSON
//! object (or a YAML file on the command line). It is validated up front so
//! a missing organization id fails at load time rather than while building
//! the first request path.

use crate::auth::TokenAuthenticator;
use crate::error::{Error, Result};
use crate::types::{scalar_to_string, JsonValue};
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default base URL of the Brella integration API
pub const DEFAULT_BASE_URL: &str = "https://api.brella.io/api/integration/";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the Brella source
#[derive(Clone, Deserialize)]
pub struct SourceConfig {
    /// Integration API access token
    pub brella_api_access_token: String,

    /// Organization identifier, used as a path segment
    pub organization_id: JsonValue,

    /// Base URL for API requests
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size; when set, list streams paginate by page number
    #[serde(default)]
    pub page_size: Option<u32>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl SourceConfig {
    /// Create a config with defaults for everything but the credentials
    pub fn new(token: impl Into<String>, organization_id: impl Into<JsonValue>) -> Self {
        Self {
            brella_api_access_token: token.into(),
            organization_id: organization_id.into(),
            base_url: default_base_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: None,
        }
    }

    /// Override the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Enable page-number pagination with the given page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Parse and validate a config from a JSON value
    pub fn from_value(value: &JsonValue) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::config("Config must be a JSON object"))?;

        for field in ["brella_api_access_token", "organization_id"] {
            if object.get(field).map_or(true, JsonValue::is_null) {
                return Err(Error::missing_field(field));
            }
        }

        let config: Self = serde_json::from_value(value.clone())
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Load a config file; `.yaml`/`.yml` files are parsed as YAML, anything
    /// else as JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config file: {e}")))?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext, "yaml" | "yml"));

        let value: JsonValue = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?
        };
        Self::from_value(&value)
    }

    /// Validate field contents
    pub fn validate(&self) -> Result<()> {
        if self.brella_api_access_token.trim().is_empty() {
            return Err(Error::invalid_value(
                "brella_api_access_token",
                "must not be empty",
            ));
        }

        match scalar_to_string(&self.organization_id) {
            Some(id) if !matches!(id.as_str(), "" | "." | "..") && !id.contains('/') => {}
            _ => {
                return Err(Error::invalid_value(
                    "organization_id",
                    "must be a non-empty string or number usable as a path segment",
                ))
            }
        }

        if self.page_size == Some(0) {
            return Err(Error::invalid_value("page_size", "must be greater than 0"));
        }

        self.base_url()?;
        Ok(())
    }

    /// Parsed base URL, always ending in `/` so relative paths join below it
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.clone();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Ok(Url::parse(&raw)?)
    }

    /// Organization id as it appears in request paths
    pub fn organization_id(&self) -> String {
        scalar_to_string(&self.organization_id).unwrap_or_default()
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the authenticator for this config
    pub fn authenticator(&self) -> TokenAuthenticator {
        TokenAuthenticator::new(self.brella_api_access_token.clone())
    }

    /// Values exposed to path templates as `config.*`
    ///
    /// The access token is never part of this object.
    pub fn template_values(&self) -> JsonValue {
        json!({
            "organization_id": self.organization_id,
            "base_url": self.base_url,
        })
    }
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("brella_api_access_token", &"***")
            .field("organization_id", &self.organization_id)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// JSON schema describing the configuration, returned by `spec`
pub fn connection_specification() -> JsonValue {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Brella Spec",
        "type": "object",
        "required": ["brella_api_access_token", "organization_id"],
        "additionalProperties": true,
        "properties": {
            "brella_api_access_token": {
                "type": "string",
                "title": "API Access Token",
                "description": "Brella integration API access token",
                "airbyte_secret": true
            },
            "organization_id": {
                "type": ["string", "integer"],
                "title": "Organization ID",
                "description": "Identifier of the organization to extract"
            },
            "base_url": {
                "type": "string",
                "title": "Base URL",
                "default": DEFAULT_BASE_URL
            },
            "timeout_secs": {
                "type": "integer",
                "title": "Request timeout (seconds)",
                "default": DEFAULT_TIMEOUT_SECS,
                "minimum": 1
            },
            "page_size": {
                "type": "integer",
                "title": "Page size",
                "description": "Request list endpoints page by page with this many records per page",
                "minimum": 1
            }
        }
    })
}
