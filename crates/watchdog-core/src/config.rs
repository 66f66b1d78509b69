//! Client configuration document
//!
//! This is the settings document persisted by [`crate::settings`]. Missing
//! keys take their defaults; present keys are used as written.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_API_URL, DEFAULT_IPV6_API_URL, SUPPORTED_PROVIDERS, is_supported_provider};
use crate::types::{Enable, IpFamily, Subdomain};

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// IP discovery endpoints
    #[serde(default)]
    pub api_url: ApiUrl,

    /// Families to process
    #[serde(default = "default_enable")]
    pub enable: Enable,

    /// Optional central status report
    #[serde(default)]
    pub center: CenterConfig,

    /// DNS providers to keep in sync
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl ClientConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            api_url: ApiUrl::default(),
            enable: default_enable(),
            center: CenterConfig::default(),
            providers: Vec::new(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.enable.any() {
            return Err(crate::Error::config(
                "Neither IPv4 nor IPv6 is enabled, nothing to do",
            ));
        }

        if self.providers.is_empty() {
            return Err(crate::Error::config("No providers configured"));
        }

        for provider in &self.providers {
            provider.validate()?;
        }

        self.center.validate()?;

        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_enable() -> Enable {
    Enable::new(true, false)
}

/// IP discovery endpoints
///
/// An empty URL selects the built-in endpoint for that family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiUrl {
    #[serde(default)]
    pub ipv4: String,
    #[serde(default)]
    pub ipv6: String,
}

impl ApiUrl {
    /// Endpoint to query for `family`
    pub fn for_family(&self, family: IpFamily) -> &str {
        let (configured, fallback) = match family {
            IpFamily::V4 => (&self.ipv4, DEFAULT_API_URL),
            IpFamily::V6 => (&self.ipv6, DEFAULT_IPV6_API_URL),
        };

        if configured.is_empty() {
            fallback
        } else {
            configured
        }
    }
}

/// Central status report settings
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterConfig {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub token: String,
}

impl CenterConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !self.enable {
            return Ok(());
        }
        if self.api_url.is_empty() {
            return Err(crate::Error::config(
                "Central report is enabled but center.api_url is empty",
            ));
        }
        if !self.api_url.starts_with("https://") && !self.api_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "center.api_url must use HTTP or HTTPS scheme. Got: {}",
                self.api_url
            )));
        }
        if self.token.is_empty() {
            return Err(crate::Error::config(
                "Central report is enabled but center.token is empty",
            ));
        }
        Ok(())
    }
}

// The token must never reach the logs
impl std::fmt::Debug for CenterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CenterConfig")
            .field("enable", &self.enable)
            .field("api_url", &self.api_url)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

/// One DNS provider entry
///
/// `options` is handed untouched to the provider's factory, so adding a
/// provider never changes this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider key, one of [`SUPPORTED_PROVIDERS`]
    #[serde(rename = "type")]
    pub kind: String,

    /// Records this provider manages
    #[serde(default)]
    pub subdomain: Subdomain,

    /// Provider-specific settings (credentials, zone, ...)
    #[serde(default)]
    pub options: serde_json::Value,
}

impl ProviderConfig {
    pub fn new(kind: impl Into<String>, subdomain: Subdomain) -> Self {
        Self {
            kind: kind.into(),
            subdomain,
            options: serde_json::Value::Null,
        }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    /// Validate the provider entry
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.kind.is_empty() {
            return Err(crate::Error::config("Provider type cannot be empty"));
        }

        if !is_supported_provider(&self.kind) {
            return Err(crate::Error::config(format!(
                "Provider type '{}' is not supported. Supported providers: {}",
                self.kind,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }

        Ok(())
    }

    /// Read a string option, or `None` when absent or not a string
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }
}
