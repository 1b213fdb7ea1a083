//! Configuration types for the DDNS edge updater
//!
//! One [`EdgeConfig`] is built at startup and handed to the validator, the
//! provider and the updater. Nothing reads credentials from ambient state
//! after that.

use serde::Deserialize;
use std::fmt;

/// Default freshness window for signed requests (5 minutes)
pub const DEFAULT_FRESHNESS_WINDOW_SECS: u64 = 300;

/// Default Cloudflare API base URL
pub const DEFAULT_CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default listen address for the edge daemon
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// A credential string that never appears in `Debug` output
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value. Callers must not log it.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

/// Main edge configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EdgeConfig {
    /// Request authentication settings
    pub auth: AuthConfig,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// The single DNS record this edge maintains
    pub record: RecordConfig,

    /// Inbound HTTP settings
    #[serde(default)]
    pub server: ServerConfig,
}

impl EdgeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.auth.validate()?;
        self.provider.validate()?;
        self.record.validate()?;
        self.server.validate()?;
        Ok(())
    }
}

/// Request authentication settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Key for the HMAC-SHA256 over request bodies
    pub shared_secret: Secret,

    /// Maximum accepted age of a request timestamp, in seconds
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,

    /// Maximum accepted distance of a timestamp into the future.
    ///
    /// `None` leaves future timestamps unbounded.
    #[serde(default)]
    pub max_future_skew_secs: Option<u64>,
}

impl AuthConfig {
    /// Create auth settings with the default freshness window
    pub fn new(shared_secret: Secret) -> Self {
        Self {
            shared_secret,
            freshness_window_secs: DEFAULT_FRESHNESS_WINDOW_SECS,
            max_future_skew_secs: None,
        }
    }

    /// Set the freshness window
    pub fn with_freshness_window_secs(mut self, secs: u64) -> Self {
        self.freshness_window_secs = secs;
        self
    }

    /// Bound how far into the future a timestamp may be
    pub fn with_max_future_skew_secs(mut self, secs: u64) -> Self {
        self.max_future_skew_secs = Some(secs);
        self
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.shared_secret.is_empty() {
            return Err(crate::Error::config("Shared secret cannot be empty"));
        }
        if self.freshness_window_secs == 0 {
            return Err(crate::Error::config("Freshness window must be > 0"));
        }
        Ok(())
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare API v4
    Cloudflare {
        /// Bearer token with Zone:DNS:Edit permission
        api_token: Secret,
        /// Zone identifier
        zone_id: String,
        /// API base URL, without the `/zones` segment
        #[serde(default = "default_cloudflare_api_base")]
        api_base: String,
    },
}

impl ProviderConfig {
    /// Cloudflare configuration against the public API
    pub fn cloudflare(api_token: Secret, zone_id: impl Into<String>) -> Self {
        ProviderConfig::Cloudflare {
            api_token,
            zone_id: zone_id.into(),
            api_base: default_cloudflare_api_base(),
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare {
                api_token,
                zone_id,
                api_base,
                ..
            } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                if zone_id.is_empty() {
                    return Err(crate::Error::config("Cloudflare zone ID cannot be empty"));
                }
                if !api_base.starts_with("https://") && !api_base.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "Cloudflare API base must use HTTP or HTTPS scheme. Got: {}",
                        api_base
                    )));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
        }
    }
}

/// DNS record configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecordConfig {
    /// DNS record name (e.g., "home.example.com")
    pub name: String,

    /// Read the record but never write it
    #[serde(default)]
    pub dry_run: bool,
}

impl RecordConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_domain_name(&self.name)
    }
}

/// Inbound HTTP settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Header carrying the client address when running behind a proxy
    /// (e.g. `cf-connecting-ip`). When unset the TCP peer address is used.
    #[serde(default)]
    pub client_ip_header: Option<String>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(crate::Error::config(format!(
                "Listen address is not a socket address: {}",
                self.listen_addr
            )));
        }
        if let Some(header) = &self.client_ip_header
            && header.trim().is_empty()
        {
            return Err(crate::Error::config("Client IP header name cannot be empty"));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            client_ip_header: None,
        }
    }
}

/// Basic RFC 1035 shape check for a record name
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253)",
            domain.len()
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

fn default_freshness_window_secs() -> u64 {
    DEFAULT_FRESHNESS_WINDOW_SECS
}

fn default_cloudflare_api_base() -> String {
    DEFAULT_CLOUDFLARE_API_BASE.to_string()
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}
