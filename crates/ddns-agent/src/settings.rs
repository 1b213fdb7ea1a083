//! Environment configuration for the agent
//!
//! - `DDNS_SHARED_KEY`: HMAC key shared with the edge (required)
//! - `DDNS_ENDPOINT_URL`: edge URL; `https://` is assumed without a scheme (required)
//! - `DDNS_IP_SOURCES`: comma-separated plain-text IP echo services
//! - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error

use anyhow::{Context, Result};
use ddns_core::Secret;

/// Plain-text IP echo services, tried in order
pub const DEFAULT_IP_SOURCES: &[&str] = &[
    "https://api.ipify.org/",
    "https://icanhazip.com/",
    "https://ifconfig.me/ip",
];

/// Agent settings as read from the environment
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub shared_key: Secret,
    pub endpoint_url: String,
    pub ip_sources: Vec<String>,
    pub log_level: String,
}

impl AgentSettings {
    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .with_context(|| format!("{} is required", key))
        };

        let ip_sources = match lookup("DDNS_IP_SOURCES") {
            Some(list) if !list.trim().is_empty() => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => DEFAULT_IP_SOURCES.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            shared_key: Secret::new(required("DDNS_SHARED_KEY")?),
            endpoint_url: normalize_endpoint(&required("DDNS_ENDPOINT_URL")?),
            ip_sources,
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.endpoint_url)
            .with_context(|| format!("DDNS_ENDPOINT_URL '{}' is not a URL", self.endpoint_url))?;

        if self.ip_sources.is_empty() {
            anyhow::bail!("DDNS_IP_SOURCES must name at least one service");
        }
        for source in &self.ip_sources {
            reqwest::Url::parse(source)
                .with_context(|| format!("IP source '{}' is not a URL", source))?;
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }
}

/// Bare hosts are reached over HTTPS
fn normalize_endpoint(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}
