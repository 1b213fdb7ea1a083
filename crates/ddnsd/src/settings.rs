//! Environment configuration for the edge daemon
//!
//! All configuration is via environment variables:
//!
//! - `DDNS_SHARED_KEY`: HMAC key shared with the agent (required)
//! - `DDNS_PROVIDER_API_TOKEN`: Cloudflare API token (required)
//! - `DDNS_PROVIDER_ZONE_ID`: Cloudflare zone ID (required)
//! - `DDNS_RECORD_NAME`: record to keep updated (required)
//! - `DDNS_PROVIDER_API_BASE`: API root (default: public Cloudflare API)
//! - `DDNS_LISTEN_ADDR`: bind address (default `0.0.0.0:8080`)
//! - `DDNS_CLIENT_IP_HEADER`: trusted header with the client address, when
//!   running behind a proxy (default: TCP peer address)
//! - `DDNS_FRESHNESS_WINDOW_SECS`: maximum request age (default 300)
//! - `DDNS_MAX_FUTURE_SKEW_SECS`: bound on future timestamps (default unset)
//! - `DDNS_MODE`: `live` or `dry-run`
//! - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error

use anyhow::{Context, Result};
use ddns_core::config::{
    AuthConfig, DEFAULT_CLOUDFLARE_API_BASE, DEFAULT_FRESHNESS_WINDOW_SECS, DEFAULT_LISTEN_ADDR,
    EdgeConfig, ProviderConfig, RecordConfig, Secret, ServerConfig, validate_domain_name,
};
use std::str::FromStr;

/// Daemon settings as read from the environment
#[derive(Debug, Clone)]
pub struct Settings {
    pub shared_key: Secret,
    pub provider_api_token: Secret,
    pub provider_zone_id: String,
    pub provider_api_base: String,
    pub record_name: String,
    pub listen_addr: String,
    pub client_ip_header: Option<String>,
    pub freshness_window_secs: u64,
    pub max_future_skew_secs: Option<u64>,
    pub mode: String,
    pub log_level: String,
}

impl Settings {
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

        Ok(Self {
            shared_key: Secret::new(required("DDNS_SHARED_KEY")?),
            provider_api_token: Secret::new(required("DDNS_PROVIDER_API_TOKEN")?),
            provider_zone_id: required("DDNS_PROVIDER_ZONE_ID")?,
            record_name: required("DDNS_RECORD_NAME")?,
            provider_api_base: lookup("DDNS_PROVIDER_API_BASE")
                .unwrap_or_else(|| DEFAULT_CLOUDFLARE_API_BASE.to_string()),
            listen_addr: lookup("DDNS_LISTEN_ADDR")
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            client_ip_header: lookup("DDNS_CLIENT_IP_HEADER").filter(|v| !v.is_empty()),
            freshness_window_secs: parse_opt(&lookup, "DDNS_FRESHNESS_WINDOW_SECS")?
                .unwrap_or(DEFAULT_FRESHNESS_WINDOW_SECS),
            max_future_skew_secs: parse_opt(&lookup, "DDNS_MAX_FUTURE_SKEW_SECS")?,
            mode: lookup("DDNS_MODE").unwrap_or_else(|| "live".to_string()),
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        // Cloudflare API tokens are typically 40 characters
        if self.provider_api_token.expose().len() < 20 {
            anyhow::bail!(
                "DDNS_PROVIDER_API_TOKEN appears too short ({} chars). \
                Cloudflare tokens are typically 40 characters.",
                self.provider_api_token.expose().len()
            );
        }

        let token_lower = self.provider_api_token.expose().to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
        {
            anyhow::bail!(
                "DDNS_PROVIDER_API_TOKEN appears to be a placeholder. \
                Use an actual API token from your DNS provider."
            );
        }

        validate_domain_name(&self.record_name)
            .with_context(|| format!("DDNS_RECORD_NAME '{}' is not valid", self.record_name))?;

        if !(1..=3600).contains(&self.freshness_window_secs) {
            anyhow::bail!(
                "DDNS_FRESHNESS_WINDOW_SECS must be between 1 and 3600 seconds. Got: {}",
                self.freshness_window_secs
            );
        }

        if let Some(skew) = self.max_future_skew_secs
            && skew > 3600
        {
            anyhow::bail!(
                "DDNS_MAX_FUTURE_SKEW_SECS must be at most 3600 seconds. Got: {}",
                skew
            );
        }

        match self.mode.to_lowercase().as_str() {
            "live" | "dry-run" => {}
            _ => anyhow::bail!(
                "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
                self.mode
            ),
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.to_edge_config().validate()?;
        Ok(())
    }

    pub fn dry_run(&self) -> bool {
        self.mode.eq_ignore_ascii_case("dry-run")
    }

    /// Build the core configuration
    pub fn to_edge_config(&self) -> EdgeConfig {
        let mut auth = AuthConfig::new(self.shared_key.clone())
            .with_freshness_window_secs(self.freshness_window_secs);
        if let Some(skew) = self.max_future_skew_secs {
            auth = auth.with_max_future_skew_secs(skew);
        }

        EdgeConfig {
            auth,
            provider: ProviderConfig::Cloudflare {
                api_token: self.provider_api_token.clone(),
                zone_id: self.provider_zone_id.clone(),
                api_base: self.provider_api_base.clone(),
            },
            record: RecordConfig::new(self.record_name.clone()).with_dry_run(self.dry_run()),
            server: ServerConfig {
                listen_addr: self.listen_addr.clone(),
                client_ip_header: self.client_ip_header.clone(),
            },
        }
    }
}

fn parse_opt<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.trim()
                .parse::<T>()
                .with_context(|| format!("{} must be a number. Got: {}", key, v))
        })
        .transpose()
}
