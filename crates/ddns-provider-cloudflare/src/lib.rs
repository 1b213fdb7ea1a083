// # Cloudflare DNS Provider
//
// `DnsProvider` implementation over the Cloudflare API v4.
//
// - One HTTP request per trait call, no retries, no caching
// - HTTP timeout of 30 seconds
// - Status codes mapped to specific errors (401/403, 404, 409, 429, 5xx)
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Construction fails if the token or zone is empty
//
// ## API Reference
//
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::config::{DEFAULT_CLOUDFLARE_API_BASE, ProviderConfig, Secret};
use ddns_core::traits::{DnsProvider, DnsRecord};
use ddns_core::{Error, Result};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cloudflare DNS provider bound to one zone
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: Secret,

    /// Zone ID
    zone_id: String,

    /// API base URL, without the `/zones` segment
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Zone holding the managed record
    /// - `api_base`: API root, e.g. `https://api.cloudflare.com/client/v4`
    pub fn new(
        api_token: Secret,
        zone_id: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self> {
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let zone_id = zone_id.into();
        if zone_id.is_empty() {
            return Err(Error::config("Cloudflare zone ID cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Create a provider against the public Cloudflare API
    pub fn with_default_base(api_token: Secret, zone_id: impl Into<String>) -> Result<Self> {
        Self::new(api_token, zone_id, DEFAULT_CLOUDFLARE_API_BASE)
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                zone_id,
                api_base,
                ..
            } => Self::new(api_token.clone(), zone_id.clone(), api_base.clone()),
        }
    }

    /// `{base}/zones/{zone}/dns_records`
    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, self.zone_id)
    }

    /// `{base}/zones/{zone}/dns_records/{id}`
    fn record_url(&self, record_id: &str) -> String {
        format!("{}/{}", self.records_url(), record_id)
    }
}

/// Map a non-success status to an error
fn status_error(status: StatusCode, error_text: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            "cloudflare",
            format!(
                "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::not_found(format!("{}: {}", context, status)),
        409 => Error::provider(
            "cloudflare",
            format!(
                "Conflict: Record is being updated by another process. Status: {}",
                status
            ),
        ),
        429 => Error::provider(
            "cloudflare",
            format!("Rate limit exceeded. Status: {}", status),
        ),
        500..=599 => Error::provider(
            "cloudflare",
            format!(
                "Cloudflare server error (transient): {} - {}",
                status, error_text
            ),
        ),
        _ => Error::provider(
            "cloudflare",
            format!("{}: {} - {}", context, status, error_text),
        ),
    }
}

/// First entry of `result`, as a record
fn first_record(json: &Value) -> Result<Option<DnsRecord>> {
    let records = json["result"].as_array().ok_or_else(|| {
        Error::provider(
            "cloudflare",
            "Invalid response format: result is not an array",
        )
    })?;

    let Some(record) = records.first() else {
        return Ok(None);
    };

    let id = record["id"].as_str().ok_or_else(|| {
        Error::provider(
            "cloudflare",
            "Invalid response format: record.id is not a string",
        )
    })?;

    let content = record["content"].as_str().ok_or_else(|| {
        Error::provider(
            "cloudflare",
            "Invalid response format: record.content is not a string",
        )
    })?;

    Ok(Some(DnsRecord::new(id, content)))
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn find_record(&self, record_name: &str) -> Result<Option<DnsRecord>> {
        tracing::debug!("Looking up record: {}", record_name);

        let response = self
            .client
            .get(self.records_url())
            .query(&[("name", record_name)])
            .bearer_auth(self.api_token.expose())
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, "Get record failed"));
        }

        let json: Value = response.json().await.map_err(|e| {
            Error::provider("cloudflare", format!("Failed to parse response: {}", e))
        })?;

        let record = first_record(&json)?;
        if let Some(record) = &record {
            tracing::debug!("Found record ID: {}", record.id);
        }
        Ok(record)
    }

    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// Authorization: Bearer <token>
    ///
    /// { "content": "203.0.113.5" }
    /// ```
    async fn patch_content(&self, record_id: &str, content: &str) -> Result<()> {
        let response = self
            .client
            .patch(self.record_url(record_id))
            .bearer_auth(self.api_token.expose())
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await
            .map_err(|e| Error::provider("cloudflare", format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &error_text, "Failed to update record"));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
