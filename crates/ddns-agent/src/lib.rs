// # ddns-agent
//
// Client half of the signed update protocol. One run:
//
// 1. Ask the configured IP echo services for this host's public IPv4,
//    falling over to the next service on any failure
// 2. Serialize `{"addr": ..., "timestamp": <now>}`
// 3. Sign those exact bytes (hex HMAC-SHA256) and POST them to the edge
//    with the signature in `Authorization`
//
// The edge binds `addr` to the connection's source address, so the agent
// must reach the edge from the address it reports.

pub mod settings;

pub use settings::{AgentSettings, DEFAULT_IP_SOURCES};

use ddns_core::{Error, MacVerifier, Result, Secret, UpdateRequest};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// HTTP timeout for IP lookups and the update itself
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Some echo services refuse requests without a User-Agent
const AGENT_USER_AGENT: &str = concat!("ddns-agent/", env!("CARGO_PKG_VERSION"));

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Reports this host's public IPv4 to the edge
pub struct Agent {
    signer: MacVerifier,
    endpoint_url: String,
    ip_sources: Vec<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("endpoint_url", &self.endpoint_url)
            .field("ip_sources", &self.ip_sources)
            .finish_non_exhaustive()
    }
}

impl Agent {
    pub fn new(
        shared_key: &Secret,
        endpoint_url: impl Into<String>,
        ip_sources: Vec<String>,
    ) -> Result<Self> {
        if ip_sources.is_empty() {
            return Err(Error::config("At least one IP source is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .user_agent(AGENT_USER_AGENT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            signer: MacVerifier::new(shared_key)?,
            endpoint_url: endpoint_url.into(),
            ip_sources,
            client,
        })
    }

    pub fn from_settings(settings: &AgentSettings) -> Result<Self> {
        Self::new(
            &settings.shared_key,
            settings.endpoint_url.clone(),
            settings.ip_sources.clone(),
        )
    }

    /// Discover, sign and submit the current address
    pub async fn run_once(&self) -> Result<Ipv4Addr> {
        let addr = self.fetch_ip().await?;
        tracing::info!("Public address: {}", addr);

        self.submit(addr, chrono::Utc::now().timestamp()).await?;
        tracing::info!("DNS record update accepted by {}", self.endpoint_url);
        Ok(addr)
    }

    /// Public IPv4 from the first service that answers with one
    pub async fn fetch_ip(&self) -> Result<Ipv4Addr> {
        let mut last_error = None;

        for source in &self.ip_sources {
            match self.fetch_from(source).await {
                Ok(addr) => return Ok(addr),
                Err(e) => {
                    tracing::warn!("IP source {} failed: {}", source, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::config("No IP sources configured")))
    }

    async fn fetch_from(&self, url: &str) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("HTTP error: {}", response.status())));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        parse_ipv4(&text)
    }

    /// Body and signature for `addr` at `timestamp`
    pub fn signed_payload(&self, addr: Ipv4Addr, timestamp: i64) -> Result<(Vec<u8>, String)> {
        let body = serde_json::to_vec(&UpdateRequest::new(addr.to_string(), timestamp))?;
        let signature = self.signer.sign(&body);
        Ok((body, signature))
    }

    /// POST a signed update for `addr`
    pub async fn submit(&self, addr: Ipv4Addr, timestamp: i64) -> Result<()> {
        let (body, signature) = self.signed_payload(addr, timestamp)?;

        let response = self
            .client
            .post(&self.endpoint_url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(AUTHORIZATION, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::http(format!("Update request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!("Edge rejected the update: {}", status)));
        }

        Ok(())
    }
}

/// Parse an echo service response as an IPv4 address
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr> {
    let text = text.trim();
    match text.parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) => Ok(addr),
        Ok(IpAddr::V6(addr)) => Err(Error::invalid_input(format!(
            "Expected IPv4, got: {}",
            addr
        ))),
        Err(_) => Err(Error::invalid_input(format!(
            "Invalid IP address: {}",
            text
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddns_core::{AuthConfig, RequestValidator, Submission, Verdict};

    fn agent(key: &str) -> Agent {
        Agent::new(
            &Secret::new(key),
            "https://ddns.example.workers.dev",
            vec!["https://api.ipify.org/".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(
            parse_ipv4("203.0.113.5\n").unwrap(),
            Ipv4Addr::new(203, 0, 113, 5)
        );
        assert_eq!(
            parse_ipv4("  198.51.100.7 ").unwrap(),
            Ipv4Addr::new(198, 51, 100, 7)
        );
    }

    #[test]
    fn test_parse_rejects_ipv6_and_garbage() {
        assert!(parse_ipv4("2001:db8::1").is_err());
        assert!(parse_ipv4("<html>").is_err());
        assert!(parse_ipv4("").is_err());
    }

    #[test]
    fn test_no_sources() {
        let result = Agent::new(&Secret::new("k"), "https://x.example", vec![]);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_payload_shape() {
        let (body, signature) = agent("k")
            .signed_payload(Ipv4Addr::new(203, 0, 113, 5), 1_700_000_000)
            .unwrap();

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["addr"], "203.0.113.5");
        assert_eq!(json["timestamp"], 1_700_000_000);
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_payload_accepted_by_validator() {
        let now = 1_700_000_000;
        let (body, signature) = agent("shared")
            .signed_payload(Ipv4Addr::new(203, 0, 113, 5), now)
            .unwrap();

        let validator = RequestValidator::new(&AuthConfig::new(Secret::new("shared"))).unwrap();
        let verdict = validator.validate_at(
            &Submission {
                body: &body,
                signature: Some(&signature),
                source_addr: Some("203.0.113.5"),
            },
            now,
        );
        assert_eq!(verdict, Verdict::Valid("203.0.113.5".to_string()));
    }

    #[test]
    fn test_key_not_in_debug() {
        let rendered = format!("{:?}", agent("super-secret-key"));
        assert!(!rendered.contains("super-secret-key"));
    }
}
