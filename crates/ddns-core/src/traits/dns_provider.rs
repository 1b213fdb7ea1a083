// # DNS Provider Trait
//
// Defines the interface the record updater uses to read and patch the
// managed record through a provider's HTTP API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// let record = provider.find_record("home.example.com").await?;
// if let Some(record) = record {
//     provider.patch_content(&record.id, "203.0.113.5").await?;
// }
// ```

use async_trait::async_trait;

/// A DNS record as returned by the provider's lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned record identifier
    pub id: String,
    /// Current record content (the IP address)
    pub content: String,
}

impl DnsRecord {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }
}

/// Trait for DNS provider implementations
///
/// Providers are stateless and single-shot: each method is one HTTP call,
/// with no caching, retries or background tasks. Deciding whether a write
/// is needed belongs to [`RecordUpdater`](crate::updater::RecordUpdater).
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up a record by name in the configured zone.
    ///
    /// Returns `Ok(None)` when the lookup succeeds but yields no record.
    /// When several records match, the first one is used.
    async fn find_record(&self, record_name: &str) -> Result<Option<DnsRecord>, crate::Error>;

    /// Set the content of a record (partial update).
    async fn patch_content(&self, record_id: &str, content: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
