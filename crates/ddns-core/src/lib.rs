// # ddns-core
//
// Core library for the signed DDNS edge updater.
//
// ## Architecture Overview
//
// An agent on the host whose address should be published POSTs
// `{"addr": "<ipv4>", "timestamp": <unix>}` with an HMAC-SHA256 of the raw
// body in `Authorization`. The edge:
//
// - **RequestValidator**: binds `addr` to the connection's source address,
//   verifies the MAC and enforces the freshness window (fail-closed)
// - **MacVerifier**: constant-time hex HMAC-SHA256 verification
// - **RecordUpdater**: reads the managed record and patches it when the
//   content differs, through a **DnsProvider**
//
// Nothing is kept between requests.

pub mod auth;
pub mod config;
pub mod error;
pub mod traits;
pub mod updater;

// Re-export core types for convenience
pub use auth::{MacVerifier, RejectReason, RequestValidator, Submission, UpdateRequest, Verdict};
pub use config::{AuthConfig, EdgeConfig, ProviderConfig, RecordConfig, Secret, ServerConfig};
pub use error::{Error, Result};
pub use traits::{DnsProvider, DnsRecord};
pub use updater::{RecordUpdater, UpdateOutcome};
