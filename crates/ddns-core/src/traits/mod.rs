//! Core traits for the DDNS edge updater
//!
//! - [`DnsProvider`]: Read and patch DNS records via provider APIs

pub mod dns_provider;

pub use dns_provider::{DnsProvider, DnsRecord};
