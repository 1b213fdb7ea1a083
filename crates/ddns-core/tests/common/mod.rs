//! Test doubles and common utilities for contract tests
//!
//! These doubles stand in for the provider API and count every call so the
//! tests can assert on exactly what reached the "network".

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord};
use ddns_core::{AuthConfig, RequestValidator, Secret, UpdateRequest};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const RECORD_NAME: &str = "home.example.com";
pub const SHARED_KEY: &str = "contract-test-key";

/// An in-memory provider holding a single record and counting calls
pub struct CountingDnsProvider {
    /// The record, if it exists
    record: Arc<std::sync::Mutex<Option<DnsRecord>>>,
    /// Call counter for find_record()
    find_call_count: Arc<AtomicUsize>,
    /// Call counter for patch_content()
    patch_call_count: Arc<AtomicUsize>,
    /// Make find_record() fail
    fail_lookup: bool,
}

impl CountingDnsProvider {
    /// A provider whose record currently holds `content`
    pub fn with_content(content: &str) -> Self {
        Self {
            record: Arc::new(std::sync::Mutex::new(Some(DnsRecord::new("rec-1", content)))),
            find_call_count: Arc::new(AtomicUsize::new(0)),
            patch_call_count: Arc::new(AtomicUsize::new(0)),
            fail_lookup: false,
        }
    }

    /// A provider with no matching record
    pub fn empty() -> Self {
        Self {
            record: Arc::new(std::sync::Mutex::new(None)),
            ..Self::with_content("")
        }
    }

    /// A provider whose lookups always fail
    pub fn failing() -> Self {
        Self {
            fail_lookup: true,
            ..Self::with_content("")
        }
    }

    /// Get the number of times find_record() was called
    pub fn find_call_count(&self) -> usize {
        self.find_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times patch_content() was called
    pub fn patch_call_count(&self) -> usize {
        self.patch_call_count.load(Ordering::SeqCst)
    }

    /// Current record content
    pub fn content(&self) -> Option<String> {
        self.record
            .lock()
            .unwrap()
            .as_ref()
            .map(|r| r.content.clone())
    }
}

#[async_trait::async_trait]
impl DnsProvider for CountingDnsProvider {
    async fn find_record(&self, record_name: &str) -> Result<Option<DnsRecord>> {
        self.find_call_count.fetch_add(1, Ordering::SeqCst);
        assert_eq!(record_name, RECORD_NAME);

        if self.fail_lookup {
            return Err(Error::provider("counting", "Get record failed: 503"));
        }
        Ok(self.record.lock().unwrap().clone())
    }

    async fn patch_content(&self, record_id: &str, content: &str) -> Result<()> {
        self.patch_call_count.fetch_add(1, Ordering::SeqCst);

        let mut record = self.record.lock().unwrap();
        match record.as_mut() {
            Some(r) if r.id == record_id => {
                r.content = content.to_string();
                Ok(())
            }
            _ => Err(Error::not_found(record_id.to_string())),
        }
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// Validator keyed with [`SHARED_KEY`]
pub fn validator() -> RequestValidator {
    RequestValidator::new(&AuthConfig::new(Secret::new(SHARED_KEY))).unwrap()
}

/// Serialized update body, byte-for-byte what an agent sends
pub fn signed_body(key: &str, addr: &str, timestamp: i64) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(&UpdateRequest::new(addr, timestamp)).unwrap();
    let signer = ddns_core::MacVerifier::new(&Secret::new(key)).unwrap();
    let signature = signer.sign(&body);
    (body, signature)
}
