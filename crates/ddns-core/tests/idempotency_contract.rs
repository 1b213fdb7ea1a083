//! Contract Test: Record Update Idempotency
//!
//! Constraints verified:
//! - The record is read fresh on every call
//! - A write happens only when the content differs
//! - Lookup failures and missing records abort without a write
//!
//! If this test fails, the updater is issuing redundant or unsafe writes.

mod common;

use common::*;
use ddns_core::{RecordUpdater, UpdateOutcome};
use std::sync::Arc;

#[tokio::test]
async fn same_address_twice_writes_once() {
    let provider = Arc::new(CountingDnsProvider::with_content("198.51.100.7"));
    let updater = RecordUpdater::new(provider.clone(), RECORD_NAME);

    let first = updater.update_record("203.0.113.5").await;
    assert!(matches!(first, UpdateOutcome::Updated { .. }));
    assert_eq!(provider.find_call_count(), 1);
    assert_eq!(provider.patch_call_count(), 1);

    let second = updater.update_record("203.0.113.5").await;
    assert_eq!(
        second,
        UpdateOutcome::Unchanged {
            current: "203.0.113.5".to_string()
        }
    );

    // Second call: exactly one more read, zero more writes
    assert_eq!(provider.find_call_count(), 2);
    assert_eq!(provider.patch_call_count(), 1);
}

#[tokio::test]
async fn already_current_address_never_writes() {
    let provider = Arc::new(CountingDnsProvider::with_content("203.0.113.5"));
    let updater = RecordUpdater::new(provider.clone(), RECORD_NAME);

    for _ in 0..2 {
        let outcome = updater.update_record("203.0.113.5").await;
        assert!(matches!(outcome, UpdateOutcome::Unchanged { .. }));
    }

    assert_eq!(provider.find_call_count(), 2);
    assert_eq!(provider.patch_call_count(), 0);
}

#[tokio::test]
async fn address_change_writes_again() {
    let provider = Arc::new(CountingDnsProvider::with_content("198.51.100.7"));
    let updater = RecordUpdater::new(provider.clone(), RECORD_NAME);

    updater.update_record("203.0.113.5").await;
    let outcome = updater.update_record("203.0.113.9").await;

    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            previous: "203.0.113.5".to_string(),
            current: "203.0.113.9".to_string(),
        }
    );
    assert_eq!(provider.patch_call_count(), 2);
    assert_eq!(provider.content().as_deref(), Some("203.0.113.9"));
}

#[tokio::test]
async fn missing_record_aborts_without_write() {
    let provider = Arc::new(CountingDnsProvider::empty());
    let updater = RecordUpdater::new(provider.clone(), RECORD_NAME);

    assert_eq!(
        updater.update_record("203.0.113.5").await,
        UpdateOutcome::RecordMissing
    );
    assert_eq!(provider.find_call_count(), 1);
    assert_eq!(provider.patch_call_count(), 0);
}

#[tokio::test]
async fn lookup_failure_aborts_without_write() {
    let provider = Arc::new(CountingDnsProvider::failing());
    let updater = RecordUpdater::new(provider.clone(), RECORD_NAME);

    let outcome = updater.update_record("203.0.113.5").await;
    assert!(matches!(outcome, UpdateOutcome::LookupFailed(_)));
    assert_eq!(provider.patch_call_count(), 0);
}
