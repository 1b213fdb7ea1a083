// # Record Updater
//
// Points the managed DNS record at a verified address:
//
// 1. look the record up by name (fresh every time, nothing cached)
// 2. abort on lookup failure or a missing record
// 3. patch `content` only when it differs from the address
//
// Best effort: failures are logged and reported as an `UpdateOutcome`, never
// as an error. No retries, no backoff.

use std::fmt;
use std::sync::Arc;

use crate::traits::DnsProvider;

/// What happened to the record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Content was patched
    Updated {
        /// Content before the patch
        previous: String,
        /// Content after the patch
        current: String,
    },
    /// Content already matched; no write issued
    Unchanged {
        /// The current content
        current: String,
    },
    /// Provider skipped the write (dry-run)
    Skipped {
        /// Content left in place
        current: String,
        /// Content that would have been written
        intended: String,
    },
    /// Lookup returned no record
    RecordMissing,
    /// Lookup call failed
    LookupFailed(String),
    /// Patch call failed
    WriteFailed(String),
}

impl UpdateOutcome {
    /// `true` when the record now holds the requested address
    pub fn is_current(&self) -> bool {
        matches!(
            self,
            UpdateOutcome::Updated { .. } | UpdateOutcome::Unchanged { .. }
        )
    }
}

impl fmt::Display for UpdateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateOutcome::Updated { previous, current } => {
                write!(f, "updated {} -> {}", previous, current)
            }
            UpdateOutcome::Unchanged { current } => write!(f, "unchanged at {}", current),
            UpdateOutcome::Skipped { current, intended } => {
                write!(f, "skipped {} -> {}", current, intended)
            }
            UpdateOutcome::RecordMissing => f.write_str("record missing"),
            UpdateOutcome::LookupFailed(e) => write!(f, "lookup failed: {}", e),
            UpdateOutcome::WriteFailed(e) => write!(f, "write failed: {}", e),
        }
    }
}

/// Keeps one DNS record pointed at the last verified address
#[derive(Clone)]
pub struct RecordUpdater {
    provider: Arc<dyn DnsProvider>,
    record_name: String,
    dry_run: bool,
}

impl RecordUpdater {
    pub fn new(provider: Arc<dyn DnsProvider>, record_name: impl Into<String>) -> Self {
        Self {
            provider,
            record_name: record_name.into(),
            dry_run: false,
        }
    }

    /// Read the record but never write it
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Point the record at `verified_addr` if it does not already.
    pub async fn update_record(&self, verified_addr: &str) -> UpdateOutcome {
        let provider = self.provider.provider_name();

        let record = match self.provider.find_record(&self.record_name).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::error!(
                    provider,
                    record = %self.record_name,
                    "DNS record not found, skipping update"
                );
                return UpdateOutcome::RecordMissing;
            }
            Err(e) => {
                tracing::error!(
                    provider,
                    record = %self.record_name,
                    error = %e,
                    "Get record failed"
                );
                return UpdateOutcome::LookupFailed(e.to_string());
            }
        };

        if record.content == verified_addr {
            tracing::info!(
                record = %self.record_name,
                content = %record.content,
                "Record content is the same, skipping update"
            );
            return UpdateOutcome::Unchanged {
                current: record.content,
            };
        }

        if self.dry_run {
            tracing::info!(
                record = %self.record_name,
                "[DRY-RUN] Would update record: {} -> {}",
                record.content,
                verified_addr
            );
            return UpdateOutcome::Skipped {
                current: record.content,
                intended: verified_addr.to_string(),
            };
        }

        match self.provider.patch_content(&record.id, verified_addr).await {
            Ok(()) => {
                tracing::info!(
                    record = %self.record_name,
                    "Updated record: {} -> {}",
                    record.content,
                    verified_addr
                );
                UpdateOutcome::Updated {
                    previous: record.content,
                    current: verified_addr.to_string(),
                }
            }
            Err(e) => {
                tracing::error!(
                    provider,
                    record = %self.record_name,
                    error = %e,
                    "Record update failed"
                );
                UpdateOutcome::WriteFailed(e.to_string())
            }
        }
    }
}

impl fmt::Debug for RecordUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordUpdater")
            .field("provider", &self.provider.provider_name())
            .field("record_name", &self.record_name)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}
