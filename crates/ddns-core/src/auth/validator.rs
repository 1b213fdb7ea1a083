//! Validation of signed update requests.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. body is UTF-8 text
//! 2. body parses as `{"addr": <string>, "timestamp": <integer>}`
//! 3. signature present, `addr` present, source address present and equal to `addr`
//! 4. signature verifies over the raw body
//! 5. timestamp is inside the freshness window
//!
//! Every failure is a [`Verdict::Invalid`]; nothing here panics or returns
//! an error. The [`RejectReason`] is for logs and tests only and must not be
//! reflected to the client.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::mac::{MacError, MacVerifier};
use crate::config::AuthConfig;

/// Body of an update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Claimed public address, dotted-decimal IPv4
    #[serde(default)]
    pub addr: String,

    /// Unix seconds at signing time
    pub timestamp: i64,
}

impl UpdateRequest {
    pub fn new(addr: impl Into<String>, timestamp: i64) -> Self {
        Self {
            addr: addr.into(),
            timestamp,
        }
    }
}

/// One inbound request, as seen by the validator
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    /// Raw body bytes, exactly as received
    pub body: &'a [u8],

    /// Value of the `Authorization` header
    pub signature: Option<&'a str>,

    /// Address observed at the connection level
    pub source_addr: Option<&'a str>,
}

/// Outcome of validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Authentic and fresh; carries the connection-level source address
    Valid(String),
    /// Rejected
    Invalid(RejectReason),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid(_))
    }
}

/// Why a request was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnreadableBody,
    MalformedBody,
    MissingSignature,
    MissingAddress,
    MissingSourceAddress,
    AddressMismatch,
    MalformedSignature,
    SignatureMismatch,
    Stale,
    FromFuture,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::UnreadableBody => "unreadable_body",
            RejectReason::MalformedBody => "malformed_body",
            RejectReason::MissingSignature => "missing_signature",
            RejectReason::MissingAddress => "missing_address",
            RejectReason::MissingSourceAddress => "missing_source_address",
            RejectReason::AddressMismatch => "address_mismatch",
            RejectReason::MalformedSignature => "malformed_signature",
            RejectReason::SignatureMismatch => "signature_mismatch",
            RejectReason::Stale => "stale",
            RejectReason::FromFuture => "from_future",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<MacError> for RejectReason {
    fn from(err: MacError) -> Self {
        match err {
            MacError::MalformedHex => RejectReason::MalformedSignature,
            MacError::Mismatch => RejectReason::SignatureMismatch,
        }
    }
}

/// Authenticates update requests against the shared secret
#[derive(Debug, Clone)]
pub struct RequestValidator {
    mac: MacVerifier,
    freshness_window_secs: i64,
    max_future_skew_secs: Option<i64>,
}

impl RequestValidator {
    pub fn new(config: &AuthConfig) -> crate::Result<Self> {
        Ok(Self {
            mac: MacVerifier::new(&config.shared_secret)?,
            freshness_window_secs: clamp_secs(config.freshness_window_secs),
            max_future_skew_secs: config.max_future_skew_secs.map(clamp_secs),
        })
    }

    /// The verifier this validator signs with
    pub fn mac(&self) -> &MacVerifier {
        &self.mac
    }

    /// Validate against the current wall clock
    pub fn validate(&self, submission: &Submission<'_>) -> Verdict {
        self.validate_at(submission, chrono::Utc::now().timestamp())
    }

    /// Validate as of `now` (unix seconds)
    pub fn validate_at(&self, submission: &Submission<'_>, now: i64) -> Verdict {
        match self.check(submission, now) {
            Ok(source_addr) => Verdict::Valid(source_addr.to_string()),
            Err(reason) => {
                tracing::debug!(reason = %reason, "Update request failed validation");
                Verdict::Invalid(reason)
            }
        }
    }

    fn check<'a>(&self, submission: &Submission<'a>, now: i64) -> Result<&'a str, RejectReason> {
        let text =
            std::str::from_utf8(submission.body).map_err(|_| RejectReason::UnreadableBody)?;

        let request: UpdateRequest =
            serde_json::from_str(text).map_err(|_| RejectReason::MalformedBody)?;

        let signature = submission
            .signature
            .filter(|s| !s.is_empty())
            .ok_or(RejectReason::MissingSignature)?;

        if request.addr.is_empty() {
            return Err(RejectReason::MissingAddress);
        }

        let source_addr = submission
            .source_addr
            .filter(|s| !s.is_empty())
            .ok_or(RejectReason::MissingSourceAddress)?;

        // Plain string equality, no address normalization.
        if source_addr != request.addr {
            return Err(RejectReason::AddressMismatch);
        }

        self.mac.check(signature, submission.body)?;

        if now.saturating_sub(request.timestamp) > self.freshness_window_secs {
            return Err(RejectReason::Stale);
        }

        if let Some(skew) = self.max_future_skew_secs
            && request.timestamp.saturating_sub(now) > skew
        {
            return Err(RejectReason::FromFuture);
        }

        Ok(source_addr)
    }
}

fn clamp_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}
