//! Request authentication
//!
//! - [`MacVerifier`]: HMAC-SHA256 over the raw body, hex on the wire
//! - [`RequestValidator`]: the ordered, fail-closed check chain

pub mod mac;
pub mod validator;

pub use mac::{MacError, MacVerifier};
pub use validator::{RejectReason, RequestValidator, Submission, UpdateRequest, Verdict};
