//! HMAC-SHA256 signing and verification of raw request bodies.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use crate::config::Secret;

type HmacSha256 = Hmac<Sha256>;

/// Why a signature did not verify
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacError {
    /// Odd length or non-hex characters
    #[error("signature is not valid hex")]
    MalformedHex,

    /// Well-formed but does not match the body
    #[error("signature does not match message")]
    Mismatch,
}

/// Verifies hex-encoded HMAC-SHA256 signatures with the shared secret.
#[derive(Clone)]
pub struct MacVerifier {
    keyed: HmacSha256,
}

impl MacVerifier {
    /// Key a verifier with the shared secret.
    pub fn new(secret: &Secret) -> crate::Result<Self> {
        let keyed = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| crate::Error::config(format!("Unusable shared secret: {}", e)))?;
        Ok(Self { keyed })
    }

    /// `true` when `signature_hex` is the MAC of `message`.
    ///
    /// Never panics; malformed hex is simply `false`.
    pub fn verify(&self, signature_hex: &str, message: &[u8]) -> bool {
        self.check(signature_hex, message).is_ok()
    }

    /// Like [`verify`](Self::verify) but reports the failure kind.
    ///
    /// The comparison is constant-time (`verify_slice`).
    pub fn check(&self, signature_hex: &str, message: &[u8]) -> Result<(), MacError> {
        let expected = hex::decode(signature_hex).map_err(|_| MacError::MalformedHex)?;

        let mut mac = self.keyed.clone();
        mac.update(message);
        mac.verify_slice(&expected).map_err(|_| MacError::Mismatch)
    }

    /// Lowercase hex MAC of `message`.
    pub fn sign(&self, message: &[u8]) -> String {
        let mut mac = self.keyed.clone();
        mac.update(message);
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for MacVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacVerifier")
            .field("key", &"<REDACTED>")
            .finish()
    }
}
