//! Keyed MAC over canonical session metadata.
//!
//! The signature makes session metadata tamper-evident: any component reading
//! a session for a trust decision recomputes the MAC before acting. The
//! session token is deliberately never part of the signed payload.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::session::types::TransactionMetadata;

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies transaction metadata with a server-held secret.
pub struct Signer {
    key: Vec<u8>,
}

impl Signer {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    /// Compute the HMAC-SHA256 of the metadata's canonical byte form,
    /// returned as lowercase hex.
    pub fn sign(&self, metadata: &TransactionMetadata) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(&metadata.canonical_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Recompute the MAC and compare in constant time.
    ///
    /// Returns false for any mismatch, including malformed hex. The
    /// comparison goes through `Mac::verify_slice`, which is constant-time;
    /// never compare the hex strings directly.
    pub fn verify(&self, metadata: &TransactionMetadata, signature: &str) -> bool {
        let Ok(sig_bytes) = hex::decode(signature) else {
            return false;
        };
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(&metadata.canonical_bytes());
        mac.verify_slice(&sig_bytes).is_ok()
    }
}
