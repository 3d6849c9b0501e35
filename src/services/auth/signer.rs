//! HMAC-SHA256 signing over the token signing input.
//!
//! Verification recomputes the tag and compares it with [`constant_time_eq`],
//! whose running time depends only on the slice length.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SIGNATURE_LEN: usize = 32;

/// Process-wide signing key, loaded once at startup and never mutated.
#[derive(Clone)]
pub struct HmacSigner {
    key: Arc<[u8]>,
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("HmacSigner")
            .field("key_length", &self.key.len())
            .finish_non_exhaustive()
    }
}

impl HmacSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: Arc::from(key.as_ref()),
        }
    }

    fn mac(&self) -> Hmac<Sha256> {
        // HMAC accepts keys of any length (long keys are hashed first).
        <Hmac<Sha256> as Mac>::new_from_slice(&self.key)
            .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts any key length"))
    }

    pub fn sign(&self, signing_input: &[u8]) -> [u8; SIGNATURE_LEN] {
        let mut mac = self.mac();
        mac.update(signing_input);
        let mut tag = [0u8; SIGNATURE_LEN];
        tag.copy_from_slice(&mac.finalize().into_bytes());
        tag
    }

    pub fn verify(&self, signing_input: &[u8], signature: &[u8]) -> bool {
        let expected = self.sign(signing_input);
        constant_time_eq(&expected, signature)
    }
}

/// Constant-time byte comparison.
///
/// Length is not secret, so a length mismatch returns early. Otherwise every
/// byte pair is XORed into an accumulator and only the final value decides.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let diff = a
        .iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));

    diff == 0
}
