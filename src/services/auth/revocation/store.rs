use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::services::cache::CacheError;

/// Out-of-band token revocation.
///
/// - `is_revoked` is consulted on every authenticated request, before the
///   signature is checked.
/// - `Err(_)` means the backend could not answer; callers must fail closed.
#[async_trait]
pub trait RevocationOracle: Send + Sync {
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError>;

    /// Record `token` as revoked until `expires_at` (unix seconds). After that
    /// the token is dead anyway and the record may be dropped.
    async fn revoke(&self, token: &str, expires_at: i64) -> Result<(), RevocationError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Storage key for a token: hex(sha256(token)). Raw tokens are never stored.
pub fn token_key(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
