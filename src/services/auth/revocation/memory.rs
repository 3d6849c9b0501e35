use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::services::auth::revocation::store::{RevocationError, RevocationOracle, token_key};

/// Process-local revocation set.
///
/// Entries remember the token's own expiry so `purge_expired` can drop them
/// once they no longer matter. Lost on restart.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRevocationStore {
    revoked: Arc<DashMap<String, i64>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    /// Remove records whose token expired at or before `now`. Returns how many
    /// were removed.
    pub fn purge_expired(&self, now: i64) -> usize {
        let before = self.revoked.len();
        self.revoked.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.revoked.len())
    }
}

#[async_trait]
impl RevocationOracle for InMemoryRevocationStore {
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        Ok(self.revoked.contains_key(&token_key(token)))
    }

    async fn revoke(&self, token: &str, expires_at: i64) -> Result<(), RevocationError> {
        if token.trim().is_empty() {
            return Ok(());
        }
        self.revoked
            .entry(token_key(token))
            .and_modify(|exp| *exp = (*exp).max(expires_at))
            .or_insert(expires_at);
        Ok(())
    }
}
