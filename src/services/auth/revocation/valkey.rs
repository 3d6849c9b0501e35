use async_trait::async_trait;
use chrono::Utc;
use std::{sync::Arc, time::Duration};
use tracing::debug;

use crate::services::{
    auth::revocation::store::{RevocationError, RevocationOracle, token_key},
    cache::{CacheClient, ValkeyClient},
};

/// Valkey-backed revocation store (Redis protocol).
///
/// Each record is `SET <prefix>:<sha256> 1 EX <ttl>` with the TTL running to
/// the token's own expiry, so the backend cleans up after itself. Backend
/// errors surface as `Err` (fail closed).
#[derive(Clone)]
pub struct ValkeyRevocationStore<C: CacheClient> {
    cache: Arc<C>,
    // Key prefix to avoid collisions across environments
    prefix: String,
}

impl ValkeyRevocationStore<ValkeyClient> {
    pub async fn new(redis_url: &str) -> Result<Self, RevocationError> {
        let client = ValkeyClient::new(redis_url).await?;
        Ok(Self::new_with_cache(Arc::new(client), "auth:revoked"))
    }
}

impl<C: CacheClient> ValkeyRevocationStore<C> {
    pub fn new_with_cache(cache: Arc<C>, prefix: impl Into<String>) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, token: &str) -> String {
        format!("{}:{}", self.prefix, token_key(token))
    }
}

#[async_trait]
impl<C: CacheClient> RevocationOracle for ValkeyRevocationStore<C> {
    async fn is_revoked(&self, token: &str) -> Result<bool, RevocationError> {
        Ok(self.cache.exists(&self.key(token)).await?)
    }

    async fn revoke(&self, token: &str, expires_at: i64) -> Result<(), RevocationError> {
        let remaining = expires_at.saturating_sub(Utc::now().timestamp()).max(1);
        let ttl = Duration::from_secs(remaining.unsigned_abs());

        debug!(
            backend = self.cache.backend_name(),
            ttl_seconds = ttl.as_secs(),
            "recording token revocation"
        );

        self.cache.set_with_ttl(&self.key(token), "1", ttl).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::client::{CacheError, CacheResult};
    use dashmap::DashMap;

    #[derive(Clone, Default)]
    struct FakeCache {
        entries: Arc<DashMap<String, u64>>,
        broken: bool,
    }

    #[async_trait]
    impl CacheClient for FakeCache {
        fn backend_name(&self) -> &'static str {
            "fake"
        }

        async fn exists(&self, key: &str) -> CacheResult<bool> {
            if self.broken {
                return Err(CacheError::BackendConnection("down".into()));
            }
            Ok(self.entries.contains_key(key))
        }

        async fn set_with_ttl(&self, key: &str, _value: &str, ttl: Duration) -> CacheResult<()> {
            if self.broken {
                return Err(CacheError::BackendConnection("down".into()));
            }
            self.entries.insert(key.to_string(), ttl.as_secs());
            Ok(())
        }
    }

    #[tokio::test]
    async fn revoke_sets_prefixed_key_with_remaining_ttl() {
        let cache = Arc::new(FakeCache::default());
        let store = ValkeyRevocationStore::new_with_cache(cache.clone(), "test");

        let expires_at = Utc::now().timestamp() + 600;
        store.revoke("tok", expires_at).await.unwrap();

        let key = format!("test:{}", token_key("tok"));
        let ttl = *cache.entries.get(&key).unwrap();
        assert!((595..=600).contains(&ttl), "ttl was {ttl}");
        assert!(store.is_revoked("tok").await.unwrap());
        assert!(!store.is_revoked("other").await.unwrap());
    }

    #[tokio::test]
    async fn already_expired_token_gets_minimal_ttl() {
        let cache = Arc::new(FakeCache::default());
        let store = ValkeyRevocationStore::new_with_cache(cache.clone(), "test");

        store.revoke("tok", 0).await.unwrap();
        assert_eq!(*cache.entries.get(&store.key("tok")).unwrap(), 1);
    }

    #[tokio::test]
    async fn backend_failure_is_an_error() {
        let cache = Arc::new(FakeCache {
            broken: true,
            ..Default::default()
        });
        let store = ValkeyRevocationStore::new_with_cache(cache, "test");

        assert!(store.is_revoked("tok").await.is_err());
        assert!(store.revoke("tok", 0).await.is_err());
    }
}
