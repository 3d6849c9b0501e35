//! Per-request authentication decision.
//!
//! ```text
//! Start ─┬─ public path ───────────────────────────────► Unauthenticated
//!        ├─ no bearer credential ──────────────────────► Unauthenticated
//!        └─ token ─► revoked? ─► decode ─► signature ─► expiry ─► principal
//!                     │ yes       │ bad      │ bad        │ now≥exp   │ missing / other subject
//!                     ▼           ▼          ▼            ▼           ▼
//!                             Unauthenticated (kind kept for logs only)
//! ```
//!
//! The outcome never aborts the request. Whether an unauthenticated request
//! may proceed is decided downstream (extractors / handlers).

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::warn;

use crate::services::auth::{
    access_token::AuthService,
    error::AuthError,
    principal::{Principal, PrincipalError, PrincipalLookup},
    public_paths::PublicPaths,
    revocation::RevocationOracle,
};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub principal: Principal,
    /// Token expiry (unix seconds).
    pub expires_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unauthenticated {
    PublicPath,
    NoCredential,
    Rejected(AuthError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(Authenticated),
    Unauthenticated(Unauthenticated),
}

impl AuthOutcome {
    fn rejected(err: AuthError) -> Self {
        Self::Unauthenticated(Unauthenticated::Rejected(err))
    }
}

/// Extract the token from an `Authorization` header value.
///
/// A missing header, another scheme, or an empty token all mean "no
/// credential supplied".
pub fn bearer_token(authorization: Option<&str>) -> Option<&str> {
    authorization?
        .strip_prefix(BEARER_PREFIX)
        .filter(|t| !t.is_empty())
}

#[derive(Clone)]
pub struct Authenticator {
    tokens: AuthService,
    revocations: Arc<dyn RevocationOracle>,
    principals: Arc<dyn PrincipalLookup>,
    public_paths: PublicPaths,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("tokens", &self.tokens)
            .field("public_paths", &self.public_paths)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    pub fn new(
        tokens: AuthService,
        revocations: Arc<dyn RevocationOracle>,
        principals: Arc<dyn PrincipalLookup>,
        public_paths: PublicPaths,
    ) -> Self {
        Self {
            tokens,
            revocations,
            principals,
            public_paths,
        }
    }

    pub fn revocations(&self) -> &dyn RevocationOracle {
        self.revocations.as_ref()
    }

    /// Decide the outcome for one request.
    ///
    /// Pure function of (path, header, `now`, secret) plus the current state of
    /// the revocation and principal collaborators; running it twice yields the
    /// same result. A panic inside a collaborator is contained here and
    /// reported as `Malformed`.
    pub async fn authenticate(
        &self,
        path: &str,
        authorization: Option<&str>,
        now: i64,
    ) -> AuthOutcome {
        match AssertUnwindSafe(self.decide(path, authorization, now))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(path, "authentication panicked; treating request as unauthenticated");
                AuthOutcome::rejected(AuthError::Malformed)
            }
        }
    }

    async fn decide(&self, path: &str, authorization: Option<&str>, now: i64) -> AuthOutcome {
        if self.public_paths.is_public(path) {
            return AuthOutcome::Unauthenticated(Unauthenticated::PublicPath);
        }

        let Some(token) = bearer_token(authorization) else {
            return AuthOutcome::Unauthenticated(Unauthenticated::NoCredential);
        };

        // Revocation strictly before any cryptographic work.
        match self.revocations.is_revoked(token).await {
            Ok(false) => {}
            Ok(true) => return AuthOutcome::rejected(AuthError::Revoked),
            Err(err) => {
                warn!(error = %err, "revocation lookup failed");
                return AuthOutcome::rejected(AuthError::Malformed);
            }
        }

        let claims = match self.tokens.verify(token, now) {
            Ok(claims) => claims,
            Err(err) => return AuthOutcome::rejected(err),
        };

        let principal = match self.principals.load_principal(&claims.sub).await {
            Ok(p) => p,
            Err(PrincipalError::NotFound) => {
                return AuthOutcome::rejected(AuthError::PrincipalNotFound);
            }
            Err(err) => {
                warn!(error = %err, "principal lookup failed");
                return AuthOutcome::rejected(AuthError::Malformed);
            }
        };

        if principal.username != claims.sub {
            return AuthOutcome::rejected(AuthError::SubjectMismatch);
        }

        AuthOutcome::Authenticated(Authenticated {
            principal,
            expires_at: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::revocation::{InMemoryRevocationStore, RevocationError};
    use crate::services::cache::CacheError;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    const ISSUED_AT: i64 = 1_700_000_000;

    #[derive(Default)]
    struct Directory {
        users: HashMap<String, Principal>,
        broken: bool,
    }

    impl Directory {
        fn with(mut self, subject: &str, principal: Principal) -> Self {
            self.users.insert(subject.to_string(), principal);
            self
        }
    }

    #[async_trait]
    impl PrincipalLookup for Directory {
        async fn load_principal(&self, subject: &str) -> Result<Principal, PrincipalError> {
            if self.broken {
                return Err(PrincipalError::Backend("db down".into()));
            }
            self.users
                .get(subject)
                .cloned()
                .ok_or(PrincipalError::NotFound)
        }
    }

    struct PanickingDirectory;

    #[async_trait]
    impl PrincipalLookup for PanickingDirectory {
        async fn load_principal(&self, _subject: &str) -> Result<Principal, PrincipalError> {
            panic!("directory exploded");
        }
    }

    struct PanickingRevocations;

    #[async_trait]
    impl RevocationOracle for PanickingRevocations {
        async fn is_revoked(&self, _token: &str) -> Result<bool, RevocationError> {
            panic!("revocation backend exploded");
        }

        async fn revoke(&self, _token: &str, _expires_at: i64) -> Result<(), RevocationError> {
            Ok(())
        }
    }

    struct BrokenRevocations;

    #[async_trait]
    impl RevocationOracle for BrokenRevocations {
        async fn is_revoked(&self, _token: &str) -> Result<bool, RevocationError> {
            Err(CacheError::BackendConnection("down".into()).into())
        }

        async fn revoke(&self, _token: &str, _expires_at: i64) -> Result<(), RevocationError> {
            Err(CacheError::BackendConnection("down".into()).into())
        }
    }

    fn user(name: &str) -> Principal {
        Principal::new(name, vec!["ROLE_STAFF".into()])
    }

    fn tokens() -> AuthService {
        AuthService::new("s3cr3t", 3_600_000)
    }

    fn issue(subject: &str) -> String {
        tokens()
            .issue_token_at(subject, Utc.timestamp_opt(ISSUED_AT, 0).unwrap())
            .unwrap()
    }

    fn authenticator(
        revocations: Arc<dyn RevocationOracle>,
        directory: Directory,
    ) -> Authenticator {
        Authenticator::new(
            tokens(),
            revocations,
            Arc::new(directory),
            PublicPaths::default(),
        )
    }

    fn default_authenticator() -> (Authenticator, InMemoryRevocationStore) {
        let store = InMemoryRevocationStore::new();
        let auth = authenticator(
            Arc::new(store.clone()),
            Directory::default().with("a@b.com", user("a@b.com")),
        );
        (auth, store)
    }

    fn header(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn bearer_token_extraction() {
        assert_eq!(bearer_token(None), None);
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("bearer abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
    }

    #[tokio::test]
    async fn valid_token_authenticates() {
        let (auth, _) = default_authenticator();
        let h = header(&issue("a@b.com"));

        let outcome = auth.authenticate("/api/v1/auth/me", Some(&h), ISSUED_AT + 1).await;
        assert_eq!(
            outcome,
            AuthOutcome::Authenticated(Authenticated {
                principal: user("a@b.com"),
                expires_at: ISSUED_AT + 3600,
            })
        );
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let (auth, _) = default_authenticator();
        let h = header(&issue("a@b.com"));

        let outcome = auth.authenticate("/api/v1/auth/me", Some(&h), ISSUED_AT + 3601).await;
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::Expired));
    }

    #[tokio::test]
    async fn public_path_skips_everything() {
        let auth = authenticator(Arc::new(BrokenRevocations), Directory::default());

        let outcome = auth
            .authenticate("/api/v1/auth/login", Some("Bearer garbage"), ISSUED_AT)
            .await;
        assert_eq!(outcome, AuthOutcome::Unauthenticated(Unauthenticated::PublicPath));
    }

    #[tokio::test]
    async fn missing_or_foreign_credentials_pass_through() {
        let (auth, _) = default_authenticator();

        for h in [None, Some("Basic Zm9vOmJhcg=="), Some("Bearer ")] {
            let outcome = auth.authenticate("/api/v1/auth/me", h, ISSUED_AT).await;
            assert_eq!(
                outcome,
                AuthOutcome::Unauthenticated(Unauthenticated::NoCredential)
            );
        }
    }

    #[tokio::test]
    async fn revoked_valid_token_never_authenticates() {
        let (auth, store) = default_authenticator();
        let token = issue("a@b.com");
        store.revoke(&token, ISSUED_AT + 3600).await.unwrap();

        let outcome = auth
            .authenticate("/api/v1/auth/me", Some(&header(&token)), ISSUED_AT + 1)
            .await;
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::Revoked));
    }

    #[tokio::test]
    async fn revoked_garbage_is_reported_as_revoked_before_decoding() {
        let (auth, store) = default_authenticator();
        store.revoke("not-a-token", ISSUED_AT).await.unwrap();

        let outcome = auth
            .authenticate("/x", Some("Bearer not-a-token"), ISSUED_AT)
            .await;
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::Revoked));
    }

    #[tokio::test]
    async fn revocation_backend_failure_fails_closed() {
        let auth = authenticator(
            Arc::new(BrokenRevocations),
            Directory::default().with("a@b.com", user("a@b.com")),
        );
        let h = header(&issue("a@b.com"));

        let outcome = auth.authenticate("/x", Some(&h), ISSUED_AT + 1).await;
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::Malformed));
    }

    #[tokio::test]
    async fn malformed_and_forged_tokens() {
        let (auth, _) = default_authenticator();

        let outcome = auth.authenticate("/x", Some("Bearer a.b"), ISSUED_AT).await;
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::Malformed));

        let forged = AuthService::new("other", 3_600_000)
            .issue_token_at("a@b.com", Utc.timestamp_opt(ISSUED_AT, 0).unwrap())
            .unwrap();
        let outcome = auth
            .authenticate("/x", Some(&header(&forged)), ISSUED_AT + 1)
            .await;
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::SignatureInvalid));
    }

    #[tokio::test]
    async fn unknown_subject_is_principal_not_found() {
        let (auth, _) = default_authenticator();
        let h = header(&issue("ghost@b.com"));

        let outcome = auth.authenticate("/x", Some(&h), ISSUED_AT + 1).await;
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::PrincipalNotFound));
    }

    #[tokio::test]
    async fn principal_with_other_name_is_subject_mismatch() {
        let auth = authenticator(
            Arc::new(InMemoryRevocationStore::new()),
            Directory::default().with("a@b.com", user("A@B.COM")),
        );
        let h = header(&issue("a@b.com"));

        let outcome = auth.authenticate("/x", Some(&h), ISSUED_AT + 1).await;
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::SubjectMismatch));
    }

    #[tokio::test]
    async fn principal_backend_failure_is_unauthenticated() {
        let auth = authenticator(
            Arc::new(InMemoryRevocationStore::new()),
            Directory {
                broken: true,
                ..Default::default()
            },
        );
        let h = header(&issue("a@b.com"));

        let outcome = auth.authenticate("/x", Some(&h), ISSUED_AT + 1).await;
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::Malformed));
    }

    #[tokio::test]
    async fn authentication_is_idempotent() {
        let (auth, _) = default_authenticator();
        let h = header(&issue("a@b.com"));

        let first = auth.authenticate("/x", Some(&h), ISSUED_AT + 10).await;
        let second = auth.authenticate("/x", Some(&h), ISSUED_AT + 10).await;
        assert_eq!(first, second);
        assert!(matches!(first, AuthOutcome::Authenticated(_)));
    }

    #[tokio::test]
    async fn panicking_principal_lookup_is_malformed() {
        let auth = Arc::new(Authenticator::new(
            tokens(),
            Arc::new(InMemoryRevocationStore::new()),
            Arc::new(PanickingDirectory),
            PublicPaths::default(),
        ));
        let h = header(&issue("a@b.com"));

        // run on its own task: a leaked panic would surface as a JoinError
        let task = tokio::spawn({
            let auth = auth.clone();
            async move { auth.authenticate("/x", Some(&h), ISSUED_AT + 1).await }
        });

        let outcome = task.await.expect("panic escaped authenticate");
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::Malformed));
    }

    #[tokio::test]
    async fn panicking_revocation_oracle_is_malformed() {
        let auth = authenticator(
            Arc::new(PanickingRevocations),
            Directory::default().with("a@b.com", user("a@b.com")),
        );
        let h = header(&issue("a@b.com"));

        let outcome = auth.authenticate("/x", Some(&h), ISSUED_AT + 1).await;
        assert_eq!(outcome, AuthOutcome::rejected(AuthError::Malformed));

        // public paths never reach the collaborators
        let outcome = auth.authenticate("/health", Some(&h), ISSUED_AT + 1).await;
        assert_eq!(outcome, AuthOutcome::Unauthenticated(Unauthenticated::PublicPath));
    }
}
