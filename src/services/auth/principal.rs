use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use tracing::error;

use crate::repos::user_repo::{self, LoginIdentityRow};

/// Resolved identity of a token subject. Not owned or cached here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub username: String,
    pub authorities: Vec<String>,
}

impl Principal {
    pub fn new(username: impl Into<String>, authorities: Vec<String>) -> Self {
        Self {
            username: username.into(),
            authorities,
        }
    }

    /// Spring-style role authority, e.g. `admin` -> `ROLE_ADMIN`.
    pub fn role_authority(role: &str) -> String {
        format!("ROLE_{}", role.trim().to_ascii_uppercase())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PrincipalError {
    #[error("principal not found")]
    NotFound,
    #[error("principal backend error: {0}")]
    Backend(String),
}

/// Subject -> principal resolution. May perform I/O.
#[async_trait]
pub trait PrincipalLookup: Send + Sync {
    async fn load_principal(&self, subject: &str) -> Result<Principal, PrincipalError>;
}

/// Fallback account used only when no database row exists for its subject.
#[derive(Debug, Clone)]
pub struct MasterAccount {
    pub username: String,
    pub role: String,
}

/// PostgreSQL-backed principal lookup.
///
/// - The subject must equal the stored login email exactly.
/// - The configured master account is consulted only after a DB miss.
#[derive(Clone, Debug)]
pub struct UserDirectory {
    db: PgPool,
    master: Option<MasterAccount>,
}

impl UserDirectory {
    pub fn new(db: PgPool, master: Option<MasterAccount>) -> Self {
        Self { db, master }
    }

    /// Map a lookup result to an outcome.
    ///
    /// A row whose login email differs from the subject is `NotFound`, and the
    /// master account is only considered when there is no row at all.
    fn resolve(
        &self,
        subject: &str,
        row: Option<LoginIdentityRow>,
    ) -> Result<Principal, PrincipalError> {
        match row {
            Some(row) if row.email == subject => Ok(Principal::new(
                row.email,
                vec![Principal::role_authority(&row.role_name)],
            )),
            Some(_) => Err(PrincipalError::NotFound),
            None => self.master_principal(subject).ok_or(PrincipalError::NotFound),
        }
    }

    fn master_principal(&self, subject: &str) -> Option<Principal> {
        self.master
            .as_ref()
            .filter(|m| m.username == subject)
            .map(|m| Principal::new(&m.username, vec![Principal::role_authority(&m.role)]))
    }
}

#[async_trait]
impl PrincipalLookup for UserDirectory {
    async fn load_principal(&self, subject: &str) -> Result<Principal, PrincipalError> {
        let row = user_repo::find_by_user_name(&self.db, subject)
            .await
            .map_err(|e| {
                error!(error = %e, "principal lookup failed");
                PrincipalError::Backend(e.to_string())
            })?;

        self.resolve(subject, row)
    }
}
