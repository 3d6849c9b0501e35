/*
 * Responsibility
 * - the "authenticated context" type handlers see
 * - the middleware verifies and stores it in request extensions; handlers
 *   only ever receive this type
 */
use crate::services::auth::{Authenticated, Principal};

#[derive(Debug, Clone)]
pub struct AuthCtx {
    pub principal: Principal,
    /// Expiry of the presented token (unix seconds).
    pub expires_at: i64,
}

impl AuthCtx {
    pub fn new(principal: Principal, expires_at: i64) -> Self {
        Self {
            principal,
            expires_at,
        }
    }
}

impl From<Authenticated> for AuthCtx {
    fn from(a: Authenticated) -> Self {
        Self::new(a.principal, a.expires_at)
    }
}
