/*
 * Responsibility
 * - response DTOs for the /auth routes
 */
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::v1::extractors::AuthCtx;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub authorities: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<AuthCtx> for MeResponse {
    fn from(ctx: AuthCtx) -> Self {
        Self {
            username: ctx.principal.username,
            authorities: ctx.principal.authorities,
            expires_at: DateTime::from_timestamp(ctx.expires_at, 0).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
    pub message: &'static str,
}
