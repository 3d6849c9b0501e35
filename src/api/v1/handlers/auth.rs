/*
 * Responsibility
 * - GET  /auth/me      current principal
 * - POST /auth/logout  revoke the presented token until it expires
 */
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};

use crate::api::v1::dto::auth::{LogoutResponse, MeResponse};
use crate::api::v1::extractors::AuthCtxExtractor;
use crate::error::AppError;
use crate::services::auth::authenticator::bearer_token;
use crate::state::AppState;

pub async fn me(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<MeResponse> {
    Json(MeResponse::from(ctx))
}

pub async fn logout(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    headers: HeaderMap,
) -> Result<Json<LogoutResponse>, AppError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = bearer_token(authorization).ok_or_else(|| {
        AppError::bad_request("MISSING_TOKEN", "no bearer token on request")
    })?;

    state
        .auth
        .revocations()
        .revoke(token, ctx.expires_at)
        .await?;

    tracing::info!(user = %ctx.principal.username, "token revoked");

    Ok(Json(LogoutResponse {
        revoked: true,
        message: "logged out",
    }))
}
