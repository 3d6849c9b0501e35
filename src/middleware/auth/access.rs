//! Bearer authentication: run the authenticator once per request and, on
//! success, put `AuthCtx` into the request extensions.
//!
//! The middleware never rejects. Handlers that need an identity take
//! `AuthCtxExtractor`, which answers 401 when no context is present.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};
use chrono::Utc;

use crate::api::v1::extractors::AuthCtx;
use crate::services::auth::{AuthOutcome, Unauthenticated};
use crate::state::AppState;

pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8: from_fn cannot take a State extractor, pass it explicitly
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // already authenticated further out (or on a previous pass)
    if req.extensions().get::<AuthCtx>().is_some() {
        return next.run(req).await;
    }

    // owned copies: the request body is not Sync, so no borrow of `req` may
    // live across the await below
    let path = req.uri().path().to_owned();
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let outcome = state
        .auth
        .authenticate(&path, authorization.as_deref(), Utc::now().timestamp())
        .await;

    match outcome {
        AuthOutcome::Authenticated(authenticated) => {
            tracing::debug!(
                user = %authenticated.principal.username,
                "request authenticated"
            );
            req.extensions_mut().insert(AuthCtx::from(authenticated));
        }
        AuthOutcome::Unauthenticated(Unauthenticated::Rejected(err)) => {
            tracing::debug!(
                kind = err.kind(),
                path = %path,
                "bearer token rejected"
            );
        }
        AuthOutcome::Unauthenticated(_) => {}
    }

    next.run(req).await
}
