/*
 * Responsibility
 * - URL structure of v1
 * - authentication is applied by the outer router, not here
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::auth::{logout, me};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/logout", post(logout))
}
