/*
 * Responsibility
 * - load Config -> build dependencies -> assemble Router
 * - apply middleware (HTTP layers, bearer authentication)
 * - start with axum::serve()
 */
use std::{panic, process, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::middleware::{self, http::HttpSettings};
use crate::services::auth::{
    AuthService, Authenticator, InMemoryRevocationStore, PublicPaths, RevocationOracle,
    UserDirectory, ValkeyRevocationStore,
};
use crate::state::AppState;

const REVOCATION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,bearer_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;

    // off by default: a panic inside request handling must not take the process down
    init_panic_hook(config.abort_on_panic);

    if config.secret_is_weak() {
        tracing::warn!(
            secret_len = config.token.secret.len(),
            "JWT_SECRET is shorter than 32 bytes; use a longer random secret"
        );
    }

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(
        state,
        &HttpSettings {
            timeout: config.http_timeout,
            body_limit_bytes: config.http_body_limit_bytes,
        },
    );

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let db = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let principals = Arc::new(UserDirectory::new(db, config.master_account.clone()));
    let revocations = build_revocations(config).await?;

    let tokens = AuthService::new(config.token.secret.as_bytes(), config.token.validity_ms);
    let auth = Authenticator::new(tokens, revocations, principals, PublicPaths::default());

    Ok(AppState::new(Arc::new(auth)))
}

async fn build_revocations(config: &Config) -> Result<Arc<dyn RevocationOracle>> {
    if let Some(url) = &config.redis_url {
        let store = ValkeyRevocationStore::new(url)
            .await
            .context("failed to connect to revocation backend")?;
        tracing::info!("token revocation backed by valkey");
        return Ok(Arc::new(store));
    }

    tracing::info!("token revocation kept in process memory");
    let store = InMemoryRevocationStore::new();
    spawn_revocation_purge(store.clone());
    Ok(Arc::new(store))
}

fn spawn_revocation_purge(store: InMemoryRevocationStore) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(REVOCATION_PURGE_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            let purged = store.purge_expired(chrono::Utc::now().timestamp());
            if purged > 0 {
                tracing::debug!(purged, remaining = store.revoked_count(), "purged revocations");
            }
        }
    });
}

/// Full application router: routes, bearer authentication and HTTP layers.
pub fn build_router(state: AppState, http: &HttpSettings) -> Router {
    let router = Router::new()
        .route("/health", get(api::v1::handlers::health::health))
        .nest("/api/v1", api::v1::routes());

    // authentication sees the full request path, so it wraps the outer router
    let router = middleware::auth::access::apply(router, state.clone());

    middleware::http::apply(router.with_state(state), http)
}
