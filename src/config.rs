/*
 * Responsibility
 * - load settings from the environment (.env honoured via dotenvy)
 * - validate them; a missing signing secret must stop startup
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::services::auth::MasterAccount;

/// Role of the fallback master account when `MASTER_ROLE` is unset.
pub const DEFAULT_MASTER_ROLE: &str = "COORDINADOR";

/// Below this length the HMAC secret is accepted but logged as weak.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Token signing settings. The secret is immutable for the process lifetime.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub validity_ms: u64,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret_len", &self.secret.len())
            .field("validity_ms", &self.validity_ms)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub database_url: String,
    pub redis_url: Option<String>,

    pub token: TokenConfig,
    pub master_account: Option<MasterAccount>,

    pub http_timeout: Duration,
    pub http_body_limit_bytes: usize,

    /// Abort the process from the panic hook (off unless `ABORT_ON_PANIC` is set).
    pub abort_on_panic: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = get("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = get("APP_ENV")
            .map(|v| AppEnv::parse(&v))
            .unwrap_or(AppEnv::Development);

        let database_url = non_empty("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let redis_url = non_empty("REDIS_URL");

        // raw value: whitespace is part of the key material
        let secret = get("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let validity_ms = match get("JWT_EXPIRATION_MS") {
            None => 3_600_000,
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigError::Invalid("JWT_EXPIRATION_MS"))?,
        };

        let master_account = non_empty("MASTER_USERNAME").map(|username| MasterAccount {
            username,
            role: non_empty("MASTER_ROLE").unwrap_or_else(|| DEFAULT_MASTER_ROLE.to_string()),
        });

        let http_timeout = Duration::from_secs(
            get("HTTP_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        );

        let http_body_limit_bytes = get("HTTP_BODY_LIMIT_BYTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1024 * 1024);

        let abort_on_panic = non_empty("ABORT_ON_PANIC")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            addr,
            app_env,
            database_url,
            redis_url,
            token: TokenConfig {
                secret,
                validity_ms,
            },
            master_account,
            http_timeout,
            http_body_limit_bytes,
            abort_on_panic,
        })
    }

    pub fn secret_is_weak(&self) -> bool {
        self.token.secret.len() < RECOMMENDED_SECRET_LEN
    }
}
