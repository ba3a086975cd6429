// ============================
// crates/taskvault-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! All runtime knobs live in one immutable [`Settings`] value constructed at
//! process start and injected into components; request-handling code never
//! reads the environment directly.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::net::SocketAddr;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Database connection URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Secret used to sign and verify JWTs
    pub jwt_secret: String,
    /// TTL for generic signed tokens, in seconds
    pub token_ttl_secs: u64,
    /// TTL for login-issued access tokens, in seconds
    pub access_token_ttl_secs: u64,
    /// TTL for refresh tokens, in seconds
    pub refresh_token_ttl_secs: u64,
    /// Name of the session cookie consulted by the cookie-session flow
    pub session_cookie: String,
    /// Optional secret for verifying the session cookie's signature
    /// segment. When unset, only the store lookup is performed (the
    /// legacy behavior of the externally issued cookies).
    pub session_secret: Option<String>,
    /// Connection pool sizing and timeouts
    pub pool: PoolSettings,
    /// Per-route-class rate limits
    pub rate_limit: RateLimitSettings,
}

/// Connection pool settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum number of pooled connections (base pool plus overflow)
    pub max_connections: u32,
    /// How long to wait for a free connection before failing
    pub acquire_timeout_secs: u64,
    /// Recycle connections idle for longer than this
    pub idle_timeout_secs: u64,
    /// Liveness-check connections before handing them out
    pub test_before_acquire: bool,
}

/// Fixed-window rate limits, requests per minute per client address
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub register_per_min: u32,
    pub login_per_min: u32,
    pub account_read_per_min: u32,
    pub task_read_per_min: u32,
    pub task_write_per_min: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().unwrap(),
            database_url: "sqlite://taskvault.db?mode=rwc".to_string(),
            log_level: "info".to_string(),
            jwt_secret: String::new(),
            token_ttl_secs: 15 * 60,
            access_token_ttl_secs: 30 * 60,
            refresh_token_ttl_secs: 7 * 24 * 60 * 60,
            session_cookie: "session_token".to_string(),
            session_secret: None,
            pool: PoolSettings::default(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 30,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 3600,
            test_before_acquire: true,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            register_per_min: 5,
            login_per_min: 10,
            account_read_per_min: 60,
            task_read_per_min: 60,
            task_write_per_min: 30,
        }
    }
}

impl Settings {
    /// Load settings from `taskvault.toml` merged with `TASKVAULT_`-prefixed
    /// environment variables (environment wins).
    pub fn load() -> Result<Self> {
        Self::load_from("taskvault.toml")
    }

    /// Load settings from an explicit config file path.
    pub fn load_from(path: &str) -> Result<Self> {
        let settings: Settings = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("TASKVAULT_").split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.is_empty() {
            anyhow::bail!("jwt_secret must be set");
        }
        if self.token_ttl_secs == 0 || self.access_token_ttl_secs == 0 {
            anyhow::bail!("token TTLs must be positive");
        }
        if !["trace", "debug", "info", "warn", "error"].contains(&self.log_level.as_str()) {
            anyhow::bail!("invalid log level: {}", self.log_level);
        }
        if self.pool.max_connections == 0 {
            anyhow::bail!("pool.max_connections must be positive");
        }
        if self.pool.acquire_timeout_secs == 0 {
            anyhow::bail!("pool.acquire_timeout_secs must be positive");
        }
        let rl = &self.rate_limit;
        if rl.register_per_min == 0
            || rl.login_per_min == 0
            || rl.account_read_per_min == 0
            || rl.task_read_per_min == 0
            || rl.task_write_per_min == 0
        {
            anyhow::bail!("rate limits must be positive");
        }
        Ok(())
    }
}
