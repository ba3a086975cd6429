// ============================
// crates/taskvault-lib/src/lib.rs
// ============================
//! Core library for the taskvault backend: account registration and
//! authentication, bearer-token and cookie-session identity resolution,
//! and owner-scoped task CRUD over a pooled relational store.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod store;
pub mod validation;

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::auth::{BearerIdentity, IdentityResolver, SessionIdentity, SessionVerifier};
use crate::config::Settings;
use crate::middleware::rate_limit::RateLimiter;
use crate::store::{TaskStore, UserDirectory};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Immutable settings, constructed once at startup
    pub settings: Arc<Settings>,
    /// Shared connection pool
    pub pool: SqlitePool,
    /// Account directory
    pub users: UserDirectory,
    /// Task store
    pub tasks: TaskStore,
    /// Bearer-token identity, used by the account route group
    pub bearer: Arc<dyn IdentityResolver>,
    /// Cookie-session identity, used by the task route group
    pub session_identity: Arc<dyn IdentityResolver>,
    /// Per-route-class rate limiter
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Create a new application state over a connected pool.
    pub fn new(pool: SqlitePool, settings: Settings) -> Self {
        let settings = Arc::new(settings);
        let users = UserDirectory::new(pool.clone());
        let tasks = TaskStore::new(pool.clone());
        let bearer = Arc::new(BearerIdentity::new(settings.clone()));
        let session_identity = Arc::new(SessionIdentity::new(SessionVerifier::new(
            pool.clone(),
            &settings,
        )));

        Self {
            settings,
            pool,
            users,
            tasks,
            bearer,
            session_identity,
            rate_limiter: Arc::new(RateLimiter::default()),
        }
    }
}
