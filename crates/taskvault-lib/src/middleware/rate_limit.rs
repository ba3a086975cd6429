// ============================
// crates/taskvault-lib/src/middleware/rate_limit.rs
// ============================
//! Per-route-class rate limiting.
//!
//! Fixed one-minute windows per client address and route class, composed
//! around handlers as explicit middleware stages. The policy is configured
//! once in [`crate::config::RateLimitSettings`]; route groups attach the
//! stage that matches their class.
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::AppState;

/// Route classes with independent limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateClass {
    Register,
    Login,
    AccountRead,
    Read,
    Write,
}

impl RateClass {
    fn as_str(self) -> &'static str {
        match self {
            RateClass::Register => "register",
            RateClass::Login => "login",
            RateClass::AccountRead => "account_read",
            RateClass::Read => "read",
            RateClass::Write => "write",
        }
    }
}

/// Rate limit entry for one (client, class) pair
#[derive(Debug)]
struct RateLimitEntry {
    requests: u32,
    window_start: Instant,
}

/// Fixed-window request counter keyed by client address and route class.
pub struct RateLimiter {
    buckets: DashMap<(String, RateClass), RateLimitEntry>,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            buckets: DashMap::new(),
            window,
        }
    }

    /// Count a request and fail once the class limit for this client is
    /// exhausted within the current window.
    pub fn check(
        &self,
        client: &str,
        class: RateClass,
        max_requests: u32,
    ) -> Result<(), AppError> {
        let mut entry = self
            .buckets
            .entry((client.to_string(), class))
            .or_insert_with(|| RateLimitEntry {
                requests: 0,
                window_start: Instant::now(),
            });

        if entry.window_start.elapsed() > self.window {
            entry.requests = 0;
            entry.window_start = Instant::now();
        }

        if entry.requests >= max_requests {
            tracing::warn!(
                client = client,
                class = class.as_str(),
                "rate limit exceeded"
            );
            return Err(AppError::RateLimited);
        }

        entry.requests += 1;
        Ok(())
    }
}

/// Client address for limiting purposes, from the reverse proxy headers.
fn client_ip(request: &Request) -> &str {
    request
        .headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            request
                .headers()
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.split(',').next())
        })
        .unwrap_or("unknown")
}

fn enforce(state: &AppState, class: RateClass, request: &Request) -> Result<(), AppError> {
    let limits = &state.settings.rate_limit;
    let max_requests = match class {
        RateClass::Register => limits.register_per_min,
        RateClass::Login => limits.login_per_min,
        RateClass::AccountRead => limits.account_read_per_min,
        RateClass::Read => limits.task_read_per_min,
        RateClass::Write => limits.task_write_per_min,
    };
    state
        .rate_limiter
        .check(client_ip(request), class, max_requests)
}

/// Registration limit stage (5/min by default).
pub async fn limit_register(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, RateClass::Register, &request)?;
    Ok(next.run(request).await)
}

/// Login limit stage (10/min by default).
pub async fn limit_login(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, RateClass::Login, &request)?;
    Ok(next.run(request).await)
}

/// Account read limit stage (60/min by default). Carries its own class so
/// heavy task reading cannot starve the account routes.
pub async fn limit_account_reads(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(&state, RateClass::AccountRead, &request)?;
    Ok(next.run(request).await)
}

/// Task route limit stage: reads and writes carry separate budgets
/// (60/min and 30/min by default), picked by request method.
pub async fn limit_tasks(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let class = if request.method() == axum::http::Method::GET {
        RateClass::Read
    } else {
        RateClass::Write
    };
    enforce(&state, class, &request)?;
    Ok(next.run(request).await)
}
