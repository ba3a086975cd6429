// ============================
// crates/taskvault-lib/src/auth/identity.rs
// ============================
//! Identity resolution strategies.
//!
//! Two mechanisms coexist: signed bearer tokens on the account routes and
//! externally issued session cookies on the task routes. They are kept as
//! independent, composable strategies behind one trait; route groups pick
//! their resolver explicitly.
use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::sync::Arc;

use crate::config::Settings;
use crate::error::AppError;

use super::session::SessionVerifier;
use super::token;

/// Resolves the caller's identity from request headers.
///
/// Resolved identities are opaque strings in both variants.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<String, AppError>;
}

/// Bearer-token identity: `Authorization: Bearer <jwt>`.
pub struct BearerIdentity {
    settings: Arc<Settings>,
}

impl BearerIdentity {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl IdentityResolver for BearerIdentity {
    async fn resolve(&self, headers: &HeaderMap) -> Result<String, AppError> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

        token::verify_token(token, &self.settings)
    }
}

/// Cookie-session identity: opaque session cookie checked against the
/// session store.
pub struct SessionIdentity {
    verifier: SessionVerifier,
}

impl SessionIdentity {
    pub fn new(verifier: SessionVerifier) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl IdentityResolver for SessionIdentity {
    async fn resolve(&self, headers: &HeaderMap) -> Result<String, AppError> {
        self.verifier.verify(headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Arc<Settings> {
        Arc::new(Settings {
            jwt_secret: "unit-test-secret".to_string(),
            ..Settings::default()
        })
    }

    #[tokio::test]
    async fn bearer_resolves_token_subject() {
        let settings = settings();
        let token = token::issue_access_token("user-7", &settings).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());

        let resolver = BearerIdentity::new(settings);
        assert_eq!(resolver.resolve(&headers).await.unwrap(), "user-7");
    }

    #[tokio::test]
    async fn bearer_rejects_missing_header() {
        let resolver = BearerIdentity::new(settings());
        assert!(matches!(
            resolver.resolve(&HeaderMap::new()).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn bearer_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());

        let resolver = BearerIdentity::new(settings());
        assert!(resolver.resolve(&headers).await.is_err());
    }
}
