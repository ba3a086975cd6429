// ============================
// crates/taskvault-lib/src/auth/session.rs
// ============================
//! Cookie-session verification.
//!
//! Sessions are issued by an external system; this module only reads them.
//! The cookie value has the form `sessionId.signature`, URL-encoded. The
//! identifier portion is looked up in the session store and time-checked.
//! When a session secret is configured the signature segment is verified as
//! `base64url(HMAC-SHA256(session_id))` before any lookup; without one the
//! legacy lookup-only behavior applies.
use axum::http::{header::COOKIE, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::percent_decode_str;
use sha2::Sha256;
use sqlx::SqlitePool;

use crate::config::Settings;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Resolves an opaque session cookie to a user identity.
///
/// Identities from this path are string-typed; no numeric structure is
/// assumed.
#[derive(Clone)]
pub struct SessionVerifier {
    pool: SqlitePool,
    cookie_name: String,
    secret: Option<String>,
}

impl SessionVerifier {
    pub fn new(pool: SqlitePool, settings: &Settings) -> Self {
        Self {
            pool,
            cookie_name: settings.session_cookie.clone(),
            secret: settings.session_secret.clone(),
        }
    }

    /// Verify the session cookie in `headers` and return the owning user id.
    pub async fn verify(&self, headers: &HeaderMap) -> Result<String, AppError> {
        let raw = self.extract_cookie(headers).ok_or_else(|| {
            tracing::warn!("session rejected: no cookie present");
            AppError::Unauthorized("Not authenticated".to_string())
        })?;

        let decoded = percent_decode_str(&raw).decode_utf8_lossy().into_owned();

        // Cookie format is sessionId.signature, identifier before the first dot.
        let (session_id, signature) = match decoded.split_once('.') {
            Some((id, sig)) => (id, Some(sig)),
            None => (decoded.as_str(), None),
        };

        if let Some(secret) = &self.secret {
            let ok = signature
                .map(|sig| signature_matches(secret, session_id, sig))
                .unwrap_or(false);
            if !ok {
                tracing::warn!("session rejected: bad signature");
                return Err(AppError::Unauthorized("Invalid session".to_string()));
            }
        }

        self.lookup(session_id).await
    }

    /// Look up a session id in the store and enforce expiry.
    async fn lookup(&self, session_id: &str) -> Result<String, AppError> {
        let row: Option<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT user_id, expires_at FROM session WHERE id = ?")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;

        let (user_id, expires_at) = row.ok_or_else(|| {
            tracing::warn!("session rejected: no matching row");
            AppError::Unauthorized("Invalid session".to_string())
        })?;

        if expires_at <= Utc::now() {
            tracing::warn!(user_id = %user_id, "session rejected: expired");
            return Err(AppError::Unauthorized("Session expired".to_string()));
        }

        Ok(user_id)
    }

    /// Find the configured cookie among the request's `Cookie` headers.
    fn extract_cookie(&self, headers: &HeaderMap) -> Option<String> {
        for value in headers.get_all(COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            for pair in value.split(';') {
                let pair = pair.trim();
                if let Some((name, cookie_value)) = pair.split_once('=') {
                    if name == self.cookie_name {
                        return Some(cookie_value.to_string());
                    }
                }
            }
        }
        None
    }
}

fn signature_matches(secret: &str, session_id: &str, signature: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(session_id.as_bytes());
    match URL_SAFE_NO_PAD.decode(signature) {
        Ok(raw) => mac.verify_slice(&raw).is_ok(),
        Err(_) => false,
    }
}

/// Produce the signature segment for a session id. The counterpart of the
/// verification above, used by session issuers and by tests crafting
/// cookies.
pub fn sign_session_id(secret: &str, session_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(session_id.as_bytes());
    URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool_with_sessions() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE session (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool
    }

    async fn insert_session(pool: &SqlitePool, id: &str, user_id: &str, expires_at: DateTime<Utc>) {
        sqlx::query("INSERT INTO session (id, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(id)
            .bind(user_id)
            .bind(expires_at)
            .execute(pool)
            .await
            .unwrap();
    }

    fn headers_with_cookie(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, format!("{name}={value}").parse().unwrap());
        headers
    }

    fn verifier(pool: SqlitePool, secret: Option<&str>) -> SessionVerifier {
        let settings = Settings {
            jwt_secret: "irrelevant".to_string(),
            session_secret: secret.map(str::to_string),
            ..Settings::default()
        };
        SessionVerifier::new(pool, &settings)
    }

    #[tokio::test]
    async fn valid_session_resolves_user_id() {
        let pool = pool_with_sessions().await;
        insert_session(&pool, "sess-1", "user-9", Utc::now() + Duration::hours(1)).await;

        let verifier = verifier(pool, None);
        let headers = headers_with_cookie("session_token", "sess-1.whatever-signature");
        assert_eq!(verifier.verify(&headers).await.unwrap(), "user-9");
    }

    #[tokio::test]
    async fn missing_cookie_is_unauthorized() {
        let pool = pool_with_sessions().await;
        let verifier = verifier(pool, None);
        assert!(matches!(
            verifier.verify(&HeaderMap::new()).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn unknown_session_is_unauthorized() {
        let pool = pool_with_sessions().await;
        let verifier = verifier(pool, None);
        let headers = headers_with_cookie("session_token", "no-such-session.sig");
        assert!(verifier.verify(&headers).await.is_err());
    }

    #[tokio::test]
    async fn expired_session_is_unauthorized_even_if_row_exists() {
        let pool = pool_with_sessions().await;
        insert_session(&pool, "sess-old", "user-9", Utc::now() - Duration::minutes(1)).await;

        let verifier = verifier(pool, None);
        let headers = headers_with_cookie("session_token", "sess-old.sig");
        assert!(matches!(
            verifier.verify(&headers).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn url_encoded_cookie_value_is_decoded() {
        let pool = pool_with_sessions().await;
        insert_session(&pool, "sess-1", "user-9", Utc::now() + Duration::hours(1)).await;

        let verifier = verifier(pool, None);
        // '.' encoded as %2E
        let headers = headers_with_cookie("session_token", "sess-1%2Esignature");
        assert_eq!(verifier.verify(&headers).await.unwrap(), "user-9");
    }

    #[tokio::test]
    async fn signature_verified_when_secret_configured() {
        let pool = pool_with_sessions().await;
        insert_session(&pool, "sess-1", "user-9", Utc::now() + Duration::hours(1)).await;

        let verifier = verifier(pool, Some("cookie-secret"));

        // Correct signature passes.
        let sig = sign_session_id("cookie-secret", "sess-1");
        let headers = headers_with_cookie("session_token", &format!("sess-1.{sig}"));
        assert_eq!(verifier.verify(&headers).await.unwrap(), "user-9");

        // Forged signature fails before any lookup.
        let headers = headers_with_cookie("session_token", "sess-1.Zm9yZ2Vk");
        assert!(verifier.verify(&headers).await.is_err());

        // Missing signature segment fails too.
        let headers = headers_with_cookie("session_token", "sess-1");
        assert!(verifier.verify(&headers).await.is_err());
    }

    #[tokio::test]
    async fn string_user_ids_pass_through_untouched() {
        let pool = pool_with_sessions().await;
        insert_session(
            &pool,
            "sess-1",
            "k7Ƀ-opaque-id-0042",
            Utc::now() + Duration::hours(1),
        )
        .await;

        let verifier = verifier(pool, None);
        let headers = headers_with_cookie("session_token", "sess-1.sig");
        assert_eq!(
            verifier.verify(&headers).await.unwrap(),
            "k7Ƀ-opaque-id-0042"
        );
    }
}
