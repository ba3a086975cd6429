// ============================
// crates/taskvault-lib/src/auth/token.rs
// ============================
//! Signed bearer token issuance and verification.
//!
//! Tokens are stateless HS256 JWTs carrying a subject and absolute expiry;
//! validity is fully determined by signature and expiry at verification
//! time. There is no revocation list; a token stays valid until natural
//! expiry regardless of account state changes.
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::error::AppError;

/// Claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the owning user id (opaque string).
    pub sub: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Type marker; present only on refresh tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

const REFRESH_TYPE: &str = "refresh";

fn sign(claims: &Claims, settings: &Settings) -> Result<String, AppError> {
    let key = EncodingKey::from_secret(settings.jwt_secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AppError::Internal(format!("token encode failed: {e}")))
}

/// Issue a signed token for `subject` with an explicit TTL in seconds.
///
/// `ttl_secs = None` uses the generic token TTL (15 minutes by default).
pub fn issue_token(
    subject: &str,
    ttl_secs: Option<u64>,
    settings: &Settings,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let ttl = ttl_secs.unwrap_or(settings.token_ttl_secs) as i64;
    let claims = Claims {
        sub: subject.to_string(),
        iat: now,
        exp: now + ttl,
        token_type: None,
    };
    sign(&claims, settings)
}

/// Issue a login access token with the configured access-token TTL.
pub fn issue_access_token(subject: &str, settings: &Settings) -> Result<String, AppError> {
    issue_token(subject, Some(settings.access_token_ttl_secs), settings)
}

/// Issue a refresh token. Carries a type marker distinguishing it from
/// access tokens and lives longer (7 days by default).
pub fn issue_refresh_token(subject: &str, settings: &Settings) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: subject.to_string(),
        iat: now,
        exp: now + settings.refresh_token_ttl_secs as i64,
        token_type: Some(REFRESH_TYPE.to_string()),
    };
    sign(&claims, settings)
}

fn decode_claims(token: &str, settings: &Settings) -> Result<Claims, AppError> {
    let key = DecodingKey::from_secret(settings.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["sub", "exp"]);

    let claims = decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::warn!(error = %e, "invalid token presented");
            AppError::Unauthorized("Could not validate credentials".to_string())
        })?;

    // The library treats exp == now as still valid; a token must be strictly
    // before its expiry to count.
    if claims.exp <= Utc::now().timestamp() {
        tracing::warn!("token rejected: expired");
        return Err(AppError::Unauthorized(
            "Could not validate credentials".to_string(),
        ));
    }

    Ok(claims)
}

/// Verify a bearer token and return its subject.
///
/// Fails with `Unauthorized` when the signature is invalid, the token is
/// expired, the subject claim is empty, or a refresh token is presented
/// where an access credential is expected.
pub fn verify_token(token: &str, settings: &Settings) -> Result<String, AppError> {
    let claims = decode_claims(token, settings)?;

    if claims.sub.is_empty() {
        tracing::warn!("token rejected: missing subject");
        return Err(AppError::Unauthorized(
            "Could not validate credentials".to_string(),
        ));
    }

    if claims.token_type.as_deref() == Some(REFRESH_TYPE) {
        tracing::warn!("refresh token presented as access credential");
        return Err(AppError::Unauthorized(
            "Could not validate credentials".to_string(),
        ));
    }

    Ok(claims.sub)
}

/// Verify a refresh token and return its subject.
pub fn verify_refresh_token(token: &str, settings: &Settings) -> Result<String, AppError> {
    let claims = decode_claims(token, settings)?;

    if claims.sub.is_empty() || claims.token_type.as_deref() != Some(REFRESH_TYPE) {
        tracing::warn!("token rejected: not a refresh token");
        return Err(AppError::Unauthorized(
            "Could not validate credentials".to_string(),
        ));
    }

    Ok(claims.sub)
}
