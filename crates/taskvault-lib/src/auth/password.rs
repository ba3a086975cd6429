// ============================
// crates/taskvault-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use bcrypt::{hash, verify, DEFAULT_COST};
use zeroize::Zeroize;

/// bcrypt only consumes the first 72 bytes of input. Both hashing and
/// verification truncate to this limit so the two always agree.
///
/// Known and documented weakness: passwords that agree on their first
/// 72 bytes map to the same hash.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Truncate a password to the effective bcrypt input length.
fn effective_bytes(plain: &str) -> &[u8] {
    let bytes = plain.as_bytes();
    &bytes[..bytes.len().min(MAX_PASSWORD_BYTES)]
}

/// Hash a password with bcrypt using a per-hash random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let digest = hash(effective_bytes(plain), DEFAULT_COST)?;
    Ok(digest)
}

/// Verify a password against a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch rather than an error;
/// callers treat it like any wrong password.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    verify(effective_bytes(plain), hash).unwrap_or(false)
}

/// Hash a password and zeroize the plaintext afterwards.
pub fn hash_password_secure(plain: &mut String) -> anyhow::Result<String> {
    let digest = hash_password(plain)?;
    plain.zeroize();
    Ok(digest)
}
