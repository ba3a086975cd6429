// ============================
// crates/taskvault-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod identity;
pub mod password;
pub mod session;
pub mod token;

pub use identity::{BearerIdentity, IdentityResolver, SessionIdentity};
pub use password::{hash_password, hash_password_secure, verify_password, MAX_PASSWORD_BYTES};
pub use session::{sign_session_id, SessionVerifier};
pub use token::{issue_access_token, issue_refresh_token, issue_token, verify_token, Claims};
