// ============================
// crates/taskvault-lib/src/store/users.rs
// ============================
//! Account directory: create/lookup users, enforce uniqueness,
//! authenticate credentials.
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{is_unique_violation, AppError};
use crate::models::{User, UserPatch};
use crate::validation;

pub const EMAIL_TAKEN: &str = "Email already registered";
pub const USERNAME_TAKEN: &str = "Username already taken";

#[derive(Clone)]
pub struct UserDirectory {
    pool: SqlitePool,
}

impl UserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an account after validating all fields.
    ///
    /// Email and username are pre-checked explicitly so the caller gets a
    /// specific conflict reason. The UNIQUE constraints remain the final
    /// arbiter for requests racing past the pre-check; a late violation is
    /// translated to the same `Conflict`.
    pub async fn create(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, AppError> {
        validation::validate_email(email.trim())?;
        let username = username.trim();
        validation::validate_username(username)?;
        validation::validate_password(password)?;

        let email = validation::normalize_email(email);
        let password_hash =
            hash_password(password).map_err(|e| AppError::Internal(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(&email)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            tracing::warn!(email = %email, "registration conflict: email exists");
            return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let existing: Option<(String,)> =
            sqlx::query_as("SELECT id FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            tracing::warn!(username = %username, "registration conflict: username exists");
            return Err(AppError::Conflict(USERNAME_TAKEN.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            username: username.to_string(),
            password_hash,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };

        let inserted = sqlx::query(
            "INSERT INTO users (id, email, username, password_hash, is_active, is_verified, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(user.is_verified)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Err(conflict_for(&e)),
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(validation::normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Authenticate by email and password.
    ///
    /// Returns `None` uniformly for an unknown email and a wrong password;
    /// the caller sees no difference between the two, avoiding account
    /// enumeration through response shape.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let user = self.find_by_email(email).await?;
        match user {
            Some(user) if verify_password(&user.password_hash, password) => Ok(Some(user)),
            _ => Ok(None),
        }
    }

    /// Apply a partial account update (email and/or username), with the
    /// same validation and normalization as registration.
    pub async fn update(&self, id: &str, patch: UserPatch) -> Result<Option<User>, AppError> {
        let Some(mut user) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        if let Some(email) = patch.email {
            validation::validate_email(email.trim())?;
            user.email = validation::normalize_email(&email);
        }
        if let Some(username) = patch.username {
            let username = username.trim().to_string();
            validation::validate_username(&username)?;
            user.username = username;
        }
        user.updated_at = Utc::now();

        let updated = sqlx::query(
            "UPDATE users SET email = ?, username = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.updated_at)
        .bind(id)
        .execute(&self.pool)
        .await;

        match updated {
            Ok(_) => Ok(Some(user)),
            Err(e) if is_unique_violation(&e) => Err(conflict_for(&e)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Map a storage uniqueness violation to the specific conflict reason.
fn conflict_for(err: &sqlx::Error) -> AppError {
    let detail = err
        .as_database_error()
        .map(|db| db.message().to_string())
        .unwrap_or_default();
    if detail.contains("users.username") {
        AppError::Conflict(USERNAME_TAKEN.to_string())
    } else {
        AppError::Conflict(EMAIL_TAKEN.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn directory() -> UserDirectory {
        UserDirectory::new(db::connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn create_then_authenticate_round_trip() {
        let users = directory().await;
        let created = users
            .create("a@x.com", "alice", "Secur3!pass")
            .await
            .unwrap();

        let authed = users
            .authenticate("a@x.com", "Secur3!pass")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(authed.id, created.id);

        let denied = users.authenticate("a@x.com", "Wrong1!pass").await.unwrap();
        assert!(denied.is_none());

        let unknown = users
            .authenticate("nobody@x.com", "Secur3!pass")
            .await
            .unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn email_is_normalized_on_create_and_lookup() {
        let users = directory().await;
        let created = users
            .create("  Alice@Example.COM ", "alice", "Secur3!pass")
            .await
            .unwrap();
        assert_eq!(created.email, "alice@example.com");

        let found = users.find_by_email("ALICE@example.com").await.unwrap();
        assert_eq!(found.unwrap().id, created.id);

        // Authentication goes through the same normalization.
        assert!(users
            .authenticate("Alice@Example.com", "Secur3!pass")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_with_specific_reason() {
        let users = directory().await;
        users
            .create("a@x.com", "alice", "Secur3!pass")
            .await
            .unwrap();

        let err = users
            .create("a@x.com", "bob", "Secur3!pass")
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(msg, EMAIL_TAKEN),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_username_conflicts_with_specific_reason() {
        let users = directory().await;
        users
            .create("a@x.com", "alice", "Secur3!pass")
            .await
            .unwrap();

        let err = users
            .create("b@x.com", "alice", "Secur3!pass")
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(msg, USERNAME_TAKEN),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_fields_rejected_before_storage() {
        let users = directory().await;

        assert!(matches!(
            users.create("not-an-email", "alice", "Secur3!pass").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            users.create("a@x.com", "x", "Secur3!pass").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            users.create("a@x.com", "alice", "weak").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn response_never_contains_plaintext_password() {
        let users = directory().await;
        let created = users
            .create("a@x.com", "alice", "Secur3!pass")
            .await
            .unwrap();
        assert_ne!(created.password_hash, "Secur3!pass");
        assert!(created.password_hash.starts_with("$2"));
    }

    #[tokio::test]
    async fn update_changes_only_patched_fields() {
        let users = directory().await;
        let created = users
            .create("a@x.com", "alice", "Secur3!pass")
            .await
            .unwrap();

        let updated = users
            .update(
                &created.id,
                UserPatch {
                    username: Some("alice2".to_string()),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.email, "a@x.com");

        // Unknown id is a clean miss.
        assert!(users
            .update("no-such-id", UserPatch::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn update_to_taken_username_conflicts() {
        let users = directory().await;
        users
            .create("a@x.com", "alice", "Secur3!pass")
            .await
            .unwrap();
        let bob = users
            .create("b@x.com", "bob", "Secur3!pass")
            .await
            .unwrap();

        let err = users
            .update(
                &bob.id,
                UserPatch {
                    username: Some("alice".to_string()),
                    ..UserPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
