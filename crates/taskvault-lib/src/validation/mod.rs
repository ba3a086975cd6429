// ============================
// crates/taskvault-lib/src/validation/mod.rs
// ============================
//! Input validation module.
//!
//! Pure, stateless rule checks for registration fields and task free text.
//! Each function reports the first failing rule. The SQL-shaped-input scan
//! is a defense-in-depth layer only; the stores always use parameterized
//! queries regardless of its outcome.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// Common validation constants
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;
const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 30;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_TITLE_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Symbols accepted as the "special character" password requirement.
const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

// Regex patterns for validation
static USERNAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Heuristic patterns for SQL-injection-shaped input.
static SQL_INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bUNION\b.*\bSELECT\b",
        r"(?i)\bDROP\b.*\bTABLE\b",
        r"(?i)\bINSERT\b.*\bINTO\b",
        r"(?i)\bDELETE\b.*\bFROM\b",
        r"--",
        r";.*--",
        r"(?i)\bOR\b.*=",
        r"(?i)'.*OR.*'.*=.*'",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Invalid description: {0}")]
    InvalidDescription(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for crate::error::AppError {
    fn from(e: ValidationError) -> Self {
        crate::error::AppError::Validation(e.to_string())
    }
}

/// Validate password strength. Rules are checked independently and the
/// first failure is reported.
pub fn validate_password(password: &str) -> ValidationResult<&str> {
    // Length limits count characters, not bytes, so multi-byte input is
    // measured the way callers see it.
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    if !password.chars().any(char::is_uppercase) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !password.chars().any(char::is_lowercase) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one digit".to_string(),
        ));
    }

    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain at least one special character".to_string(),
        ));
    }

    Ok(password)
}

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    let length = username.chars().count();
    if length < MIN_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username must be at least {MIN_USERNAME_LENGTH} characters"
        )));
    }

    if length > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "Username can only contain letters, numbers, hyphens, and underscores".to_string(),
        ));
    }

    Ok(username)
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    // Byte length on purpose: the RFC 5321 limit is an octet count.
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(
            "Email address is too long".to_string(),
        ));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email format".to_string(),
        ));
    }

    Ok(email)
}

/// Normalize an email for storage and lookup: trimmed, lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check whether input contains SQL-injection-shaped substrings.
pub fn looks_like_sql_injection(input: &str) -> bool {
    SQL_INJECTION_PATTERNS.iter().any(|p| p.is_match(input))
}

/// Validate a task title
pub fn validate_title(title: &str) -> ValidationResult<&str> {
    if title.trim().is_empty() {
        return Err(ValidationError::InvalidTitle(
            "Title cannot be empty".to_string(),
        ));
    }

    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::InvalidTitle(format!(
            "Title must be {MAX_TITLE_LENGTH} characters or less"
        )));
    }

    if looks_like_sql_injection(title) {
        return Err(ValidationError::InvalidTitle(
            "Invalid characters in title".to_string(),
        ));
    }

    Ok(title)
}

/// Validate an optional task description
pub fn validate_description(description: &str) -> ValidationResult<&str> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::InvalidDescription(format!(
            "Description must be {MAX_DESCRIPTION_LENGTH} characters or less"
        )));
    }

    if looks_like_sql_injection(description) {
        return Err(ValidationError::InvalidDescription(
            "Invalid characters in description".to_string(),
        ));
    }

    Ok(description)
}
