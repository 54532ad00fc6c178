//! Domain service for account registration and login.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Characters accepted as the "special" class of a strong password.
pub const PASSWORD_SPECIAL_CHARS: &str = r#"!@#$%^&*(),.?":{}|<>"#;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Field name to message, one entry per failed check.
    #[error("Registration failed: {}", format_field_errors(.0))]
    Validation(BTreeMap<String, String>),

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_field_errors(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Registration form as submitted by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub identification: String,
    pub password: String,
    pub confirm_password: String,
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: String,
}

impl From<crate::db::User> for UserInfo {
    fn from(user: crate::db::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] with every failed field check.
    async fn register(&self, request: &RegisterRequest) -> Result<UserInfo, AuthError>;

    /// Verifies an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown email or a
    /// wrong password alike.
    async fn login(&self, email: &str, password: &str) -> Result<UserInfo, AuthError>;

    /// Gets information for a specific user.
    async fn get_user(&self, user_id: i32) -> Result<UserInfo, AuthError>;
}

static UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]").expect("valid regex"));
static LOWER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]").expect("valid regex"));
static DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("valid regex"));

/// At least 8 characters with an uppercase letter, a lowercase letter, a
/// digit and one of [`PASSWORD_SPECIAL_CHARS`].
#[must_use]
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && UPPER.is_match(password)
        && LOWER.is_match(password)
        && DIGIT.is_match(password)
        && password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c))
}
