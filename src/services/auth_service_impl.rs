//! `SeaORM` implementation of the `AuthService` trait.

use std::collections::BTreeMap;

use crate::config::SecurityConfig;
use crate::db::{NewUser, Store};
use crate::services::auth_service::{
    AuthError, AuthService, PASSWORD_SPECIAL_CHARS, RegisterRequest, UserInfo, is_strong_password,
};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, request: &RegisterRequest) -> Result<UserInfo, AuthError> {
        let username = request.username.trim();
        let email = request.email.trim();
        let identification = request.identification.trim();

        let mut errors = BTreeMap::new();

        for (field, value) in [
            ("username", username),
            ("email", email),
            ("identification", identification),
        ] {
            if value.is_empty() {
                errors.insert(field.to_string(), "This field is required".to_string());
            }
        }

        let conflicts = self
            .store
            .find_user_conflicts(username, email, identification)
            .await?;

        if conflicts.username {
            errors.insert("username".to_string(), "This username already exists".to_string());
        }
        if conflicts.email {
            errors.insert("email".to_string(), "This email is already registered".to_string());
        }
        if conflicts.identification {
            errors.insert(
                "identification".to_string(),
                "This identification is already registered".to_string(),
            );
        }

        if request.password != request.confirm_password {
            errors.insert("password".to_string(), "Passwords do not match".to_string());
        } else if !is_strong_password(&request.password) {
            errors.insert(
                "password".to_string(),
                format!(
                    "Password must be at least 8 characters and include an uppercase letter, a lowercase letter, a number and a special character ({PASSWORD_SPECIAL_CHARS})"
                ),
            );
        }

        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let user = self
            .store
            .create_user(
                NewUser {
                    username,
                    email,
                    identification,
                    password: &request.password,
                },
                &self.security,
            )
            .await?;

        info!(user_id = user.id, username = %user.username, "Registered new user");

        Ok(UserInfo::from(user))
    }

    async fn login(&self, email: &str, password: &str) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .verify_user_credentials(email.trim(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(UserInfo::from(user))
    }

    async fn get_user(&self, user_id: i32) -> Result<UserInfo, AuthError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserInfo::from(user))
    }
}
