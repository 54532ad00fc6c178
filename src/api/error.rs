use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use std::fmt;

use super::ErrorResponse;
use crate::services::{AuthError, CatalogError, FavoriteError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    Unauthorized(String),

    ValidationError(String),

    /// Field name to message, returned alongside the summary.
    InvalidForm(BTreeMap<String, String>),

    Conflict(String),

    UpstreamError(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::InvalidForm(errors) => write!(f, "Invalid form: {} field(s)", errors.len()),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::UpstreamError(msg) => write!(f, "Upstream error: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorResponse::new(msg)),
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            Self::InvalidForm(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::with_fields("Please correct the highlighted fields", errors),
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, ErrorResponse::new(msg)),
            Self::UpstreamError(msg) => {
                tracing::warn!("Comic API error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg))
            }
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("A database error occurred"),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("An internal error occurred"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::Validation(errors) => Self::InvalidForm(errors),
            AuthError::UserNotFound => Self::NotFound(err.to_string()),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<FavoriteError> for ApiError {
    fn from(err: FavoriteError) -> Self {
        match err {
            FavoriteError::NotFound => Self::NotFound(err.to_string()),
            FavoriteError::AlreadyExists(_) => Self::Conflict(err.to_string()),
            FavoriteError::Validation(msg) => Self::ValidationError(msg),
            FavoriteError::Persistence(msg) => Self::DatabaseError(msg),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Upstream(e) => Self::UpstreamError(e.to_string()),
            CatalogError::Favorites(e) => e.into(),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::UpstreamError;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_message() {
        let err: ApiError = CatalogError::Upstream(UpstreamError::Timeout).into();
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Comic API request timed out");
    }

    #[tokio::test]
    async fn test_favorite_errors_map_to_status() {
        let (status, _) = body_json(FavoriteError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = body_json(FavoriteError::AlreadyExists(5).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Comic 5 is already a favorite");

        let (status, body) = body_json(FavoriteError::Persistence("disk".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "A database error occurred");
    }

    #[tokio::test]
    async fn test_invalid_form_lists_fields() {
        let mut errors = BTreeMap::new();
        errors.insert("email".to_string(), "taken".to_string());
        let (status, body) = body_json(AuthError::Validation(errors).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"]["email"], "taken");
        assert!(body["error"].is_string());
    }
}
