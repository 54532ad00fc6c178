use axum::{
    Extension, Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState, CurrentUser, MessageResponse};
use crate::services::{RegisterRequest, UserInfo};

const USER_ID_KEY: &str = "user_id";
const USERNAME_KEY: &str = "username";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Rejects requests without a logged-in session and hands the identity to
/// the handler as a [`CurrentUser`] extension.
pub async fn auth_middleware(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = session
        .get::<i32>(USER_ID_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    let Some(id) = user_id else {
        return Err(ApiError::unauthorized("Authentication required"));
    };

    let username = session
        .get::<String>(USERNAME_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .unwrap_or_default();

    tracing::Span::current().record("user_id", id);
    request.extensions_mut().insert(CurrentUser { id, username });

    Ok(next.run(request).await)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth_service().register(&payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserInfo>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    session
        .insert(USER_ID_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;
    session
        .insert(USERNAME_KEY, &user.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(user))
}

/// GET|POST /logout
pub async fn logout(session: Session) -> Json<MessageResponse> {
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to flush session: {e}");
    }
    Json(MessageResponse::new("Logged out"))
}

/// GET /me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UserInfo>, ApiError> {
    let info = state.auth_service().get_user(user.id).await?;
    Ok(Json(info))
}
