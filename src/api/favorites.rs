use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, AppState, CurrentUser, MessageResponse};
use crate::services::{Favorite, NewFavorite};

fn parse_comic_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::validation(format!("Invalid comic id: {raw}")))
}

/// GET /favorites
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<Favorite>>, ApiError> {
    let favorites = state.favorite_service().list(user.id).await?;
    Ok(Json(favorites))
}

/// POST /add_favorite/{comic_id}
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(comic_id): Path<String>,
    Json(payload): Json<NewFavorite>,
) -> Result<impl IntoResponse, ApiError> {
    let comic_id = parse_comic_id(&comic_id)?;

    let favorite = state
        .favorite_service()
        .add(user.id, comic_id, payload)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!(
            "Added \"{}\" to favorites",
            favorite.title
        ))),
    ))
}

/// POST /remove_favorite/{comic_id}
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(comic_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let comic_id = parse_comic_id(&comic_id)?;

    state.favorite_service().remove(user.id, comic_id).await?;

    Ok(Json(MessageResponse::new("Removed from favorites")))
}
