use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, AppState, CatalogResponse, CurrentUser};
use crate::models::GalleryComic;
use crate::services::{CachedPageInfo, CatalogPage};

#[derive(Debug, Serialize)]
pub struct CacheStatus {
    pub capacity: usize,
    pub prefetch_in_flight: usize,
    pub pages: Vec<CachedPageInfo>,
}

/// GET /catalog
pub async fn catalog(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<CatalogResponse>, ApiError> {
    let page = state.catalog_service().resolve_page(user.id, 0).await?;
    let favorites = state.favorite_service().list(user.id).await?;

    Ok(Json(CatalogResponse {
        comics: page.comics,
        favorites,
        favorite_ids: page.favorite_ids,
    }))
}

/// GET /load_more_comics/{offset}
pub async fn load_more_comics(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(offset): Path<String>,
) -> Result<Json<CatalogPage>, ApiError> {
    let offset: u32 = offset
        .parse()
        .map_err(|_| ApiError::validation(format!("Invalid offset: {offset}")))?;

    let page = state.catalog_service().resolve_page(user.id, offset).await?;
    Ok(Json(page))
}

/// GET /get_random_comics
pub async fn get_random_comics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GalleryComic>>, ApiError> {
    let comics = state.catalog_service().random_gallery().await?;
    Ok(Json(comics))
}

/// GET /cache
pub async fn cache_status(State(state): State<Arc<AppState>>) -> Json<CacheStatus> {
    let shared = &state.shared;
    Json(CacheStatus {
        capacity: shared.page_cache.capacity(),
        prefetch_in_flight: shared.prefetcher.in_flight(),
        pages: shared.page_cache.snapshot(),
    })
}
