//! Domain service for a user's favorite comics.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::entities::favorites;

#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("Favorite not found")]
    NotFound,

    #[error("Comic {0} is already a favorite")]
    AlreadyExists(i64),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<anyhow::Error> for FavoriteError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<sea_orm::DbErr> for FavoriteError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Metadata the browser sends when favoriting a comic.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFavorite {
    pub title: String,
    #[serde(rename = "pageCount", default)]
    pub page_count: Option<i32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
    #[serde(default)]
    pub thumbnail_extension: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Favorite {
    pub id: i32,
    pub comic_id: i64,
    pub title: String,
    #[serde(rename = "pageCount")]
    pub page_count: Option<i32>,
    pub price: Option<f64>,
    pub thumbnail_path: Option<String>,
    pub thumbnail_extension: Option<String>,
    pub description: Option<String>,
}

impl From<favorites::Model> for Favorite {
    fn from(model: favorites::Model) -> Self {
        Self {
            id: model.id,
            comic_id: model.comic_id,
            title: model.title,
            page_count: model.page_count,
            price: model.price,
            thumbnail_path: model.thumbnail_path,
            thumbnail_extension: model.thumbnail_extension,
            description: model.description,
        }
    }
}

#[async_trait::async_trait]
pub trait FavoriteService: Send + Sync {
    async fn add(
        &self,
        user_id: i32,
        comic_id: i64,
        favorite: NewFavorite,
    ) -> Result<Favorite, FavoriteError>;

    /// # Errors
    ///
    /// Returns [`FavoriteError::NotFound`] when the user has no such favorite.
    async fn remove(&self, user_id: i32, comic_id: i64) -> Result<(), FavoriteError>;

    async fn list(&self, user_id: i32) -> Result<Vec<Favorite>, FavoriteError>;

    async fn favorite_ids(&self, user_id: i32) -> Result<HashSet<i64>, FavoriteError> {
        Ok(self
            .list(user_id)
            .await?
            .into_iter()
            .map(|f| f.comic_id)
            .collect())
    }
}
