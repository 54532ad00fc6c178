//! `SeaORM` implementation of the `FavoriteService` trait.

use crate::db::{FavoriteInput, Store};
use crate::services::favorite_service::{Favorite, FavoriteError, FavoriteService, NewFavorite};
use async_trait::async_trait;

pub struct SeaOrmFavoriteService {
    store: Store,
}

impl SeaOrmFavoriteService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FavoriteService for SeaOrmFavoriteService {
    async fn add(
        &self,
        user_id: i32,
        comic_id: i64,
        favorite: NewFavorite,
    ) -> Result<Favorite, FavoriteError> {
        let title = favorite.title.trim();
        if title.is_empty() {
            return Err(FavoriteError::Validation("title is required".to_string()));
        }

        let input = FavoriteInput {
            title: title.to_string(),
            page_count: favorite.page_count,
            price: favorite.price,
            thumbnail_path: favorite.thumbnail_path,
            thumbnail_extension: favorite.thumbnail_extension,
            description: favorite.description,
        };

        self.store
            .add_favorite(user_id, comic_id, input)
            .await?
            .map(Favorite::from)
            .ok_or(FavoriteError::AlreadyExists(comic_id))
    }

    async fn remove(&self, user_id: i32, comic_id: i64) -> Result<(), FavoriteError> {
        if self.store.remove_favorite(user_id, comic_id).await? {
            Ok(())
        } else {
            Err(FavoriteError::NotFound)
        }
    }

    async fn list(&self, user_id: i32) -> Result<Vec<Favorite>, FavoriteError> {
        let rows = self.store.list_favorites(user_id).await?;
        Ok(rows.into_iter().map(Favorite::from).collect())
    }
}
