use crate::entities::{favorites, prelude::*};
use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tracing::info;

/// Comic metadata stored alongside a favorite so the favorites tab renders
/// without calling upstream.
#[derive(Debug, Clone, Default)]
pub struct FavoriteInput {
    pub title: String,
    pub page_count: Option<i32>,
    pub price: Option<f64>,
    pub thumbnail_path: Option<String>,
    pub thumbnail_extension: Option<String>,
    pub description: Option<String>,
}

pub struct FavoriteRepository {
    conn: DatabaseConnection,
}

impl FavoriteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a favorite. Returns `None` when the user already has this comic.
    pub async fn add(
        &self,
        user_id: i32,
        comic_id: i64,
        input: FavoriteInput,
    ) -> Result<Option<favorites::Model>> {
        let txn = self.conn.begin().await?;

        let existing = Favorites::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::ComicId.eq(comic_id))
            .one(&txn)
            .await
            .context("Failed to query favorite")?;

        if existing.is_some() {
            txn.rollback().await?;
            return Ok(None);
        }

        let active = favorites::ActiveModel {
            user_id: Set(user_id),
            comic_id: Set(comic_id),
            title: Set(input.title),
            page_count: Set(input.page_count),
            price: Set(input.price),
            thumbnail_path: Set(input.thumbnail_path),
            thumbnail_extension: Set(input.thumbnail_extension),
            description: Set(input.description),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = Favorites::insert(active)
            .exec_with_returning(&txn)
            .await
            .context("Failed to insert favorite")?;

        txn.commit().await?;

        info!(user_id, comic_id, "Added favorite");
        Ok(Some(model))
    }

    /// Deletes a favorite. Returns `false` when it did not exist.
    pub async fn remove(&self, user_id: i32, comic_id: i64) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let Some(favorite) = Favorites::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::ComicId.eq(comic_id))
            .one(&txn)
            .await
            .context("Failed to query favorite")?
        else {
            txn.rollback().await?;
            return Ok(false);
        };

        favorite
            .delete(&txn)
            .await
            .context("Failed to delete favorite")?;
        txn.commit().await?;

        info!(user_id, comic_id, "Removed favorite");
        Ok(true)
    }

    pub async fn list_for_user(&self, user_id: i32) -> Result<Vec<favorites::Model>> {
        let rows = Favorites::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .order_by_asc(favorites::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list favorites")?;

        Ok(rows)
    }
}
