//! Domain service for paging through the comic catalog.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::clients::UpstreamError;
use crate::models::{ComicRecord, GalleryComic};
use crate::services::favorite_service::FavoriteError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to fetch comics: {0}")]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Favorites(#[from] FavoriteError),
}

/// One resolved page with the caller's favorites already removed.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub comics: Vec<ComicRecord>,
    pub favorite_ids: Vec<i64>,
}

#[async_trait::async_trait]
pub trait CatalogService: Send + Sync {
    /// Serves `offset` from the page cache or upstream, then warms the
    /// following page in the background.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Upstream`] when a cache miss cannot be fetched.
    async fn resolve_page(&self, user_id: i32, offset: u32) -> Result<CatalogPage, CatalogError>;

    /// A page from a random offset. Never reads or writes the page cache.
    async fn random_gallery(&self) -> Result<Vec<GalleryComic>, CatalogError>;

    fn page_size(&self) -> u32;
}

/// Keeps page order, drops every record whose id is in `favorite_ids`.
#[must_use]
pub fn filter_favorites(records: &[ComicRecord], favorite_ids: &HashSet<i64>) -> Vec<ComicRecord> {
    records
        .iter()
        .filter(|record| !favorite_ids.contains(&record.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::test_support::comic;

    #[test]
    fn test_filter_favorites_keeps_order() {
        let records = vec![comic(1), comic(2), comic(3)];
        let favorites: HashSet<i64> = [2].into_iter().collect();

        let ids: Vec<i64> = filter_favorites(&records, &favorites)
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_filter_favorites_ignores_unknown_ids() {
        let records = vec![comic(1), comic(2)];
        let favorites: HashSet<i64> = [99].into_iter().collect();
        assert_eq!(filter_favorites(&records, &favorites).len(), 2);
        assert!(filter_favorites(&[], &favorites).is_empty());
    }
}
