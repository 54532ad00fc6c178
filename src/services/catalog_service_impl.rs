//! Default implementation of the `CatalogService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, instrument};

use crate::clients::ComicSource;
use crate::models::GalleryComic;
use crate::services::catalog_service::{
    CatalogError, CatalogPage, CatalogService, filter_favorites,
};
use crate::services::favorite_service::FavoriteService;
use crate::services::page_cache::PageCache;
use crate::services::prefetch::PrefetchScheduler;

pub struct DefaultCatalogService {
    source: Arc<dyn ComicSource>,
    cache: Arc<PageCache>,
    prefetcher: Arc<PrefetchScheduler>,
    favorites: Arc<dyn FavoriteService>,
    page_size: u32,
    random_offset_max: u32,
}

impl DefaultCatalogService {
    #[must_use]
    pub fn new(
        source: Arc<dyn ComicSource>,
        cache: Arc<PageCache>,
        prefetcher: Arc<PrefetchScheduler>,
        favorites: Arc<dyn FavoriteService>,
        page_size: u32,
        random_offset_max: u32,
    ) -> Self {
        Self {
            source,
            cache,
            prefetcher,
            favorites,
            page_size,
            random_offset_max,
        }
    }
}

#[async_trait]
impl CatalogService for DefaultCatalogService {
    #[instrument(skip(self))]
    async fn resolve_page(&self, user_id: i32, offset: u32) -> Result<CatalogPage, CatalogError> {
        let page = if let Some(page) = self.cache.lookup(offset) {
            debug!(offset, "Serving catalog page from cache");
            page
        } else {
            let page = Arc::new(self.source.fetch_page(offset).await?);
            self.cache.insert_if_absent(offset, Arc::clone(&page));
            page
        };

        let favorite_ids = self.favorites.favorite_ids(user_id).await?;
        let comics = filter_favorites(&page.records, &favorite_ids);

        self.prefetcher
            .schedule_prefetch(offset.saturating_add(self.page_size));

        let mut favorite_ids: Vec<i64> = favorite_ids.into_iter().collect();
        favorite_ids.sort_unstable();

        Ok(CatalogPage {
            comics,
            favorite_ids,
        })
    }

    async fn random_gallery(&self) -> Result<Vec<GalleryComic>, CatalogError> {
        let offset = rand::rng().random_range(0..=self.random_offset_max);
        debug!(offset, "Fetching random gallery");

        let page = self.source.fetch_page(offset).await?;
        Ok(page.records.iter().map(GalleryComic::from).collect())
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::test_support::MockSource;
    use crate::config::PrefetchConfig;
    use crate::services::favorite_service::{Favorite, FavoriteError, NewFavorite};
    use parking_lot::Mutex;
    use std::collections::HashSet;

    #[derive(Default)]
    struct FakeFavorites {
        ids: Mutex<HashSet<i64>>,
    }

    #[async_trait]
    impl FavoriteService for FakeFavorites {
        async fn add(
            &self,
            _user_id: i32,
            comic_id: i64,
            favorite: NewFavorite,
        ) -> Result<Favorite, FavoriteError> {
            if !self.ids.lock().insert(comic_id) {
                return Err(FavoriteError::AlreadyExists(comic_id));
            }
            Ok(Favorite {
                id: 1,
                comic_id,
                title: favorite.title,
                page_count: None,
                price: None,
                thumbnail_path: None,
                thumbnail_extension: None,
                description: None,
            })
        }

        async fn remove(&self, _user_id: i32, comic_id: i64) -> Result<(), FavoriteError> {
            if self.ids.lock().remove(&comic_id) {
                Ok(())
            } else {
                Err(FavoriteError::NotFound)
            }
        }

        async fn list(&self, _user_id: i32) -> Result<Vec<Favorite>, FavoriteError> {
            Ok(Vec::new())
        }

        async fn favorite_ids(&self, _user_id: i32) -> Result<HashSet<i64>, FavoriteError> {
            Ok(self.ids.lock().clone())
        }
    }

    struct Harness {
        service: DefaultCatalogService,
        source: Arc<MockSource>,
        cache: Arc<PageCache>,
        favorites: Arc<FakeFavorites>,
    }

    fn harness(source: MockSource) -> Harness {
        let source = Arc::new(source);
        let cache = Arc::new(PageCache::new(3));
        let prefetcher = Arc::new(PrefetchScheduler::new(
            source.clone(),
            Arc::clone(&cache),
            &PrefetchConfig::default(),
        ));
        let favorites = Arc::new(FakeFavorites::default());
        let service = DefaultCatalogService::new(
            source.clone(),
            Arc::clone(&cache),
            prefetcher,
            favorites.clone(),
            3,
            50,
        );
        Harness {
            service,
            source,
            cache,
            favorites,
        }
    }

    async fn wait_for(cache: &PageCache, offset: u32) {
        for _ in 0..100 {
            if cache.contains(offset) {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("offset {offset} never became resident");
    }

    #[tokio::test]
    async fn test_miss_fetches_and_prefetches_next_page() {
        let h = harness(MockSource::new(3));

        let page = h.service.resolve_page(1, 0).await.unwrap();
        let ids: Vec<i64> = page.comics.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(h.cache.contains(0));

        wait_for(&h.cache, 3).await;
        assert_eq!(h.source.call_count(), 2);

        // The warmed page is served without another upstream call for it.
        h.service.resolve_page(1, 3).await.unwrap();
        wait_for(&h.cache, 6).await;
        assert_eq!(h.source.call_count(), 3);
    }

    #[tokio::test]
    async fn test_favorites_are_filtered_out() {
        let h = harness(MockSource::new(3));
        h.favorites.ids.lock().extend([1, 42]);

        let page = h.service.resolve_page(7, 0).await.unwrap();
        let ids: Vec<i64> = page.comics.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(page.favorite_ids, vec![1, 42]);
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces_on_miss() {
        let h = harness(MockSource::failing(3));

        let result = h.service.resolve_page(1, 0).await;
        assert!(matches!(result, Err(CatalogError::Upstream(_))));
        assert!(h.cache.is_empty());
    }

    #[tokio::test]
    async fn test_random_gallery_bypasses_cache() {
        let h = harness(MockSource::new(3));

        let gallery = h.service.random_gallery().await.unwrap();
        assert_eq!(gallery.len(), 3);
        assert!(gallery[0].thumbnail.ends_with("/portrait_uncanny.jpg"));
        assert!(gallery[0].id <= 50);
        assert!(h.cache.is_empty());
        assert_eq!(h.source.call_count(), 1);
    }
}
