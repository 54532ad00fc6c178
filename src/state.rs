use std::sync::Arc;

use crate::clients::{ComicSource, MarvelClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CatalogService, DefaultCatalogService, FavoriteService, PageCache,
    PrefetchScheduler, SeaOrmAuthService, SeaOrmFavoriteService,
};

/// Build the HTTP client shared by every upstream call so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("Comicshelf/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub source: Arc<dyn ComicSource>,

    pub page_cache: Arc<PageCache>,

    pub prefetcher: Arc<PrefetchScheduler>,

    pub catalog_service: Arc<dyn CatalogService>,

    pub auth_service: Arc<dyn AuthService>,

    pub favorite_service: Arc<dyn FavoriteService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client(config.marvel.request_timeout_seconds)?;
        let source = Arc::new(MarvelClient::with_shared_client(
            http_client,
            config.marvel.clone(),
        ));

        Self::with_comic_source(config, source).await
    }

    /// Wires every service around an arbitrary comic source.
    pub async fn with_comic_source(
        config: Config,
        source: Arc<dyn ComicSource>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let page_cache = Arc::new(PageCache::new(config.cache.capacity));
        let prefetcher = Arc::new(PrefetchScheduler::new(
            Arc::clone(&source),
            Arc::clone(&page_cache),
            &config.prefetch,
        ));

        let favorite_service =
            Arc::new(SeaOrmFavoriteService::new(store.clone())) as Arc<dyn FavoriteService>;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        let catalog_service = Arc::new(DefaultCatalogService::new(
            Arc::clone(&source),
            Arc::clone(&page_cache),
            Arc::clone(&prefetcher),
            Arc::clone(&favorite_service),
            config.marvel.page_size,
            config.marvel.random_offset_max,
        )) as Arc<dyn CatalogService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            source,
            page_cache,
            prefetcher,
            catalog_service,
            auth_service,
            favorite_service,
        })
    }
}
