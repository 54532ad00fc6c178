pub mod page_cache;
pub use page_cache::{CachedPageInfo, InsertOutcome, PageCache};

pub mod prefetch;
pub use prefetch::PrefetchScheduler;

pub mod catalog_service;
pub mod catalog_service_impl;
pub use catalog_service::{CatalogError, CatalogPage, CatalogService};
pub use catalog_service_impl::DefaultCatalogService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, RegisterRequest, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod favorite_service;
pub mod favorite_service_impl;
pub use favorite_service::{Favorite, FavoriteError, FavoriteService, NewFavorite};
pub use favorite_service_impl::SeaOrmFavoriteService;
