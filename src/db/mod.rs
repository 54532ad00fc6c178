use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::favorites;

pub mod migrator;
pub mod repositories;

pub use repositories::favorite::FavoriteInput;
pub use repositories::user::{NewUser, User, UserConflicts};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every SQLite memory connection is its own database, so pin the pool to one.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    // ========== User Repository Methods ==========

    #[must_use]
    pub fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn find_user_conflicts(
        &self,
        username: &str,
        email: &str,
        identification: &str,
    ) -> Result<UserConflicts> {
        self.user_repo()
            .find_conflicts(username, email, identification)
            .await
    }

    pub async fn create_user(&self, new_user: NewUser<'_>, config: &SecurityConfig) -> Result<User> {
        self.user_repo().create(new_user, config).await
    }

    pub async fn verify_user_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_credentials(email, password).await
    }

    // ========== Favorite Repository Methods ==========

    fn favorite_repo(&self) -> repositories::favorite::FavoriteRepository {
        repositories::favorite::FavoriteRepository::new(self.conn.clone())
    }

    pub async fn add_favorite(
        &self,
        user_id: i32,
        comic_id: i64,
        input: FavoriteInput,
    ) -> Result<Option<favorites::Model>> {
        self.favorite_repo().add(user_id, comic_id, input).await
    }

    pub async fn remove_favorite(&self, user_id: i32, comic_id: i64) -> Result<bool> {
        self.favorite_repo().remove(user_id, comic_id).await
    }

    pub async fn list_favorites(&self, user_id: i32) -> Result<Vec<favorites::Model>> {
        self.favorite_repo().list_for_user(user_id).await
    }
}
