use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub marvel: MarvelConfig,

    pub cache: CacheConfig,

    pub prefetch: PrefetchConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/comicshelf.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Leave disabled when serving plain HTTP during development.
    pub secure_cookies: bool,

    /// Sessions expire after this many minutes without a request.
    pub session_inactivity_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            cors_allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:5000".to_string(),
            ],
            secure_cookies: false,
            session_inactivity_minutes: 60,
        }
    }
}

/// Upstream comic catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarvelConfig {
    pub base_url: String,

    pub public_key: String,

    #[serde(skip_serializing)]
    pub private_key: String,

    /// Records requested per page.
    pub page_size: u32,

    /// Added to every offset before it is sent upstream.
    pub offset_shift: u32,

    pub request_timeout_seconds: u64,

    /// Upper bound (inclusive) for the random gallery offset.
    pub random_offset_max: u32,
}

impl Default for MarvelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://gateway.marvel.com/v1/public/comics".to_string(),
            public_key: String::new(),
            private_key: String::new(),
            page_size: 12,
            offset_shift: 200,
            request_timeout_seconds: 10,
            random_offset_max: 50,
        }
    }
}

impl MarvelConfig {
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.public_key.is_empty() && !self.private_key.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of resident pages.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefetchConfig {
    pub enabled: bool,

    /// Cap on concurrently running background fetches.
    pub max_in_flight: usize,

    pub timeout_seconds: u64,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_in_flight: 4,
            timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Credentials and the database URL may come from the environment so they
    /// never have to live in the config file.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("MARVEL_API_KEY").filter(|v| !v.is_empty()) {
            self.marvel.public_key = key;
        }
        if let Some(key) = lookup("MARVEL_PRIVATE_KEY").filter(|v| !v.is_empty()) {
            self.marvel.private_key = key;
        }
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.general.database_path = url;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("comicshelf").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".comicshelf").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.capacity == 0 {
            anyhow::bail!("cache.capacity must be at least 1");
        }

        if self.marvel.page_size == 0 {
            anyhow::bail!("marvel.page_size must be at least 1");
        }

        if self.marvel.base_url.is_empty() {
            anyhow::bail!("marvel.base_url cannot be empty");
        }

        if self.prefetch.enabled && self.prefetch.max_in_flight == 0 {
            anyhow::bail!("prefetch.max_in_flight must be > 0 when prefetch is enabled");
        }

        if !self.marvel.has_credentials() {
            warn!("Marvel API keys are not configured; catalog requests will fail");
        }

        Ok(())
    }
}
