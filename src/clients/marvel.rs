//! Client for the Marvel comics catalog API.
//!
//! Every request is signed with `md5(ts + private_key + public_key)` where `ts`
//! is a nonce generated per call, as the upstream API requires.

use async_trait::async_trait;
use md5::{Digest, Md5};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::MarvelConfig;
use crate::models::{ComicPage, ComicRecord, Thumbnail};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Marvel API keys are not configured")]
    MissingCredentials,

    #[error("Invalid comic API URL: {0}")]
    InvalidUrl(String),

    #[error("Request to comic API failed: {0}")]
    Http(reqwest::Error),

    #[error("Comic API request timed out")]
    Timeout,

    #[error("Comic API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse comic API response: {0}")]
    Parse(String),

    #[error("Comic API response is missing `{0}`")]
    MissingField(&'static str),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

/// Anything that can turn an offset into a page of comics.
#[async_trait]
pub trait ComicSource: Send + Sync {
    async fn fetch_page(&self, offset: u32) -> Result<ComicPage, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct MarvelEnvelope {
    data: Option<MarvelData>,
}

#[derive(Debug, Deserialize)]
struct MarvelData {
    results: Option<Vec<MarvelComic>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarvelComic {
    id: Option<i64>,
    title: Option<String>,
    description: Option<String>,
    page_count: Option<i32>,
    #[serde(default)]
    prices: Vec<MarvelPrice>,
    thumbnail: Option<MarvelThumbnail>,
}

#[derive(Debug, Deserialize)]
struct MarvelPrice {
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarvelThumbnail {
    path: Option<String>,
    extension: Option<String>,
}

impl TryFrom<MarvelComic> for ComicRecord {
    type Error = UpstreamError;

    fn try_from(raw: MarvelComic) -> Result<Self, Self::Error> {
        let thumbnail = raw
            .thumbnail
            .ok_or(UpstreamError::MissingField("thumbnail"))?;

        Ok(Self {
            id: raw.id.ok_or(UpstreamError::MissingField("id"))?,
            title: raw.title.ok_or(UpstreamError::MissingField("title"))?,
            description: raw.description.unwrap_or_default(),
            page_count: raw.page_count.unwrap_or(0),
            price: raw.prices.first().and_then(|p| p.price).unwrap_or(0.0),
            thumbnail: Thumbnail {
                path: thumbnail
                    .path
                    .ok_or(UpstreamError::MissingField("thumbnail.path"))?,
                extension: thumbnail
                    .extension
                    .ok_or(UpstreamError::MissingField("thumbnail.extension"))?,
            },
        })
    }
}

/// Parses a `data.results` response body into catalog records.
pub fn parse_results(body: &str) -> Result<Vec<ComicRecord>, UpstreamError> {
    let envelope: MarvelEnvelope =
        serde_json::from_str(body).map_err(|e| UpstreamError::Parse(e.to_string()))?;

    envelope
        .data
        .ok_or(UpstreamError::MissingField("data"))?
        .results
        .ok_or(UpstreamError::MissingField("data.results"))?
        .into_iter()
        .map(ComicRecord::try_from)
        .collect()
}

/// Request signature expected by the Marvel API.
#[must_use]
pub fn sign(ts: &str, private_key: &str, public_key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(ts.as_bytes());
    hasher.update(private_key.as_bytes());
    hasher.update(public_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fresh per-request nonce: millisecond timestamp plus a random suffix so two
/// calls in the same millisecond still differ.
#[must_use]
pub fn generate_nonce() -> String {
    use rand::Rng;

    let suffix: u16 = rand::rng().random_range(0..1000);
    format!("{}{:03}", chrono::Utc::now().timestamp_millis(), suffix)
}

#[derive(Clone)]
pub struct MarvelClient {
    client: Client,
    config: MarvelConfig,
}

impl MarvelClient {
    /// Creates a client with its own connection pool and the configured timeout.
    pub fn new(config: MarvelConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_seconds))
            .user_agent("Comicshelf/1.0")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self { client, config })
    }

    /// Creates a client on top of a shared HTTP client.
    #[must_use]
    pub const fn with_shared_client(client: Client, config: MarvelConfig) -> Self {
        Self { client, config }
    }

    /// Builds the signed request URL for `offset`. The configured shift is
    /// applied here and nowhere else.
    pub fn request_url(&self, offset: u32, ts: &str) -> Result<Url, UpstreamError> {
        if !self.config.has_credentials() {
            return Err(UpstreamError::MissingCredentials);
        }

        let mut url = Url::parse(&self.config.base_url)
            .map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;

        let hash = sign(ts, &self.config.private_key, &self.config.public_key);
        let upstream_offset = u64::from(offset) + u64::from(self.config.offset_shift);

        url.query_pairs_mut()
            .append_pair("ts", ts)
            .append_pair("apikey", &self.config.public_key)
            .append_pair("hash", &hash)
            .append_pair("limit", &self.config.page_size.to_string())
            .append_pair("offset", &upstream_offset.to_string());

        Ok(url)
    }
}

#[async_trait]
impl ComicSource for MarvelClient {
    async fn fetch_page(&self, offset: u32) -> Result<ComicPage, UpstreamError> {
        let url = self.request_url(offset, &generate_nonce())?;

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }

        let body = response.text().await?;
        let records = parse_results(&body)?;

        tracing::debug!(offset, count = records.len(), "Fetched comic page");

        Ok(ComicPage::new(offset, records))
    }
}
