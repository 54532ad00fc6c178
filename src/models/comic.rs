use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub path: String,
    pub extension: String,
}

impl Thumbnail {
    /// Image URL for the given Marvel rendition (e.g. `portrait_uncanny`).
    #[must_use]
    pub fn variant_url(&self, variant: &str) -> String {
        format!("{}/{}.{}", self.path, variant, self.extension)
    }
}

/// A single comic as shown in the catalog. Serialized with the field names
/// the browser client reads (`pageCount`, nested `thumbnail`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComicRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(rename = "pageCount")]
    pub page_count: i32,
    /// First listed price, 0 when the issue has none.
    pub price: f64,
    pub thumbnail: Thumbnail,
}

/// One upstream page of comics. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComicPage {
    pub offset: u32,
    pub records: Vec<ComicRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl ComicPage {
    #[must_use]
    pub fn new(offset: u32, records: Vec<ComicRecord>) -> Self {
        Self {
            offset,
            records,
            fetched_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reduced comic shape used by the landing-page gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryComic {
    pub id: i64,
    pub title: String,
    pub thumbnail: String,
}

impl From<&ComicRecord> for GalleryComic {
    fn from(comic: &ComicRecord) -> Self {
        Self {
            id: comic.id,
            title: comic.title.clone(),
            thumbnail: comic.thumbnail.variant_url("portrait_uncanny"),
        }
    }
}
