use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::ComicRecord;
use crate::services::Favorite;

/// Every error body carries `error`; form failures add per-field messages.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            errors: None,
        }
    }

    pub fn with_fields(message: impl Into<String>, errors: BTreeMap<String, String>) -> Self {
        Self {
            error: message.into(),
            errors: Some(errors),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Identity placed in request extensions by the auth guard.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub comics: Vec<ComicRecord>,
    pub favorites: Vec<Favorite>,
    pub favorite_ids: Vec<i64>,
}
