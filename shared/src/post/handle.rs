use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MediaItem, Visibility};

/// Create a new post.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostDescriptor {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub visibility: Visibility,
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

/// Partial post edit; absent fields keep their value, present empty
/// strings clear the field.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EditPostDescriptor {
    pub title: Option<String>,
    pub text: Option<String>,
    pub tags: Option<Vec<String>>,
    pub visibility: Option<Visibility>,
    pub media: Option<Vec<MediaItem>>,
}

/// Filters for the list/feed read. Zero `page`/`page_size` fall back
/// to the defaults (first page, ten items).
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PostQuery {
    /// Keyword matched against title, text and tags.
    pub q: Option<String>,
    pub tag: Option<String>,
    pub only_mine: bool,
    pub only_friends_feed: bool,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub date_to: Option<DateTime<Utc>>,
    pub page: usize,
    pub page_size: usize,
}
