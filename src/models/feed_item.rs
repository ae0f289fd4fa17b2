//! Latest-items feed model.

use serde::{Deserialize, Serialize};

/// One `<item>` of the publications RSS feed, optionally enriched from its landing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    /// RFC 3339 when the feed date could be parsed, the raw feed text otherwise
    pub published: String,
    pub id: String,
    pub summary: String,
    pub link: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub pdf_link: Option<String>,
}
