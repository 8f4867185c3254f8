use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered feed. `url` is always the canonical form produced by
/// [`normalize_url`](crate::normalizer::url::normalize_url).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Feed {
    /// Unsaved feed; the store assigns `id` on insert.
    pub fn new(url: String) -> Self {
        Self {
            id: 0,
            url,
            title: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}
