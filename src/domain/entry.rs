use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub feed_id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub source_url: String,
    /// Milliseconds since the Unix epoch.
    pub published_at: i64,
    pub fetched_at: DateTime<Utc>,
}

/// Identity of an entry for reconciliation: at most one stored [`Entry`]
/// may exist per key once a reconcile step for that key has finished.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    pub feed_id: i64,
    pub source_url: String,
    pub published_at: i64,
}

impl Entry {
    /// Unsaved entry; the store assigns `id` on insert.
    pub fn new(feed_id: i64, source_url: String, published_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            feed_id,
            title: None,
            description: None,
            source_url,
            published_at: published_at.timestamp_millis(),
            fetched_at: Utc::now(),
        }
    }

    pub fn key(&self) -> EntryKey {
        EntryKey {
            feed_id: self.feed_id,
            source_url: self.source_url.clone(),
            published_at: self.published_at,
        }
    }

    pub fn published(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.published_at).single()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(Untitled)")
    }
}
