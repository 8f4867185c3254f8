use std::sync::Arc;

use futures::StreamExt;

use crate::app::{FreshetError, Result};
use crate::domain::Feed;
use crate::fetcher::{FeedMeta, FetchRecord, Fetcher};
use crate::normalizer::url::normalize_url;
use crate::store::Store;

/// Maps each canonical feed URL to exactly one stored [`Feed`].
pub struct FeedRegistrar<S> {
    store: Arc<S>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
}

impl<S: Store> FeedRegistrar<S> {
    pub fn new(store: Arc<S>, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self { store, fetcher }
    }

    /// Return the feed registered for `url`, fetching and creating it on
    /// first sight. Repeat calls for the same canonical URL never touch the
    /// network.
    pub async fn register_or_get(&self, url: &str) -> Result<Feed> {
        let url = normalize_url(url);

        if let Some(feed) = self.lookup(&url)? {
            tracing::debug!("Feed already registered: {}", url);
            return Ok(feed);
        }

        tracing::info!("Creating feed: {}", url);
        let meta = self.fetch_metadata(&url).await?;

        let mut feed = Feed::new(url.clone());
        feed.title = meta.title;
        feed.description = meta.description;

        match self.store.add_feed(&feed)? {
            Some(id) => {
                feed.id = id;
                tracing::info!(feed_id = id, "Registered feed {}", feed.display_title());
                Ok(feed)
            }
            // Another registration for the same URL committed first.
            None => self.lookup(&url)?.ok_or_else(|| {
                FreshetError::InvariantViolation(format!(
                    "feed insert for {} conflicted but no stored feed matches",
                    url
                ))
            }),
        }
    }

    /// Look up an already-canonical URL without fetching.
    pub fn lookup(&self, canonical_url: &str) -> Result<Option<Feed>> {
        let mut feeds = self.store.find_feeds_by_url(canonical_url)?;

        match feeds.len() {
            0 => Ok(None),
            1 => Ok(feeds.pop()),
            n => {
                tracing::error!(count = n, "Duplicate feeds stored for {}", canonical_url);
                Err(FreshetError::InvariantViolation(format!(
                    "{} feeds stored for {}",
                    n, canonical_url
                )))
            }
        }
    }

    async fn fetch_metadata(&self, url: &str) -> Result<FeedMeta> {
        let mut records = self.fetcher.fetch(url).await?;

        while let Some(record) = records.next().await {
            if let FetchRecord::Metadata(meta) = record? {
                return Ok(meta);
            }
        }

        Err(FreshetError::transient(url, "feed ended without metadata"))
    }
}
