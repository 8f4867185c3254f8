pub mod http_fetcher;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// An entry as the remote source describes it, before reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedEntry {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchRecord {
    Metadata(FeedMeta),
    Entry(FetchedEntry),
}

/// Lazy sequence of records for one fetch. Ends at end of document or at the
/// first `Err`. Only the first `Metadata` record is meaningful.
pub type FetchStream = BoxStream<'static, Result<FetchRecord>>;

#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchStream>;
}
