pub mod url;

use chrono::Utc;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{FreshetError, Result};
use crate::fetcher::{FeedMeta, FetchRecord, FetchedEntry};

/// Turns a raw RSS/Atom/JSON Feed document into fetch records: one
/// metadata record first, then one record per entry in document order.
#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, feed_url: &str, body: &[u8]) -> Result<Vec<FetchRecord>> {
        let feed = parser::parse(body).map_err(|e| FreshetError::transient(feed_url, e))?;

        let meta = FeedMeta {
            title: feed.title.map(|t| decode_html_entities(&t.content).to_string()),
            description: feed
                .description
                .map(|d| decode_html_entities(&d.content).to_string()),
        };

        let mut records = Vec::with_capacity(feed.entries.len() + 1);
        records.push(FetchRecord::Metadata(meta));

        for entry in feed.entries {
            // Entries without a link fall back to their id so they still get a stable key.
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_else(|| entry.id.clone());

            let description = entry
                .summary
                .map(|s| decode_html_entities(&s.content).to_string())
                .or_else(|| {
                    entry
                        .content
                        .and_then(|c| c.body)
                        .map(|b| decode_html_entities(&b).to_string())
                });

            records.push(FetchRecord::Entry(FetchedEntry {
                title: entry.title.map(|t| decode_html_entities(&t.content).to_string()),
                description,
                link,
                published: entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.with_timezone(&Utc)),
            }));
        }

        Ok(records)
    }
}
