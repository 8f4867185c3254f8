pub mod sqlite;

use crate::app::Result;
use crate::domain::{Entry, EntryKey, Feed};

pub use sqlite::SqliteStore;

/// Persistent collections of feeds and entries.
///
/// Implementations may be called from many tasks at once; each call is a
/// self-contained request.
pub trait Store {
    // Feed operations

    /// Insert a feed and return its new id, or `None` when a feed with the
    /// same URL already exists.
    fn add_feed(&self, feed: &Feed) -> Result<Option<i64>>;
    fn get_feed(&self, id: i64) -> Result<Option<Feed>>;
    fn find_feeds_by_url(&self, url: &str) -> Result<Vec<Feed>>;
    fn get_all_feeds(&self) -> Result<Vec<Feed>>;
    /// Removes the feed and all of its entries.
    fn delete_feed(&self, id: i64) -> Result<()>;

    // Entry operations
    fn add_entry(&self, entry: &Entry) -> Result<i64>;
    fn find_entries(&self, key: &EntryKey) -> Result<Vec<Entry>>;
    /// Returns the number of removed entries.
    fn remove_entries(&self, key: &EntryKey) -> Result<usize>;
    /// Atomically swap every entry under `key` for `entry`. Returns the
    /// number of removed entries; on error the store is left unchanged.
    fn replace_entries(&self, key: &EntryKey, entry: &Entry) -> Result<usize>;
    fn get_entries_by_feed(&self, feed_id: i64) -> Result<Vec<Entry>>;
    fn get_all_entries(&self) -> Result<Vec<Entry>>;
    fn count_entries(&self, feed_id: i64) -> Result<i64>;
}
