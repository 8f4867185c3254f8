use std::sync::Arc;

use chrono::Utc;

use crate::app::Result;
use crate::domain::{Entry, Feed};
use crate::fetcher::FetchedEntry;
use crate::store::Store;

/// What a single reconcile step did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Inserted,
    AlreadyRecorded,
    /// Duplicates were found and collapsed into one fresh entry.
    Healed { removed: usize },
}

impl Reconciliation {
    /// Whether this entry was not recorded before. Collapsed duplicates
    /// do not count.
    pub fn inserted(self) -> bool {
        matches!(self, Self::Inserted)
    }
}

/// Merges fetched entries into the store, keyed by
/// `(feed id, source url, publish time)`.
pub struct EntryReconciler<S> {
    store: Arc<S>,
}

impl<S: Store> EntryReconciler<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Record `fetched` for `feed` unless it is already recorded.
    ///
    /// An entry without a publish date is stamped with the current time.
    /// Fetching the same entry again is a no-op, and a key that somehow
    /// holds several entries is collapsed back to one.
    pub fn reconcile(&self, feed: &Feed, fetched: FetchedEntry) -> Result<Reconciliation> {
        let published = fetched.published.unwrap_or_else(Utc::now);

        let mut entry = Entry::new(feed.id, fetched.link, published);
        entry.title = fetched.title;
        entry.description = fetched.description;

        let key = entry.key();
        let existing = self.store.find_entries(&key)?;

        match existing.len() {
            0 => {
                entry.id = self.store.add_entry(&entry)?;
                tracing::debug!(feed_id = feed.id, "Inserted entry {}", entry.source_url);
                Ok(Reconciliation::Inserted)
            }
            1 => {
                tracing::debug!(feed_id = feed.id, "Entry already recorded: {}", entry.source_url);
                Ok(Reconciliation::AlreadyRecorded)
            }
            n => {
                tracing::warn!(
                    feed_id = feed.id,
                    duplicates = n,
                    "Collapsing duplicate entries for {}",
                    entry.source_url
                );
                let removed = self.store.replace_entries(&key, &entry)?;
                Ok(Reconciliation::Healed { removed })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::store::SqliteStore;
    use crate::sync::testing::fetched;

    fn setup() -> (Arc<SqliteStore>, EntryReconciler<SqliteStore>, Feed) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let mut feed = Feed::new("http://xkcd.com/rss.xml".into());
        feed.id = store.add_feed(&feed).unwrap().unwrap();
        let reconciler = EntryReconciler::new(store.clone());
        (store, reconciler, feed)
    }

    #[test]
    fn test_new_entry_is_inserted() {
        let (store, reconciler, feed) = setup();
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let outcome = reconciler
            .reconcile(&feed, fetched("http://xkcd.com/1/", Some(date)))
            .unwrap();

        assert_eq!(outcome, Reconciliation::Inserted);
        let entries = store.get_entries_by_feed(feed.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source_url, "http://xkcd.com/1/");
        assert_eq!(entries[0].published_at, date.timestamp_millis());
        assert_eq!(entries[0].title.as_deref(), Some("Title of http://xkcd.com/1/"));
    }

    #[test]
    fn test_reconcile_twice_keeps_one() {
        let (store, reconciler, feed) = setup();
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let entry = fetched("http://xkcd.com/1/", Some(date));

        reconciler.reconcile(&feed, entry.clone()).unwrap();
        let outcome = reconciler.reconcile(&feed, entry).unwrap();

        assert_eq!(outcome, Reconciliation::AlreadyRecorded);
        assert!(!outcome.inserted());
        assert_eq!(store.count_entries(feed.id).unwrap(), 1);
    }

    #[test]
    fn test_duplicates_collapse_to_one() {
        let (store, reconciler, feed) = setup();
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let stale = Entry::new(feed.id, "http://xkcd.com/1/".into(), date);
        for _ in 0..3 {
            store.add_entry(&stale).unwrap();
        }

        let outcome = reconciler
            .reconcile(&feed, fetched("http://xkcd.com/1/", Some(date)))
            .unwrap();

        assert_eq!(outcome, Reconciliation::Healed { removed: 3 });
        assert!(!outcome.inserted());
        let remaining = store.find_entries(&stale.key()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title.as_deref(), Some("Title of http://xkcd.com/1/"));
    }

    #[test]
    fn test_missing_date_stamped_now() {
        let (store, reconciler, feed) = setup();
        let before = Utc::now();

        reconciler
            .reconcile(&feed, fetched("http://xkcd.com/2/", None))
            .unwrap();

        let after = Utc::now();
        let entry = &store.get_entries_by_feed(feed.id).unwrap()[0];
        let published = entry.published().unwrap();
        assert!(published >= before - Duration::milliseconds(1));
        assert!(published <= after + Duration::milliseconds(1));
    }

    #[test]
    fn test_same_link_different_date_is_new_entry() {
        let (store, reconciler, feed) = setup();
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        reconciler
            .reconcile(&feed, fetched("http://xkcd.com/1/", Some(first)))
            .unwrap();
        reconciler
            .reconcile(&feed, fetched("http://xkcd.com/1/", Some(second)))
            .unwrap();

        assert_eq!(store.count_entries(feed.id).unwrap(), 2);
    }

    #[test]
    fn test_key_is_scoped_to_feed() {
        let (store, reconciler, feed) = setup();
        let mut other = Feed::new("http://example.com/rss.xml".into());
        other.id = store.add_feed(&other).unwrap().unwrap();
        let date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let entry = fetched("http://shared.example/post", Some(date));

        reconciler.reconcile(&feed, entry.clone()).unwrap();
        let outcome = reconciler.reconcile(&other, entry).unwrap();

        assert_eq!(outcome, Reconciliation::Inserted);
        assert_eq!(store.count_entries(feed.id).unwrap(), 1);
        assert_eq!(store.count_entries(other.id).unwrap(), 1);
    }
}
