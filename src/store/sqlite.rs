use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{FreshetError, Result};
use crate::domain::{Entry, EntryKey, Feed};
use crate::store::Store;

const FEED_COLUMNS: &str = "id, url, title, description, created_at";
const ENTRY_COLUMNS: &str =
    "id, feed_id, title, description, source_url, published_at, fetched_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| FreshetError::Migration(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            FreshetError::Store(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<Feed> {
        Ok(Feed {
            id: row.get(0)?,
            url: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            created_at: row
                .get::<_, String>(4)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
        Ok(Entry {
            id: row.get(0)?,
            feed_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            source_url: row.get(4)?,
            published_at: row.get(5)?,
            fetched_at: row
                .get::<_, String>(6)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }
}

impl Store for SqliteStore {
    fn add_feed(&self, feed: &Feed) -> Result<Option<i64>> {
        let conn = self.lock()?;

        let inserted = conn.execute(
            "INSERT INTO feeds (url, title, description, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(url) DO NOTHING",
            params![
                feed.url,
                feed.title,
                feed.description,
                feed.created_at.to_rfc3339()
            ],
        )?;

        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    fn get_feed(&self, id: i64) -> Result<Option<Feed>> {
        let conn = self.lock()?;

        let feed = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?1"),
                params![id],
                Self::feed_from_row,
            )
            .optional()?;

        Ok(feed)
    }

    fn find_feeds_by_url(&self, url: &str) -> Result<Vec<Feed>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?1 ORDER BY id"
        ))?;
        let feeds = stmt
            .query_map(params![url], Self::feed_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    fn get_all_feeds(&self) -> Result<Vec<Feed>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds ORDER BY title, url"
        ))?;
        let feeds = stmt
            .query_map([], Self::feed_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(feeds)
    }

    fn delete_feed(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM feeds WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn add_entry(&self, entry: &Entry) -> Result<i64> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT INTO entries (feed_id, title, description, source_url, published_at, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.feed_id,
                entry.title,
                entry.description,
                entry.source_url,
                entry.published_at,
                entry.fetched_at.to_rfc3339()
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn find_entries(&self, key: &EntryKey) -> Result<Vec<Entry>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries
             WHERE feed_id = ?1 AND source_url = ?2 AND published_at = ?3
             ORDER BY id"
        ))?;
        let entries = stmt
            .query_map(
                params![key.feed_id, key.source_url, key.published_at],
                Self::entry_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn remove_entries(&self, key: &EntryKey) -> Result<usize> {
        let conn = self.lock()?;

        let removed = conn.execute(
            "DELETE FROM entries WHERE feed_id = ?1 AND source_url = ?2 AND published_at = ?3",
            params![key.feed_id, key.source_url, key.published_at],
        )?;

        Ok(removed)
    }

    fn replace_entries(&self, key: &EntryKey, entry: &Entry) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM entries WHERE feed_id = ?1 AND source_url = ?2 AND published_at = ?3",
            params![key.feed_id, key.source_url, key.published_at],
        )?;
        tx.execute(
            "INSERT INTO entries (feed_id, title, description, source_url, published_at, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.feed_id,
                entry.title,
                entry.description,
                entry.source_url,
                entry.published_at,
                entry.fetched_at.to_rfc3339()
            ],
        )?;

        tx.commit()?;
        Ok(removed)
    }

    fn get_entries_by_feed(&self, feed_id: i64) -> Result<Vec<Entry>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE feed_id = ?1 ORDER BY published_at DESC, id"
        ))?;
        let entries = stmt
            .query_map(params![feed_id], Self::entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn get_all_entries(&self) -> Result<Vec<Entry>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY published_at DESC, id"
        ))?;
        let entries = stmt
            .query_map([], Self::entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn count_entries(&self, feed_id: i64) -> Result<i64> {
        let conn = self.lock()?;

        let count = conn.query_row(
            "SELECT COUNT(*) FROM entries WHERE feed_id = ?1",
            params![feed_id],
            |row| row.get(0),
        )?;

        Ok(count)
    }
}
