//! # Freshet
//!
//! A feed synchronization engine: registers RSS/Atom feeds once per
//! canonical URL and periodically merges their new entries into a local
//! store without duplicating what is already there.
//!
//! ## Architecture
//!
//! ```text
//! UpdateScheduler → FeedRegistrar → Fetcher → EntryReconciler → Store
//! ```
//!
//! - [`normalizer`]: canonical URLs and feed-document parsing
//! - [`fetcher`]: HTTP client yielding metadata and entry records
//! - [`store`]: SQLite persistence layer
//! - [`sync`]: registration, reconciliation and the update pass
//!
//! ## Quick Start
//!
//! ```bash
//! # Register a feed and fetch its entries
//! freshet add xkcd.com/rss.xml
//!
//! # Run a single update pass
//! freshet update
//!
//! # Keep updating every 100 seconds
//! freshet daemon --interval 100s
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, fetcher, scheduler.
pub mod app;

/// Configuration management.
///
/// Loads from `~/.config/freshet/config.toml`: update interval, worker
/// count, HTTP timeout, database path.
pub mod config;

/// Foreground daemon that runs the scheduler until a shutdown signal.
pub mod daemon;

/// Command-line interface using clap.
///
/// - `add <url>` - Register a feed and fetch its entries
/// - `remove <url>` - Remove a feed
/// - `update` - Run one update pass
/// - `list [--entries] [--json]` - List feeds or entries
/// - `daemon` - Update on an interval
pub mod cli;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): a registered feed
/// - [`Entry`](domain::Entry): a stored entry of a feed
pub mod domain;

/// Feed fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait yielding a stream of records
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// URL canonicalization and feed parsing.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into [`FetchRecord`](fetcher::FetchRecord)s.
pub mod normalizer;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Feed synchronization engine.
///
/// - [`FeedRegistrar`](sync::FeedRegistrar): one stored feed per canonical URL
/// - [`EntryReconciler`](sync::EntryReconciler): duplicate-free entry merge
/// - [`UpdateScheduler`](sync::UpdateScheduler): single-flight update passes
pub mod sync;
