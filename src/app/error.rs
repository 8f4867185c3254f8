use thiserror::Error;

#[derive(Error, Debug)]
pub enum FreshetError {
    /// The remote source could not be read or yielded nothing usable.
    /// Safe to retry on a later pass.
    #[error("Fetch failed for {url}: {reason}")]
    TransientFetch { url: String, reason: String },

    #[error("Database error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Stored state breaks a uniqueness rule. Never retried.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task failed: {0}")]
    Task(String),
}

impl FreshetError {
    pub fn transient(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::TransientFetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether a later scheduled pass may succeed where this one failed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientFetch { .. } | Self::Task(_))
    }
}

pub type Result<T> = std::result::Result<T, FreshetError>;
