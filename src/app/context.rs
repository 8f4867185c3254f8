use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{FreshetError, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::store::sqlite::SqliteStore;
use crate::sync::UpdateScheduler;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub scheduler: Arc<UpdateScheduler<SqliteStore>>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match config.store.path.clone() {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetcher)?);
        Ok(Self::with_parts(config, store, fetcher))
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetcher)?);
        Ok(Self::with_parts(config, store, fetcher))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Self {
        let scheduler = Arc::new(UpdateScheduler::with_workers(
            store.clone(),
            fetcher.clone(),
            config.sync.workers,
        ));

        Self {
            config,
            store,
            fetcher,
            scheduler,
        }
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| FreshetError::Config("Could not find data directory".into()))?;
        let freshet_dir = data_dir.join("freshet");
        std::fs::create_dir_all(&freshet_dir)?;
        Ok(freshet_dir.join("freshet.db"))
    }
}
