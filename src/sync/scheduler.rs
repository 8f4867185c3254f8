use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, MissedTickBehavior};

use crate::app::{FreshetError, Result};
use crate::config::DEFAULT_WORKERS;
use crate::domain::Feed;
use crate::fetcher::{FetchRecord, Fetcher};
use crate::store::Store;
use crate::sync::{EntryReconciler, FeedRegistrar, Reconciliation};

/// Receives the error of every feed that failed during a pass.
pub type FailureHandler = Arc<dyn Fn(&Feed, &FreshetError) + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Feeds known when the pass started.
    pub feeds: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub inserted: usize,
    /// Keys whose duplicate rows were collapsed back to one.
    pub healed: usize,
}

/// What reconciling one feed changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FeedChanges {
    inserted: usize,
    healed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// Another pass was running; this trigger was dropped.
    Skipped,
    Completed(PassReport),
}

/// Runs reconciliation for every known feed, at most one pass at a time.
pub struct UpdateScheduler<S> {
    store: Arc<S>,
    worker: Arc<FeedWorker<S>>,
    semaphore: Arc<Semaphore>,
    on_failure: FailureHandler,
    running: AtomicBool,
}

/// Per-feed work shared by every task of a pass.
struct FeedWorker<S> {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    registrar: FeedRegistrar<S>,
    reconciler: EntryReconciler<S>,
}

/// Holds the running flag for the duration of a pass.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: Store + Send + Sync + 'static> UpdateScheduler<S> {
    pub fn new(store: Arc<S>, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self::with_workers(store, fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(store: Arc<S>, fetcher: Arc<dyn Fetcher + Send + Sync>, workers: usize) -> Self {
        let worker = FeedWorker {
            registrar: FeedRegistrar::new(store.clone(), fetcher.clone()),
            reconciler: EntryReconciler::new(store.clone()),
            fetcher,
        };

        Self {
            store,
            worker: Arc::new(worker),
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            on_failure: Arc::new(|feed: &Feed, err: &FreshetError| {
                tracing::warn!(feed_id = feed.id, "Error updating {}: {}", feed.display_title(), err);
            }),
            running: AtomicBool::new(false),
        }
    }

    pub fn with_failure_handler(mut self, handler: FailureHandler) -> Self {
        self.on_failure = handler;
        self
    }

    pub fn registrar(&self) -> &FeedRegistrar<S> {
        &self.worker.registrar
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Register `url` and merge its current entries right away.
    pub async fn subscribe(&self, url: &str) -> Result<(Feed, usize)> {
        let feed = self.worker.registrar.register_or_get(url).await?;
        let changes = self.worker.sync_feed(&feed).await?;
        Ok((feed, changes.inserted))
    }

    /// Fetch one registered feed and reconcile its entries. Returns the
    /// number of entries that were inserted.
    pub async fn sync_feed(&self, feed: &Feed) -> Result<usize> {
        Ok(self.worker.sync_feed(feed).await?.inserted)
    }

    /// Run one pass over every feed known right now.
    ///
    /// Returns [`PassOutcome::Skipped`] immediately if a pass is already in
    /// progress. Per-feed failures go to the failure handler and never stop
    /// the other feeds; only failing to list the feeds is returned as `Err`.
    ///
    /// Per-feed tasks belong to the pass: dropping this future aborts them
    /// before the running flag is released.
    pub async fn run_once(&self) -> Result<PassOutcome> {
        let Some(_guard) = PassGuard::acquire(&self.running) else {
            tracing::warn!("Update already running; skipping");
            return Ok(PassOutcome::Skipped);
        };

        let feeds = self.store.get_all_feeds()?;
        if feeds.is_empty() {
            tracing::info!("No feeds to update");
            return Ok(PassOutcome::Completed(PassReport::default()));
        }

        tracing::info!("Starting update of {} feeds", feeds.len());
        let start = std::time::Instant::now();

        // Declared after the guard so the tasks are aborted before it drops.
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::with_capacity(feeds.len());
        for feed in feeds {
            let worker = self.worker.clone();
            let semaphore = self.semaphore.clone();
            let task_feed = feed.clone();

            let handle = tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| FreshetError::Task(e.to_string()))?;
                worker.sync_feed(&task_feed).await
            });

            pending.insert(handle.id(), feed);
        }

        let mut report = PassReport {
            feeds: pending.len(),
            ..PassReport::default()
        };

        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(e) => (e.id(), Err(FreshetError::Task(e.to_string()))),
            };
            let Some(feed) = pending.remove(&id) else {
                continue;
            };

            match result {
                Ok(changes) => {
                    report.succeeded += 1;
                    report.inserted += changes.inserted;
                    report.healed += changes.healed;
                    if changes.inserted > 0 {
                        tracing::info!("{} new entries from {}", changes.inserted, feed.display_title());
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    (self.on_failure)(&feed, &e);
                }
            }
        }

        tracing::info!(
            "Update complete: {} new entries, {} errors ({:.1}s)",
            report.inserted,
            report.failed,
            start.elapsed().as_secs_f64()
        );
        if report.healed > 0 {
            tracing::warn!("Collapsed duplicate entries for {} keys", report.healed);
        }

        Ok(PassOutcome::Completed(report))
    }

    /// Fire [`run_once`](Self::run_once) every `period`, starting one period
    /// from now. Ticks do not wait for the previous pass; overlapping
    /// triggers are dropped by the running guard.
    pub fn start(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);

        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer.tick().await; // Skip the first immediate tick

            loop {
                timer.tick().await;

                let scheduler = scheduler.clone();
                tokio::spawn(async move {
                    if let Err(e) = scheduler.run_once().await {
                        tracing::error!("Scheduled update failed: {}", e);
                    }
                });
            }
        })
    }
}

impl<S: Store> FeedWorker<S> {
    async fn sync_feed(&self, feed: &Feed) -> Result<FeedChanges> {
        let feed = self
            .registrar
            .lookup(&feed.url)?
            .ok_or_else(|| FreshetError::FeedNotFound(feed.url.clone()))?;

        let mut records = self.fetcher.fetch(&feed.url).await?;
        let mut changes = FeedChanges::default();

        while let Some(record) = records.next().await {
            if let FetchRecord::Entry(entry) = record? {
                match self.reconciler.reconcile(&feed, entry)? {
                    Reconciliation::Inserted => changes.inserted += 1,
                    Reconciliation::Healed { .. } => changes.healed += 1,
                    Reconciliation::AlreadyRecorded => {}
                }
            }
        }

        Ok(changes)
    }
}
