//! Stale-while-revalidate record cache.
//!
//! A load served from a fresh cache entry hands the cached records to the
//! view right away and starts one background refetch. An expired entry is
//! never served; the load fetches in the foreground instead. The refetch swaps the view only when
//! the id sequence changed; otherwise it just re-stamps the cache, leaving
//! selection and expansion alone.

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::source::RecordSource;
use crate::view::PanelView;
use chatforest_core::{ChatRecord, RecordFilter};
use chatforest_runtime_config::PanelConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing cached for the current owner.
    Empty,
    /// Cached and younger than the TTL.
    Fresh,
    /// Cached but older than the TTL.
    Stale,
    /// Cached, with a background refetch in flight.
    Refreshing,
}

/// Where a load got its records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Cache,
    Network,
}

/// What a finished background refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Same id sequence; only the cache timestamp moved.
    Unchanged,
    /// New id sequence swapped into cache and view.
    Replaced,
    /// The cache was invalidated, rewritten in the foreground or switched
    /// to another owner while fetching; result dropped.
    Discarded,
    /// Fetch failed; logged and ignored.
    Failed,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    owner: String,
    records: Vec<ChatRecord>,
    written_at_ms: u64,
}

impl CacheEntry {
    fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.written_at_ms)
    }
}

#[derive(Debug, Default)]
struct Shared {
    entry: Option<CacheEntry>,
    /// Bumped by every invalidation and foreground write. A background
    /// refresh started under an older generation is dropped.
    generation: u64,
    view: PanelView,
}

impl Shared {
    fn entry_for(&self, owner: &str) -> Option<&CacheEntry> {
        self.entry.as_ref().filter(|e| e.owner == owner)
    }

    fn invalidate(&mut self) {
        self.entry = None;
        self.generation += 1;
    }

    fn store(&mut self, owner: String, records: Vec<ChatRecord>, now_ms: u64) {
        self.entry = Some(CacheEntry {
            owner,
            records,
            written_at_ms: now_ms,
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the cache entry and the view it feeds. One instance per panel
/// context; dropping it drops the cache.
pub struct CacheManager<S: RecordSource> {
    source: Arc<S>,
    clock: Arc<dyn Clock>,
    config: PanelConfig,
    shared: Arc<Mutex<Shared>>,
    refreshing: Arc<AtomicBool>,
    refresh_task: Mutex<Option<JoinHandle<RefreshOutcome>>>,
}

impl<S: RecordSource> CacheManager<S> {
    pub fn new(source: S, config: PanelConfig) -> Self {
        Self::with_clock(source, config, Arc::new(SystemClock))
    }

    pub fn with_clock(source: S, config: PanelConfig, clock: Arc<dyn Clock>) -> Self {
        let view = PanelView::new(
            config.sort.to_sort_config(),
            RecordFilter::new(None, config.display.show_checkpoints),
        );
        Self {
            source: Arc::new(source),
            clock,
            config,
            shared: Arc::new(Mutex::new(Shared {
                entry: None,
                generation: 0,
                view,
            })),
            refreshing: Arc::new(AtomicBool::new(false)),
            refresh_task: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn cache_state(&self) -> CacheState {
        let owner = self.source.owner();
        let shared = lock(&self.shared);
        let Some(entry) = shared.entry_for(&owner) else {
            return CacheState::Empty;
        };
        if self.refreshing.load(Ordering::SeqCst) {
            return CacheState::Refreshing;
        }
        if entry.age_ms(self.clock.now_ms()) > self.config.cache.ttl_ms {
            CacheState::Stale
        } else {
            CacheState::Fresh
        }
    }

    /// Read access to the displayed view.
    pub fn with_view<R>(&self, f: impl FnOnce(&PanelView) -> R) -> R {
        f(&lock(&self.shared).view)
    }

    /// Mutable access for selection/expansion and sort/filter changes.
    pub fn with_view_mut<R>(&self, f: impl FnOnce(&mut PanelView) -> R) -> R {
        f(&mut lock(&self.shared).view)
    }

    /// Load records into the view.
    ///
    /// Without `force`, a cache entry for the current owner that is still
    /// within the TTL is served immediately and a background refresh is
    /// scheduled. Otherwise (forced, empty, expired or another owner's
    /// entry) the source is fetched in the foreground; a failure is recorded
    /// on the view and returned, leaving view and cache untouched.
    pub async fn load_chats(&self, force: bool) -> Result<LoadSource> {
        let owner = self.source.owner();

        if !force && self.serve_cached(&owner) {
            self.spawn_refresh();
            return Ok(LoadSource::Cache);
        }

        match self.source.fetch(self.config.display.preview_length).await {
            Ok(records) => {
                info!(owner = %owner, records = records.len(), "loaded sessions");
                let now = self.clock.now_ms();
                let mut shared = lock(&self.shared);
                shared.store(owner, records.clone(), now);
                shared.generation += 1;
                shared.view.replace_records(records);
                shared.view.set_error(None);
                Ok(LoadSource::Network)
            }
            Err(e) => {
                warn!(owner = %owner, error = %e, "failed to load sessions");
                lock(&self.shared).view.set_error(Some(e.to_string()));
                Err(e)
            }
        }
    }

    /// Push fresh cached records to the view. A view already showing the
    /// same id sequence keeps its nodes. Returns false when there is no
    /// entry for `owner` or it outlived the TTL.
    fn serve_cached(&self, owner: &str) -> bool {
        let now = self.clock.now_ms();
        let ttl_ms = self.config.cache.ttl_ms;
        let mut shared = lock(&self.shared);
        let Some(entry) = shared.entry_for(owner) else {
            return false;
        };
        if entry.age_ms(now) > ttl_ms {
            debug!(owner, age_ms = entry.age_ms(now), "cached sessions expired");
            return false;
        }
        let records = entry.records.clone();
        if !shared.view.shows_same_ids(&records) {
            shared.view.replace_records(records);
        }
        shared.view.set_error(None);
        debug!(owner, "served sessions from cache");
        true
    }

    /// Start a background refresh unless one is already running.
    /// Returns whether a new refresh was started.
    fn spawn_refresh(&self) -> bool {
        if self.refreshing.swap(true, Ordering::SeqCst) {
            debug!("background refresh already in flight");
            return false;
        }

        let source = Arc::clone(&self.source);
        let shared = Arc::clone(&self.shared);
        let refreshing = Arc::clone(&self.refreshing);
        let clock = Arc::clone(&self.clock);
        let preview_length = self.config.display.preview_length;
        let generation = lock(&self.shared).generation;

        let handle = tokio::spawn(async move {
            let owner = source.owner();
            let outcome = match source.fetch(preview_length).await {
                Ok(records) => {
                    apply_refresh(&shared, &owner, generation, records, clock.now_ms())
                }
                Err(e) => {
                    warn!(owner = %owner, error = %e, "background refresh failed");
                    RefreshOutcome::Failed
                }
            };
            refreshing.store(false, Ordering::SeqCst);
            outcome
        });

        *lock(&self.refresh_task) = Some(handle);
        true
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    /// Wait for the latest background refresh, if any, and report what it did.
    pub async fn wait_for_refresh(&self) -> Option<RefreshOutcome> {
        let handle = lock(&self.refresh_task).take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                warn!(error = %e, "background refresh task did not complete");
                None
            }
        }
    }

    /// Drop the cache so the next load fetches in the foreground.
    pub fn invalidate(&self) {
        lock(&self.shared).invalidate();
        debug!("session cache invalidated");
    }

    /// Let an in-flight refresh finish before the manager goes away.
    pub async fn shutdown(&self) {
        self.wait_for_refresh().await;
    }
}

/// Decide and apply a refresh result under one lock.
fn apply_refresh(
    shared: &Mutex<Shared>,
    owner: &str,
    generation: u64,
    records: Vec<ChatRecord>,
    now_ms: u64,
) -> RefreshOutcome {
    let mut shared = lock(shared);

    // Anything that touched the cache while fetching wins over this result.
    if shared.generation != generation || shared.entry_for(owner).is_none() {
        debug!(owner, "dropping refresh started before the cache changed");
        return RefreshOutcome::Discarded;
    }

    if shared.view.shows_same_ids(&records) {
        if let Some(entry) = shared.entry.as_mut() {
            entry.written_at_ms = now_ms;
        }
        debug!(owner, "background refresh found no changes");
        return RefreshOutcome::Unchanged;
    }

    info!(owner, records = records.len(), "background refresh replaced sessions");
    shared.store(owner.to_string(), records.clone(), now_ms);
    shared.view.replace_records(records);
    RefreshOutcome::Replaced
}
