// Top-list cache - one shared, TTL-bounded snapshot of every ranking
//
// States: Fresh (snapshot younger than the TTL and no invalidation since the
// corpus read it came from) and Stale. `invalidate()` bumps a generation
// counter, so it never waits on a refresh that is in flight; a snapshot built
// from a corpus read that predates the bump is already stale when stored.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::TopListConfig;
use crate::error::AppError;
use crate::infrastructure::monitoring::{CacheMetrics, CacheMetricsSnapshot};
use crate::infrastructure::corpus::CorpusSnapshot;
use crate::infrastructure::traits::CorpusSource;
use crate::ranking::{RankingEngine, TopListSnapshot};

/// Builds the lists from a corpus read. Runs on a blocking thread.
pub type Ranker = Arc<dyn Fn(&CorpusSnapshot) -> TopListSnapshot + Send + Sync>;

#[derive(Debug, Clone)]
struct CachedEntry {
    snapshot: Arc<TopListSnapshot>,
    refreshed_at: Instant,
    generation: u64,
}

/// A refresh that did not produce a new snapshot.
///
/// `previous` is the last good snapshot, if there ever was one; it is still
/// cached and will be retried on the next `get()`.
#[derive(Debug)]
pub struct RefreshError {
    pub cause: AppError,
    pub previous: Option<Arc<TopListSnapshot>>,
}

impl fmt::Display for RefreshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.previous {
            Some(_) => write!(f, "{} (serving previous snapshot)", self.cause),
            None => write!(f, "{} (no snapshot available)", self.cause),
        }
    }
}

impl std::error::Error for RefreshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl From<RefreshError> for AppError {
    fn from(err: RefreshError) -> Self {
        AppError::RefreshFailed(err.cause.to_string())
    }
}

pub struct TopListCache {
    source: Arc<dyn CorpusSource>,
    ranker: Ranker,
    ttl: Duration,
    current: RwLock<Option<CachedEntry>>,
    /// Held for the whole refresh so only one recomputation runs at a time
    refresh_gate: Mutex<()>,
    generation: AtomicU64,
    metrics: CacheMetrics,
}

impl fmt::Debug for TopListCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopListCache")
            .field("ttl", &self.ttl)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl TopListCache {
    pub fn new(source: Arc<dyn CorpusSource>, config: TopListConfig) -> Self {
        let ttl = config.ttl();
        let engine = RankingEngine::new(config);
        let ranker: Ranker = Arc::new(move |corpus: &CorpusSnapshot| engine.compute(corpus));
        Self::with_ranker(source, ttl, ranker)
    }

    /// Cache over `source` that builds its snapshots with `ranker`.
    pub fn with_ranker(source: Arc<dyn CorpusSource>, ttl: Duration, ranker: Ranker) -> Self {
        Self {
            source,
            ranker,
            ttl,
            current: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            generation: AtomicU64::new(0),
            metrics: CacheMetrics::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached snapshot if fresh, otherwise recompute it.
    ///
    /// Concurrent callers that find the cache stale queue on the refresh
    /// gate; whoever gets there first recomputes and the rest pick up its
    /// result instead of computing again.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Arc<TopListSnapshot>, RefreshError> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            self.metrics.record_hit();
            debug!("Top-list cache hit");
            return Ok(snapshot);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(snapshot) = self.fresh_snapshot().await {
            self.metrics.record_hit();
            debug!("Top-list cache hit after waiting for refresh");
            return Ok(snapshot);
        }

        self.metrics.record_miss();
        self.refresh().await
    }

    /// Mark the cached snapshot stale. Call after every corpus mutation,
    /// once the mutation is visible to `CorpusSource::snapshot`.
    pub fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.metrics.record_invalidation();
        debug!(generation, "Top-list cache invalidated");
    }

    pub async fn is_fresh(&self) -> bool {
        self.fresh_snapshot().await.is_some()
    }

    /// The last stored snapshot, fresh or not, without triggering a refresh.
    pub async fn peek(&self) -> Option<Arc<TopListSnapshot>> {
        self.current.read().await.as_ref().map(|e| Arc::clone(&e.snapshot))
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn fresh_snapshot(&self) -> Option<Arc<TopListSnapshot>> {
        let current = self.current.read().await;
        let entry = current.as_ref()?;
        let generation = self.generation.load(Ordering::SeqCst);
        if entry.generation == generation && entry.refreshed_at.elapsed() < self.ttl {
            Some(Arc::clone(&entry.snapshot))
        } else {
            None
        }
    }

    /// Must be called with `refresh_gate` held.
    async fn refresh(&self) -> Result<Arc<TopListSnapshot>, RefreshError> {
        // Read the generation before the corpus so that any invalidation
        // issued after this point leaves the new snapshot stale.
        let generation = self.generation.load(Ordering::SeqCst);
        let started = Instant::now();

        let corpus = match self.source.snapshot().await {
            Ok(corpus) => corpus,
            Err(err) => return Err(self.refresh_failed(err).await),
        };

        let ranker = Arc::clone(&self.ranker);
        let computed = tokio::task::spawn_blocking(move || ranker(&corpus)).await;
        let snapshot = match computed {
            Ok(snapshot) => Arc::new(snapshot),
            Err(join_err) => {
                let cause = AppError::RefreshFailed(format!("ranking task failed: {}", join_err));
                return Err(self.refresh_failed(cause).await);
            }
        };

        *self.current.write().await = Some(CachedEntry {
            snapshot: Arc::clone(&snapshot),
            refreshed_at: Instant::now(),
            generation,
        });
        self.metrics.record_refresh();
        info!(
            generation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            warnings = snapshot.warnings.len(),
            "Top lists refreshed"
        );
        Ok(snapshot)
    }

    async fn refresh_failed(&self, cause: AppError) -> RefreshError {
        self.metrics.record_refresh_failure();
        let previous = self.peek().await;
        warn!(
            has_previous = previous.is_some(),
            "Top-list refresh failed: {}", cause
        );
        RefreshError { cause, previous }
    }
}
