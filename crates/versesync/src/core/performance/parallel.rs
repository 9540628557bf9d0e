//! Parallel Chapter Processing
//!
//! Runs independent per-chapter work on a bounded pool of blocking workers.
//! Results come back in submission order together with an explicit
//! [`PoolStats`] accumulator.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::core::{CoreError, CoreResult};

/// Configuration for parallel execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelConfig {
    /// Maximum chapters processed at once
    pub max_concurrent: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            max_concurrent: num_cpus::get().max(1),
        }
    }
}

impl ParallelConfig {
    /// Creates config with a concurrency limit (0 = one per CPU)
    pub fn with_max_concurrent(max_concurrent: usize) -> Self {
        if max_concurrent == 0 {
            Self::default()
        } else {
            Self { max_concurrent }
        }
    }

    /// Processes one chapter at a time
    pub fn sequential() -> Self {
        Self { max_concurrent: 1 }
    }
}

/// Pool run statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    /// Items handed to a worker
    pub submitted: usize,
    /// Items that finished with a result
    pub completed: usize,
    /// Items that finished with an error
    pub failed: usize,
    /// Items never scheduled because the run was cancelled
    pub skipped: usize,
    /// Peak concurrent workers
    pub peak_concurrent: usize,
}

impl PoolStats {
    /// Total items seen by the run
    pub fn total(&self) -> usize {
        self.submitted + self.skipped
    }
}

/// Bounded worker pool for chapter work
///
/// Clones share the concurrency limit and the cancellation flag.
#[derive(Debug, Clone)]
pub struct ChapterPool {
    config: ParallelConfig,
    semaphore: Arc<Semaphore>,
    cancelled: Arc<AtomicBool>,
}

impl Default for ChapterPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ChapterPool {
    /// Creates a pool with one worker per CPU
    pub fn new() -> Self {
        Self::with_config(ParallelConfig::default())
    }

    /// Creates with custom config
    pub fn with_config(config: ParallelConfig) -> Self {
        let config = ParallelConfig::with_max_concurrent(config.max_concurrent);
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            cancelled: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Stops scheduling further items; running items finish normally
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Clears a previous cancellation
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Runs `work` over every item
    ///
    /// Returns one result per item in input order. Items not scheduled because
    /// of cancellation yield [`CoreError::Cancelled`].
    pub async fn run<T, R, F>(&self, items: Vec<T>, work: F) -> (Vec<CoreResult<R>>, PoolStats)
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> CoreResult<R> + Send + Sync + 'static,
    {
        let work = Arc::new(work);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let mut stats = PoolStats::default();
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            if self.is_cancelled() {
                stats.skipped += 1;
                handles.push(None);
                continue;
            }

            let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
                stats.skipped += 1;
                handles.push(None);
                continue;
            };

            // Cancellation may have happened while waiting for a worker
            if self.is_cancelled() {
                drop(permit);
                stats.skipped += 1;
                handles.push(None);
                continue;
            }

            stats.submitted += 1;
            let work = Arc::clone(&work);
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);

            handles.push(Some(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                let result = work(item);
                running.fetch_sub(1, Ordering::SeqCst);
                result
            })));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let result = match handle {
                None => Err(CoreError::Cancelled),
                Some(handle) => {
                    let result = handle.await.unwrap_or_else(|e| {
                        warn!("Chapter worker panicked: {}", e);
                        Err(CoreError::Internal(format!("Chapter worker panicked: {}", e)))
                    });
                    if result.is_ok() {
                        stats.completed += 1;
                    } else {
                        stats.failed += 1;
                    }
                    result
                }
            };
            results.push(result);
        }

        stats.peak_concurrent = peak.load(Ordering::SeqCst);
        debug!(
            "Pool run finished: {} submitted, {} completed, {} failed, {} skipped, peak {}",
            stats.submitted, stats.completed, stats.failed, stats.skipped, stats.peak_concurrent
        );
        (results, stats)
    }
}

// =============================================================================
// Tests
// =============================================================================
