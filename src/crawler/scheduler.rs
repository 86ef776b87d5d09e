//! Admission gate for outgoing requests
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Minimum spacing between successive dispatches
//!
//! The last-dispatch timestamp is read and updated under a mutex that stays
//! held while the spacing sleep runs, so two callers never dispatch inside
//! the same spacing interval.

use crate::config::FetcherConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// A granted slot; the concurrency permit is released on drop
pub struct ScheduledFetch {
    pub _permit: OwnedSemaphorePermit,
}

/// Scheduler owns the concurrency counter and the last-dispatch timestamp
///
/// The scheduler coordinates:
/// - Global concurrency limits (max requests in flight)
/// - Dispatch spacing (`rate window / max concurrent`)
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    permits: Arc<Semaphore>,

    /// When the previous request was dispatched
    last_dispatch: Mutex<Option<Instant>>,

    /// Minimum time between two dispatches
    min_spacing: Duration,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `max_concurrent` - Requests allowed in flight at once
    /// * `rate_window` - Window over which `max_concurrent` dispatches are spread
    pub fn new(max_concurrent: u32, rate_window: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent as usize)),
            last_dispatch: Mutex::new(None),
            min_spacing: rate_window / max_concurrent,
        }
    }

    /// Creates a scheduler from the fetcher section of the configuration
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self::new(
            config.max_concurrent,
            Duration::from_millis(config.rate_window_ms),
        )
    }

    /// Minimum time between two dispatches
    pub fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    /// Number of free concurrency slots
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a free slot and for the dispatch spacing to elapse
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledFetch)` - The caller may dispatch now
    /// * `None` - The semaphore was closed
    pub async fn admit(&self) -> Option<ScheduledFetch> {
        let permit = self.permits.clone().acquire_owned().await.ok()?;

        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_spacing {
                let wait = self.min_spacing - elapsed;
                tracing::trace!("Spacing dispatch by {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());

        Some(ScheduledFetch { _permit: permit })
    }
}
