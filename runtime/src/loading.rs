//! Reference-counted busy flag for loading indicators.
//!
//! Every started task increments a counter and every finished task decrements
//! it; the flag reads `true` while the counter is above zero. Overlapping
//! tasks therefore keep the indicator on until the last one finishes.

use crate::metrics::LoadingMetrics;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared busy flag
///
/// Cloning yields another handle to the same counter.
///
/// # Example
///
/// ```
/// use flightdeck_runtime::LoadingTracker;
///
/// let loading = LoadingTracker::new();
/// loading.start_loading_task();
/// loading.start_loading_task();
/// loading.end_loading_task();
/// assert!(loading.is_busy());
/// loading.end_loading_task();
/// assert!(!loading.is_busy());
/// ```
#[derive(Clone, Debug)]
pub struct LoadingTracker {
    tasks: Arc<watch::Sender<usize>>,
}

impl LoadingTracker {
    /// Create an idle tracker
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self { tasks: Arc::new(tx) }
    }

    /// Mark one more task as in flight
    pub fn start_loading_task(&self) {
        self.tasks.send_modify(|count| *count += 1);
        let count = *self.tasks.borrow();
        LoadingMetrics::record_in_flight(count);
        tracing::trace!(in_flight = count, "Loading task started");
    }

    /// Mark one task as finished
    ///
    /// Unbalanced calls are ignored so the counter never underflows.
    pub fn end_loading_task(&self) {
        let mut underflow = false;
        self.tasks.send_modify(|count| {
            if *count == 0 {
                underflow = true;
            } else {
                *count -= 1;
            }
        });

        if underflow {
            tracing::warn!("end_loading_task called with no task in flight");
            return;
        }

        let count = *self.tasks.borrow();
        LoadingMetrics::record_in_flight(count);
        tracing::trace!(in_flight = count, "Loading task finished");
    }

    /// Start a task that ends when the returned guard is dropped
    #[must_use = "the task ends as soon as the guard is dropped"]
    pub fn task(&self) -> LoadingGuard {
        self.start_loading_task();
        LoadingGuard {
            tracker: self.clone(),
        }
    }

    /// Whether any task is in flight
    #[must_use]
    pub fn is_busy(&self) -> bool {
        *self.tasks.borrow() > 0
    }

    /// Number of tasks in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self.tasks.borrow()
    }

    /// Watch the busy flag
    ///
    /// The receiver observes the task count; map it with `> 0` for the flag.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.tasks.subscribe()
    }

    /// Wait until no task is in flight
    pub async fn wait_idle(&self) {
        let mut rx = self.tasks.subscribe();
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

impl Default for LoadingTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`LoadingTracker::task`]
#[derive(Debug)]
pub struct LoadingGuard {
    tracker: LoadingTracker,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.tracker.end_loading_task();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_tasks_keep_flag_busy() {
        let loading = LoadingTracker::new();
        assert!(!loading.is_busy());

        loading.start_loading_task();
        loading.start_loading_task();
        loading.end_loading_task();
        assert!(loading.is_busy());

        loading.end_loading_task();
        assert!(!loading.is_busy());
    }

    #[test]
    fn unbalanced_end_does_not_underflow() {
        let loading = LoadingTracker::new();
        loading.end_loading_task();
        assert_eq!(loading.in_flight(), 0);

        loading.start_loading_task();
        assert!(loading.is_busy());
    }

    #[test]
    fn guard_ends_task_on_drop() {
        let loading = LoadingTracker::new();
        {
            let _first = loading.task();
            let _second = loading.task();
            assert_eq!(loading.in_flight(), 2);
        }
        assert!(!loading.is_busy());
    }

    #[test]
    fn wait_idle_is_immediate_when_idle() {
        let loading = LoadingTracker::new();
        tokio_test::block_on(loading.wait_idle());

        let guard = loading.task();
        let mut wait = tokio_test::task::spawn(loading.wait_idle());
        tokio_test::assert_pending!(wait.poll());

        drop(guard);
        assert!(wait.is_woken());
        tokio_test::assert_ready!(wait.poll());
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let loading = LoadingTracker::new();
        let mut rx = loading.subscribe();

        loading.start_loading_task();
        rx.changed().await.ok();
        assert_eq!(*rx.borrow_and_update(), 1);

        loading.end_loading_task();
        rx.changed().await.ok();
        assert_eq!(*rx.borrow_and_update(), 0);
    }

    #[tokio::test]
    async fn wait_idle_returns_after_last_task() {
        let loading = LoadingTracker::new();
        let guard = loading.task();

        let waiter = {
            let loading = loading.clone();
            tokio::spawn(async move { loading.wait_idle().await })
        };

        drop(guard);
        assert!(waiter.await.is_ok());
    }
}
