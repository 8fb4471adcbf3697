//! # Flightdeck Runtime
//!
//! Runtime implementation for the flightdeck booking core.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns one session's state, serializes every write through the
//!   reducer and executes the returned effects
//! - **Subscriptions**: Every state change is published as a versioned
//!   snapshot to every subscriber, in order, without skipping
//! - **Cancellation**: Effects registered under an [`EffectId`] can be aborted;
//!   an aborted effect never feeds an action back
//! - **Loading**: A shared [`LoadingTracker`] is busy while any async effect runs
//!
//! ## Example
//!
//! ```ignore
//! use flightdeck_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field.clone()).await;
//! ```

use flightdeck_core::{effect::Effect, effect::EffectId, reducer::Reducer};
use std::sync::Arc;
use std::time::Duration;

/// Reference-counted busy flag
pub mod loading;

/// Metric names and recorders
pub mod metrics;

pub use error::StoreError;
pub use loading::{LoadingGuard, LoadingTracker};
pub use store::{StateSnapshot, StateSubscription, Store};

/// Error types for the Store runtime
pub mod error {
    use std::time::Duration;
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// Returned when `send()` is called after `shutdown()` started.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Effects were still running when the timeout elapsed
        #[error("Timed out after {0:?} waiting for effects to settle")]
        Timeout(Duration),
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{Arc, Duration, Effect, EffectId, LoadingTracker, Reducer, StoreError};
    use crate::metrics::{EffectMetrics, StoreMetrics};
    use futures::Stream;
    use std::collections::HashMap;
    use std::marker::PhantomData;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use std::task::{Context, Poll};
    use tokio::sync::{RwLock, mpsc, watch};
    use tokio::task::AbortHandle;

    /// A published state version
    ///
    /// Versions start at 0 for the initial state and increase by one for every
    /// reduction that changed state.
    #[derive(Debug)]
    pub struct StateSnapshot<S> {
        /// Monotonic version of this state
        pub version: u64,
        /// The state after the change
        pub state: Arc<S>,
    }

    impl<S> Clone for StateSnapshot<S> {
        fn clone(&self) -> Self {
            Self {
                version: self.version,
                state: Arc::clone(&self.state),
            }
        }
    }

    /// Receiving side of [`Store::subscribe`]
    ///
    /// The first item is the state current at subscription time; each
    /// following item is strictly newer than the previous one. The channel is
    /// unbounded so a slow reader never loses a version.
    #[derive(Debug)]
    pub struct StateSubscription<S> {
        rx: mpsc::UnboundedReceiver<StateSnapshot<S>>,
    }

    impl<S> StateSubscription<S> {
        /// Wait for the next snapshot
        ///
        /// Returns `None` once the store has been dropped.
        pub async fn recv(&mut self) -> Option<StateSnapshot<S>> {
            self.rx.recv().await
        }

        /// Take the next snapshot if one is already queued
        pub fn try_recv(&mut self) -> Option<StateSnapshot<S>> {
            self.rx.try_recv().ok()
        }

        /// Drain every queued snapshot
        pub fn drain(&mut self) -> Vec<StateSnapshot<S>> {
            let mut snapshots = Vec::new();
            while let Some(snapshot) = self.try_recv() {
                snapshots.push(snapshot);
            }
            snapshots
        }
    }

    impl<S> Stream for StateSubscription<S> {
        type Item = StateSnapshot<S>;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.rx.poll_recv(cx)
        }
    }

    /// One spawned task registered under an [`EffectId`]
    ///
    /// `cancelled` is checked under the state write lock before the task's
    /// feedback action is reduced, so a task that already finished its work
    /// still emits nothing once cancelled.
    struct RunningEffect {
        task: u64,
        handle: AbortHandle,
        cancelled: Arc<AtomicBool>,
    }

    /// Decrements the pending-effect counter when an effect task ends,
    /// including when it is aborted.
    struct PendingGuard(Arc<watch::Sender<usize>>);

    impl Drop for PendingGuard {
        fn drop(&mut self) {
            self.0.send_modify(|count| *count = count.saturating_sub(1));
        }
    }

    struct Inner<S, E, R> {
        state: RwLock<S>,
        version: AtomicU64,
        reducer: R,
        environment: E,
        subscribers: Mutex<Vec<mpsc::UnboundedSender<StateSnapshot<S>>>>,
        running: Mutex<HashMap<EffectId, Vec<RunningEffect>>>,
        next_task: AtomicU64,
        pending: Arc<watch::Sender<usize>>,
        loading: LoadingTracker,
        shutdown: AtomicBool,
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; writes only happen inside the reducer)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    /// 5. State subscribers (update-then-notify, one snapshot per change)
    ///
    /// Cloning a store yields another handle to the same session.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        inner: Arc<Inner<S, E, R>>,
        _action: PhantomData<fn(A)>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
                _action: PhantomData,
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_loading(initial_state, reducer, environment, LoadingTracker::new())
        }

        /// Create a store that reports async effects on an existing tracker
        ///
        /// Use this when several stores drive one loading indicator.
        #[must_use]
        pub fn with_loading(
            initial_state: S,
            reducer: R,
            environment: E,
            loading: LoadingTracker,
        ) -> Self {
            let (pending, _) = watch::channel(0);

            Self {
                inner: Arc::new(Inner {
                    state: RwLock::new(initial_state),
                    version: AtomicU64::new(0),
                    reducer,
                    environment,
                    subscribers: Mutex::new(Vec::new()),
                    running: Mutex::new(HashMap::new()),
                    next_task: AtomicU64::new(0),
                    pending: Arc::new(pending),
                    loading,
                    shutdown: AtomicBool::new(false),
                }),
                _action: PhantomData,
            }
        }

        /// Send an action through the reducer and execute its effects
        ///
        /// State is published to subscribers before this returns, so a
        /// subscriber never observes an older version after `send` completes.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            self.dispatch(action, None).await
        }

        /// Reduce `action` unless `cancelled` was set before the write lock
        /// was taken
        async fn dispatch(
            &self,
            action: A,
            cancelled: Option<&AtomicBool>,
        ) -> Result<(), StoreError> {
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");

            let mut state = self.inner.state.write().await;
            if cancelled.is_some_and(|flag| flag.load(Ordering::Acquire)) {
                tracing::debug!("Dropped feedback from cancelled effect");
                return Ok(());
            }
            let before = state.clone();

            let start = std::time::Instant::now();
            let effects = self
                .inner
                .reducer
                .reduce(&mut state, action, &self.inner.environment);
            StoreMetrics::record_action(start.elapsed());

            if *state != before {
                let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;
                StoreMetrics::record_state_change();
                tracing::trace!(version, "State changed, notifying subscribers");
                self.publish(&StateSnapshot {
                    version,
                    state: Arc::new(state.clone()),
                });
            }

            // Effects start while the write lock is held, so a cancellation
            // lands before any waiting feedback action can be reduced.
            tracing::trace!("Executing {} effects", effects.len());
            for effect in effects {
                self.execute_effect(effect, None);
            }
            drop(state);

            Ok(())
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let phase = store.state(|s| s.phase).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.inner.state.read().await;
            f(&state)
        }

        /// Current state version
        #[must_use]
        pub fn version(&self) -> u64 {
            self.inner.version.load(Ordering::SeqCst)
        }

        /// Subscribe to state changes
        ///
        /// The subscription immediately holds the current snapshot, followed by
        /// every later change.
        pub async fn subscribe(&self) -> StateSubscription<S> {
            let (tx, rx) = mpsc::unbounded_channel();

            // Holding the read lock keeps writers out until the subscriber is
            // registered, so no version falls between snapshot and registration.
            let state = self.inner.state.read().await;
            let snapshot = StateSnapshot {
                version: self.inner.version.load(Ordering::SeqCst),
                state: Arc::new(state.clone()),
            };
            let _ = tx.send(snapshot);
            lock(&self.inner.subscribers).push(tx);
            drop(state);

            StateSubscription { rx }
        }

        /// Shared loading tracker driven by this store's async effects
        #[must_use]
        pub fn loading(&self) -> LoadingTracker {
            self.inner.loading.clone()
        }

        /// Number of effect tasks still running
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            *self.inner.pending.borrow()
        }

        /// Abort every effect registered under `id`
        pub fn cancel(&self, id: &EffectId) {
            self.cancel_running(id);
        }

        /// Wait until no effect task is running
        ///
        /// Actions fed back by effects are reduced before their task ends, so
        /// an idle store has also processed every follow-up action.
        pub async fn wait_idle(&self) {
            let mut rx = self.inner.pending.subscribe();
            let _ = rx.wait_for(|count| *count == 0).await;
        }

        /// [`Store::wait_idle`] bounded by a timeout
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Timeout`] if effects are still running when
        /// the timeout elapses.
        pub async fn settle(&self, timeout: Duration) -> Result<(), StoreError> {
            tokio::time::timeout(timeout, self.wait_idle())
                .await
                .map_err(|_| StoreError::Timeout(timeout))
        }

        /// Stop accepting actions and abort every cancellable effect
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::Timeout`] if uncancellable effects are still
        /// running when the timeout elapses.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating store shutdown");
            self.inner.shutdown.store(true, Ordering::Release);

            let ids: Vec<EffectId> = lock(&self.inner.running).keys().cloned().collect();
            for id in &ids {
                self.cancel_running(id);
            }

            let result = self.settle(timeout).await;
            if let Err(error) = &result {
                tracing::error!(%error, pending = self.pending_effects(), "Shutdown incomplete");
            }
            result
        }

        fn publish(&self, snapshot: &StateSnapshot<S>) {
            let mut subscribers = lock(&self.inner.subscribers);
            let before = subscribers.len();
            subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
            StoreMetrics::record_dropped_subscribers(before - subscribers.len());
        }

        fn cancel_running(&self, id: &EffectId) {
            let removed = lock(&self.inner.running).remove(id).unwrap_or_default();
            for running in &removed {
                running.cancelled.store(true, Ordering::Release);
                running.handle.abort();
                EffectMetrics::record_cancelled();
            }
            if !removed.is_empty() {
                tracing::debug!(%id, count = removed.len(), "Cancelled effects");
            }
        }

        fn deregister(&self, id: &EffectId, task: u64) {
            let mut running = lock(&self.inner.running);
            if let Some(tasks) = running.get_mut(id) {
                tasks.retain(|r| r.task != task);
                if tasks.is_empty() {
                    running.remove(id);
                }
            }
        }

        /// Execute an effect
        ///
        /// - `None`: No-op
        /// - `Future`: Spawns the computation and feeds its action back
        /// - `Parallel`: Executes each effect concurrently
        /// - `Cancellable`: Aborts effects already running under the id, then
        ///   runs the inner effect registered under it
        /// - `Cancel`: Aborts effects running under the id
        ///
        /// `registration` carries the id a spawned task is registered under.
        fn execute_effect(&self, effect: Effect<A>, registration: Option<&EffectId>) {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    EffectMetrics::record_execution("none");
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    EffectMetrics::record_execution("parallel");
                    for effect in effects {
                        self.execute_effect(effect, registration);
                    }
                },
                Effect::Cancellable { id, effect } => {
                    tracing::trace!(%id, "Executing Effect::Cancellable");
                    EffectMetrics::record_execution("cancellable");
                    self.cancel_running(&id);
                    self.execute_effect(*effect, Some(&id));
                },
                Effect::Cancel(id) => {
                    tracing::trace!(%id, "Executing Effect::Cancel");
                    EffectMetrics::record_execution("cancel");
                    self.cancel_running(&id);
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    EffectMetrics::record_execution("future");

                    self.inner.pending.send_modify(|count| *count += 1);
                    let pending_guard = PendingGuard(Arc::clone(&self.inner.pending));
                    let loading_guard = self.inner.loading.task();

                    let task = self.inner.next_task.fetch_add(1, Ordering::SeqCst);
                    let id = registration.cloned();
                    let cancelled = Arc::new(AtomicBool::new(false));
                    let flag = Arc::clone(&cancelled);
                    let store = self.clone();

                    // Registration happens under the lock so a fast task cannot
                    // deregister before it was registered.
                    let mut running = lock(&self.inner.running);
                    let handle = tokio::spawn(async move {
                        let _pending = pending_guard;
                        let _loading = loading_guard;

                        // Stays registered until its feedback is reduced so a
                        // cancel reduced in the meantime still suppresses it.
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action, sending to store");
                            if let Err(error) = store.dispatch(action, Some(&flag)).await {
                                tracing::debug!(%error, "Dropped effect feedback");
                            }
                        } else {
                            tracing::trace!("Effect::Future completed with no action");
                        }

                        if let Some(id) = &id {
                            store.deregister(id, task);
                        }
                    });

                    if let Some(id) = registration {
                        running.entry(id.clone()).or_default().push(RunningEffect {
                            task,
                            handle: handle.abort_handle(),
                            cancelled,
                        });
                    }
                },
            }
        }
    }
}
