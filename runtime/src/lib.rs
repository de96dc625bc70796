//! # todoboard runtime
//!
//! Runs a reducer: one [`Store`] owns the state, applies actions one at a
//! time and executes the effects the reducer returns.
//!
//! ## Pieces
//!
//! - **Store**: Owns state, serialises reducer calls, executes effects
//! - **Effect execution**: Spawns effect futures and feeds produced actions back
//! - **Effect tracking**: [`EffectHandle`] lets callers wait for effects,
//!   optionally following the whole cascade of feedback actions
//!
//! ## Example
//!
//! ```ignore
//! use todoboard_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action and wait for everything it triggers
//! let observed = store.send_and_settle(Action::Load).await?;
//!
//! // Read state
//! let count = store.state(|s| s.items.len()).await;
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use todoboard_core::{effect::Effect, reducer::Reducer};
use tokio::sync::{RwLock, watch};

/// Store errors
pub mod error {
    use thiserror::Error;

    /// Reasons a store call did not go through
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// [`Store::shutdown`](crate::Store::shutdown) was called; actions are refused
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Effects were still running when the shutdown deadline passed
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// No matching action (or no settled effects) before the deadline
        #[error("Timeout waiting for action")]
        Timeout,

        /// Every sender of the action broadcast is gone
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// How far an [`EffectHandle`] follows the work caused by an action
///
/// `Direct` stops at the effects the reducer returned for it. `Cascading`
/// also covers the effects of every action those effects feed back.
#[derive(Debug, Clone)]
pub enum TrackingMode {
    /// Only the effects returned for the sent action
    Direct,

    /// The sent action's effects and, recursively, those of its feedback
    Cascading {
        /// Handles of feedback actions that must settle before this handle is done
        children: Arc<Mutex<Vec<EffectHandle>>>,
    },
}

impl TrackingMode {
    /// A fresh cascading mode with no children yet
    #[must_use]
    pub fn cascading() -> Self {
        Self::Cascading {
            children: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mode used when sending an action fed back by an effect
    fn for_feedback(&self) -> Self {
        match self {
            Self::Direct => Self::Direct,
            Self::Cascading { .. } => Self::cascading(),
        }
    }

    /// Attach a feedback action's handle so waiting covers it too
    fn adopt(&self, child: EffectHandle) {
        if let Self::Cascading { children } = self {
            children
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(child);
        }
    }
}

/// Waitable view of the effects started by one action
///
/// [`Store::send()`] hands one back once the reducer has run.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    mode: TrackingMode,
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    /// Create a handle together with the tracking context used during execution
    fn new<A>(mode: TrackingMode, log: Option<CascadeLog<A>>) -> (Self, EffectTracking<A>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            mode: mode.clone(),
            effects: Arc::clone(&counter),
            completion: rx,
        };

        let tracking = EffectTracking {
            mode,
            counter,
            notifier: tx,
            log,
        };

        (handle, tracking)
    }

    /// A handle with nothing to wait for
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            mode: TrackingMode::Direct,
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Number of tracked effects still running (children excluded)
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all tracked effects to complete
    ///
    /// In cascading mode this also waits for the effects of every action
    /// fed back into the store by those effects, recursively.
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }

        if let TrackingMode::Cascading { children } = &self.mode {
            loop {
                let handles = {
                    let mut guard = children.lock().unwrap_or_else(PoisonError::into_inner);
                    if guard.is_empty() {
                        break;
                    }
                    guard.drain(..).collect::<Vec<_>>()
                };

                for mut handle in handles {
                    Box::pin(handle.wait()).await;
                }
            }
        }
    }

    /// [`EffectHandle::wait`] with a deadline
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("mode", &self.mode)
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: feedback actions of one settled send, in feedback order
type CascadeLog<A> = Arc<Mutex<Vec<A>>>;

/// Internal: tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking<A> {
    mode: TrackingMode,
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
    /// Shared by every level of a cascade started with [`Store::send_and_settle`]
    log: Option<CascadeLog<A>>,
}

impl<A> EffectTracking<A> {
    fn record(&self, action: &A)
    where
        A: Clone,
    {
        if let Some(log) = &self.log {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(action.clone());
        }
    }

    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: decrements the effect counter on drop, even if the effect panics
struct DecrementGuard<A>(EffectTracking<A>);

impl<A> Drop for DecrementGuard<A> {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Releases a slot of the store-wide in-flight count on drop
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The store and its effect executor
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, CascadeLog, DecrementGuard, Duration,
        Effect, EffectHandle, EffectTracking, Mutex, Ordering, PoisonError, Reducer, RwLock,
        StoreError, TrackingMode,
    };
    use tokio::sync::broadcast;

    /// Default capacity of the action broadcast channel
    const DEFAULT_BROADCAST_CAPACITY: usize = 16;

    /// Owner of one reducer's state
    ///
    /// Actions are reduced one at a time under a write lock. Effects run on
    /// tokio tasks; an action they produce is broadcast to subscribers and
    /// then reduced like any other.
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        /// Every action produced by an effect is broadcast here before it is reduced.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Store with the default broadcast buffer
        ///
        /// The action broadcast channel buffers 16 actions; use
        /// [`Store::with_broadcast_capacity`] for chattier reducers.
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(
                initial_state,
                reducer,
                environment,
                DEFAULT_BROADCAST_CAPACITY,
            )
        }

        /// Store whose action broadcast buffers `capacity` actions
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                action_broadcast,
            }
        }

        /// Refuse new actions, then wait for running effects to drain
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] with the number of effects
        /// still running once `timeout` has passed.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timed out");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Reduce `action` and start its effects
        ///
        /// Returns as soon as the effects are spawned. The handle covers
        /// those effects only, not the work their feedback actions cause.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            self.send_internal(action, TrackingMode::Direct, None).await
        }

        /// Send an action and wait until its whole effect cascade has settled
        ///
        /// Returns the actions fed back by this action's own cascade, in the
        /// order they were fed back. Actions caused by other sends never
        /// appear, however the calls overlap. Every returned action was also
        /// broadcast to subscribers.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        pub async fn send_and_settle(&self, action: A) -> Result<Vec<A>, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            let log: CascadeLog<A> = Arc::new(Mutex::new(Vec::new()));

            let mut handle = self
                .send_internal(action, TrackingMode::cascading(), Some(Arc::clone(&log)))
                .await?;
            handle.wait().await;

            let observed =
                std::mem::take(&mut *log.lock().unwrap_or_else(PoisonError::into_inner));
            Ok(observed)
        }

        /// Send `action` and return the first broadcast action matching `predicate`
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`] if nothing matched within `timeout`
        /// - [`StoreError::ChannelClosed`] if the broadcast closed first
        /// - [`StoreError::ShutdownInProgress`] if the store refuses actions
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged, actions skipped");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Receiver of every action an effect feeds back
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Run `f` against the state under a read lock
        ///
        /// ```ignore
        /// let item_count = store.state(|s| s.items.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        #[tracing::instrument(skip(self, action, tracking_mode, log), name = "store_send_internal")]
        async fn send_internal(
            &self,
            action: A,
            tracking_mode: TrackingMode,
            log: Option<CascadeLog<A>>,
        ) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new(tracking_mode, log);

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect_internal(effect, tracking.clone());
            }

            Ok(handle)
        }

        /// Feed an effect-produced action back into the store
        ///
        /// In cascading mode the resulting handle is adopted by the parent so
        /// that waiting on the parent covers it.
        async fn feed_back(&self, action: A, tracking: &EffectTracking<A>)
        where
            R: Clone,
            E: Clone,
        {
            tracking.record(&action);
            let _ = self.action_broadcast.send(action.clone());

            match self
                .send_internal(action, tracking.mode.for_feedback(), tracking.log.clone())
                .await
            {
                Ok(child) => tracking.mode.adopt(child),
                Err(error) => {
                    tracing::warn!(error = %error, "Dropped feedback action");
                },
            }
        }

        /// Start `effect`, counting it against `tracking`
        ///
        /// Remote failures arrive as ordinary result actions. A task that
        /// panics still releases its slot through [`DecrementGuard`].
        #[allow(clippy::needless_pass_by_value)] // tracking is cloned into tasks
        #[tracing::instrument(skip(self, effect, tracking), name = "execute_effect")]
        fn execute_effect_internal(&self, effect: Effect<A>, tracking: EffectTracking<A>)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let store = self.clone();

                    tokio::spawn(async move {
                        let guard = DecrementGuard(tracking);
                        let _pending_guard = pending_guard;

                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action");
                            store.feed_back(action, &guard.0).await;
                        }
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);

                    for effect in effects {
                        self.execute_effect_internal(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    let effect_count = effects.len();
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);
                    tracking.increment();

                    self.pending_effects.fetch_add(1, Ordering::SeqCst);
                    let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));

                    let store = self.clone();

                    tokio::spawn(async move {
                        let guard = DecrementGuard(tracking);
                        let _pending_guard = pending_guard;

                        for (idx, effect) in effects.into_iter().enumerate() {
                            tracing::trace!(
                                "Executing sequential effect {} of {}",
                                idx + 1,
                                effect_count
                            );

                            // Each step settles (cascade included) before the next starts
                            let (mut step, step_tracking) = EffectHandle::new(
                                guard.0.mode.for_feedback(),
                                guard.0.log.clone(),
                            );
                            store.execute_effect_internal(effect, step_tracking);
                            step.wait().await;
                        }
                    });
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;
