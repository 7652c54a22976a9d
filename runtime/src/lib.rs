//! # Reactive Atoms Runtime
//!
//! Runtime implementation for the Reactive Atoms architecture.
//!
//! This crate provides the [`Store`] runtime that coordinates reducer
//! execution, atom recomputation and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state and its atom graph, runs the reducer
//! - **Atoms**: Source and derived cells registered on the store
//! - **Effect Executor**: Runs effect descriptions in the same turn and feeds
//!   produced actions back to the reducer
//!
//! ## Turn model
//!
//! One call to [`Store::send`] is one *turn*: the action is reduced, every
//! atom is brought up to date, the returned effects run, and any action they
//! produce is reduced in turn, all before `send` returns. Turns never
//! interleave, and readers never observe a state whose atoms are stale.
//!
//! ## Example
//!
//! ```ignore
//! use reactive_atoms_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//! let count = store.atom("count", |s: &MyState| s.items.len()).await;
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! assert_eq!(count.get(), value);
//! ```

use reactive_atoms_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Effects kept producing actions past the configured depth
        ///
        /// Every action reduced before the limit was hit stays applied; only
        /// the remaining feedback chain is dropped.
        #[error("Effect feedback exceeded the maximum depth of {0}")]
        FeedbackLimitExceeded(usize),
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use reactive_atoms_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_max_feedback_depth(4)
///     .with_broadcast_capacity(64);
///
/// assert_eq!(config.max_feedback_depth, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// How many generations of effect-produced actions one turn may reduce
    pub max_feedback_depth: usize,
    /// Number of applied actions buffered for slow action subscribers
    pub broadcast_capacity: usize,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub const fn new(max_feedback_depth: usize, broadcast_capacity: usize) -> Self {
        Self {
            max_feedback_depth,
            broadcast_capacity,
        }
    }

    /// Set the maximum effect feedback depth
    #[must_use]
    pub const fn with_max_feedback_depth(mut self, depth: usize) -> Self {
        self.max_feedback_depth = depth;
        self
    }

    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_feedback_depth: 16,
            broadcast_capacity: 16,
        }
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{Arc, Effect, Reducer, RwLock, StoreConfig, StoreError};
    use reactive_atoms_core::{Atom, AtomGraph, Get, SmallVec};
    use std::collections::VecDeque;
    use tokio::sync::{Mutex, broadcast};

    /// State plus the atoms observing it, guarded together
    struct Shared<S> {
        state: S,
        atoms: AtomGraph<S>,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State and its atom graph (behind one `RwLock`)
    /// 2. Reducer (business logic, the only writer of state)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
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
        shared: Arc<RwLock<Shared<S>>>,
        /// Held for a whole turn so turns never interleave
        turn: Arc<Mutex<()>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        config: StoreConfig,
        /// Every action applied by the store, including effect feedback
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                shared: Arc::new(RwLock::new(Shared {
                    state: initial_state,
                    atoms: AtomGraph::new(),
                })),
                turn: Arc::new(Mutex::new(())),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                config,
                action_broadcast,
            }
        }

        /// The injected environment
        #[must_use]
        pub fn environment(&self) -> &E {
            &self.environment
        }

        /// The configuration this store was built with
        #[must_use]
        pub const fn config(&self) -> &StoreConfig {
            &self.config
        }

        /// Register a source atom selecting a cell out of the state
        ///
        /// The atom is kept up to date after every reduced action.
        pub async fn atom<T, F>(&self, name: &'static str, select: F) -> Atom<T>
        where
            T: Clone + PartialEq + Send + Sync + 'static,
            F: Fn(&S) -> T + Send + Sync + 'static,
        {
            let mut guard = self.shared.write().await;
            let shared = &mut *guard;
            tracing::debug!(atom = name, "Registering source atom");
            shared.atoms.source(name, &shared.state, select)
        }

        /// Register a derived atom computed from atoms already on this store
        pub async fn derive<T, F>(&self, name: &'static str, compute: F) -> Atom<T>
        where
            T: Clone + PartialEq + Send + Sync + 'static,
            F: for<'a> Fn(&Get<'a, S>) -> T + Send + Sync + 'static,
        {
            let mut guard = self.shared.write().await;
            tracing::debug!(atom = name, "Registering derived atom");
            guard.atoms.derive(name, compute)
        }

        /// Names of all registered atoms, in evaluation order
        pub async fn atom_names(&self) -> Vec<&'static str> {
            self.shared.read().await.atoms.names()
        }

        /// Send an action to the store
        ///
        /// This is the primary way to interact with the store:
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Recomputes atoms and notifies their observers
        /// 4. Releases the lock and executes returned effects
        /// 5. Reduces any action the effects produced (feedback loop)
        ///
        /// The whole sequence is one turn; concurrent `send()` calls wait for
        /// the running turn to finish.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::FeedbackLimitExceeded`] if effects keep producing
        /// actions beyond [`StoreConfig::max_feedback_depth`] generations.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            let _turn = self.turn.lock().await;

            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let mut queue = VecDeque::from([(action, 0_usize)]);
            while let Some((action, depth)) = queue.pop_front() {
                if depth > self.config.max_feedback_depth {
                    tracing::error!(
                        max_depth = self.config.max_feedback_depth,
                        dropped = queue.len() + 1,
                        "Effect feedback chain too deep, dropping remaining actions"
                    );
                    metrics::counter!("store.feedback.exceeded").increment(1);
                    return Err(StoreError::FeedbackLimitExceeded(self.config.max_feedback_depth));
                }

                let effects = self.apply(action).await;

                tracing::trace!("Executing {} effects", effects.len());
                for effect in effects {
                    Self::execute_effect(effect, depth, &mut queue);
                }
            }

            tracing::debug!("Action processing completed");
            Ok(())
        }

        /// Reduce one action and bring the atoms up to date, atomically
        async fn apply(&self, action: A) -> SmallVec<[Effect<A>; 4]> {
            let effects = {
                let mut guard = self.shared.write().await;
                let shared = &mut *guard;
                tracing::trace!("Acquired write lock on state");

                let span = tracing::debug_span!("reducer_execution");
                span.in_scope(|| {
                    let start = std::time::Instant::now();
                    let effects =
                        self.reducer
                            .reduce(&mut shared.state, action.clone(), &self.environment);
                    metrics::histogram!("store.reducer.duration_seconds")
                        .record(start.elapsed().as_secs_f64());

                    let changed = shared.atoms.recompute(&shared.state);
                    tracing::trace!(?changed, "Atoms recomputed");

                    // Note: Precision loss acceptable for metrics (atom counts < 2^52)
                    #[allow(clippy::cast_precision_loss)]
                    metrics::histogram!("store.atoms.changed").record(changed.len() as f64);

                    effects
                })
            };

            // No subscribers is fine
            let _ = self.action_broadcast.send(action);

            effects
        }

        fn execute_effect(effect: Effect<A>, depth: usize, queue: &mut VecDeque<(A, usize)>) {
            match effect {
                Effect::None => {},
                Effect::Sequential(effects) => {
                    for effect in effects {
                        Self::execute_effect(effect, depth, queue);
                    }
                },
                Effect::Run(run) => {
                    if let Some(action) = run() {
                        tracing::trace!(depth = depth + 1, "Effect produced feedback action");
                        queue.push_back((action, depth + 1));
                    }
                },
            }
        }

        /// Subscribe to every action applied by this store
        ///
        /// Includes both sent actions and actions produced by effects, in the
        /// order they were reduced.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// Access state through a closure to ensure the lock is released promptly:
        ///
        /// ```ignore
        /// let todo_count = store.state(|s| s.todos.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let guard = self.shared.read().await;
            f(&guard.state)
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                shared: Arc::clone(&self.shared),
                turn: Arc::clone(&self.turn),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                config: self.config.clone(),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
