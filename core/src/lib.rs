//! # todoboard core
//!
//! Core traits and types for the todoboard reducer architecture.
//!
//! ## Core Concepts
//!
//! - **State**: View state for a feature (the to-do cache, draft, mode)
//! - **Action**: All possible inputs to a reducer (user intents and remote results)
//! - **Reducer**: Decides what an action does to state and which effects follow
//! - **Effect**: A description of work to run later, such as a remote call
//! - **Environment**: Injected dependencies (clock, remote collection, config)
//!
//! The runtime that executes effects lives in `todoboard-runtime`.
//!
//! ## Example
//!
//! ```
//! use todoboard_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct DraftState {
//!     draft: String,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum DraftAction {
//!     Typed(String),
//!     Cleared,
//! }
//!
//! struct DraftReducer;
//!
//! impl Reducer for DraftReducer {
//!     type State = DraftState;
//!     type Action = DraftAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut DraftState,
//!         action: DraftAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<DraftAction>; 4]> {
//!         match action {
//!             DraftAction::Typed(text) => state.draft = text,
//!             DraftAction::Cleared => state.draft.clear(),
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = DraftState::default();
//! DraftReducer.reduce(&mut state, DraftAction::Typed("buy milk".into()), &());
//! assert_eq!(state.draft, "buy milk");
//! ```

pub use chrono::{DateTime, Utc};
pub use smallvec::{smallvec, SmallVec};

/// Declarative macros for building effects
pub mod effect_macros;

/// The reducer trait
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They hold all decision logic and never perform I/O themselves.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Holds the decision logic of a feature
    ///
    /// `State` is mutated in place, `Action` is everything the feature
    /// reacts to, and `Environment` carries the clock and remote clients.
    pub trait Reducer {
        /// State mutated by [`Reducer::reduce`]
        type State;

        /// User intents and remote results
        type Action;

        /// Injected dependencies
        type Environment;

        /// Apply `action` to `state` and describe the follow-up work
        ///
        /// Validates the action, updates state in place, and returns effect
        /// descriptions for the runtime to execute. Most actions produce zero
        /// or one effect, hence the inline capacity of four.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect descriptions
///
/// Effects are values returned from reducers and executed by the `Store`.
/// A `Future` effect resolves to an optional action which the runtime feeds
/// back into the reducer.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Boxed future produced by an [`Effect::Future`]
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Work requested by a reducer
    ///
    /// Effects are NOT executed immediately. They are descriptions of what
    /// should happen, returned from reducers and executed by the runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Run effects in order, each one finishing before the next starts
        Sequential(Vec<Effect<Action>>),

        /// A single async computation, typically one remote call
        ///
        /// If it resolves to `Some(action)`, the action is fed back into the reducer.
        Future(EffectFuture<Action>),
    }

    // Futures have no Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Group effects that may run concurrently
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Group effects that must run one after another
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Whether this effect does nothing when executed
        #[must_use]
        pub fn is_noop(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().all(Effect::is_noop)
                },
                Effect::Future(_) => false,
            }
        }
    }
}

/// Injected dependencies
///
/// External dependencies are abstracted behind traits and injected via the
/// reducer's Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Source of "now", swapped for a fixed clock in tests
    pub trait Clock: Send + Sync {
        /// Current instant
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall clock backed by [`Utc::now`]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
