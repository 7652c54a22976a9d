//! Reducer composition utilities
//!
//! Large states are easier to reason about when each cell has a single
//! reducer that owns it. [`combine_reducers`] runs several such reducers over
//! the same state and action, in order, so a later reducer observes the cells
//! an earlier one has just written.
//!
//! # Examples
//!
//! ```
//! use reactive_atoms_core::{Effect, Reducer, SmallVec, smallvec};
//! use reactive_atoms_core::composition::combine_reducers;
//!
//! #[derive(Clone, Default)]
//! struct AppState {
//!     items: Vec<String>,
//!     selected: Option<usize>,
//! }
//!
//! #[derive(Clone)]
//! enum AppAction {
//!     Push(String),
//!     Clear,
//!     Select(usize),
//! }
//!
//! struct ItemsReducer;
//! struct SelectionReducer;
//!
//! impl Reducer for ItemsReducer {
//!     type State = AppState;
//!     type Action = AppAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut AppState, action: AppAction, _env: &()) -> SmallVec<[Effect<AppAction>; 4]> {
//!         match action {
//!             AppAction::Push(item) => state.items.push(item),
//!             AppAction::Clear => state.items.clear(),
//!             AppAction::Select(_) => {}
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! impl Reducer for SelectionReducer {
//!     type State = AppState;
//!     type Action = AppAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut AppState, action: AppAction, _env: &()) -> SmallVec<[Effect<AppAction>; 4]> {
//!         if let AppAction::Select(index) = action {
//!             state.selected = Some(index);
//!         }
//!         // Runs after ItemsReducer, so it sees the list already updated
//!         if state.selected.is_some_and(|index| index >= state.items.len()) {
//!             state.selected = None;
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let combined = combine_reducers(vec![Box::new(ItemsReducer), Box::new(SelectionReducer)]);
//!
//! let mut state = AppState::default();
//! let _ = combined.reduce(&mut state, AppAction::Push("a".to_string()), &());
//! let _ = combined.reduce(&mut state, AppAction::Select(0), &());
//! assert_eq!(state.selected, Some(0));
//!
//! let _ = combined.reduce(&mut state, AppAction::Clear, &());
//! assert_eq!(state.selected, None);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Boxed reducer trait object accepted by [`combine_reducers`]
pub type BoxedReducer<S, A, E> = Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated
/// in the same order. `Effect::None` entries are dropped from the combined result.
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    /// Number of reducers in this combination
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Returns `true` if no reducers were combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects.into_iter().filter(|effect| !effect.is_none()));
        }

        all_effects
    }
}

impl<S, A, E> std::fmt::Debug for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("reducers", &self.reducers.len())
            .finish()
    }
}
