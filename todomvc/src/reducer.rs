//! Reducer logic for the todo list.
//!
//! Two reducers share the [`TodoState`]: [`ListReducer`] owns the todo list
//! and its persistence, [`SelectionReducer`] owns the filter and the
//! inline-edit selection. [`TodoReducer`] combines them, list first, so the
//! selection reducer sees the list after the mutation.

use crate::persistence::{self, SaveOutcome};
use crate::types::{Todo, TodoAction, TodoId, TodoState};
use reactive_atoms_core::{
    SmallVec,
    composition::{BoxedReducer, CombinedReducer, combine_reducers},
    effect::Effect,
    environment::{IdGenerator, Storage},
    reducer::Reducer,
    smallvec,
};
use std::sync::Arc;

/// Environment dependencies for the todo reducers
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Source of fresh todo ids
    pub ids: Arc<dyn IdGenerator>,
    /// Where the list is persisted
    pub storage: Arc<dyn Storage>,
    /// Storage key holding the list
    pub storage_key: String,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(
        ids: Arc<dyn IdGenerator>,
        storage: Arc<dyn Storage>,
        storage_key: impl Into<String>,
    ) -> Self {
        Self {
            ids,
            storage,
            storage_key: storage_key.into(),
        }
    }
}

impl std::fmt::Debug for TodoEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoEnvironment")
            .field("storage_key", &self.storage_key)
            .finish_non_exhaustive()
    }
}

/// Owns the todo list
///
/// Every action that changes the list returns one effect writing the whole
/// list to storage; the effect feeds back [`TodoAction::Persisted`]. While
/// the last write failed, list actions that leave the list as it is write it
/// again, blank adds excepted.
#[derive(Clone, Copy, Debug, Default)]
pub struct ListReducer;

impl ListReducer {
    fn add(state: &mut TodoState, env: &TodoEnvironment, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            tracing::trace!("Ignoring blank title");
            return false;
        }

        let todo = Todo::new(env.ids.next_id(), title);
        tracing::debug!(id = %todo.id, "Todo added");
        state.todos.push(todo);
        true
    }

    fn toggle(state: &mut TodoState, id: &TodoId) -> bool {
        let Some(todo) = state.todos.iter_mut().find(|todo| &todo.id == id) else {
            tracing::trace!(%id, "Toggle of unknown todo ignored");
            return false;
        };

        todo.completed = !todo.completed;
        tracing::debug!(%id, completed = todo.completed, "Todo toggled");
        true
    }

    fn remove(state: &mut TodoState, id: &TodoId) -> bool {
        let before = state.todos.len();
        state.todos.retain(|todo| &todo.id != id);

        let removed = state.todos.len() != before;
        if removed {
            tracing::debug!(%id, "Todo removed");
        }
        removed
    }

    fn rename(state: &mut TodoState, id: &TodoId, title: &str) -> bool {
        match state.todos.iter_mut().find(|todo| &todo.id == id) {
            Some(todo) if todo.title != title => {
                title.clone_into(&mut todo.title);
                tracing::debug!(%id, "Todo renamed");
                true
            },
            _ => false,
        }
    }

    fn set_all(state: &mut TodoState, completed: bool) -> bool {
        let mut changed = false;
        for todo in state.todos.iter_mut().filter(|todo| todo.completed != completed) {
            todo.completed = completed;
            changed = true;
        }
        changed
    }

    fn clear_completed(state: &mut TodoState) -> bool {
        let before = state.todos.len();
        state.todos.retain(|todo| !todo.completed);

        let cleared = before - state.todos.len();
        if cleared > 0 {
            tracing::debug!(cleared, "Completed todos cleared");
        }
        cleared > 0
    }

    /// Storage still holds an older list after a failed write
    fn save_pending(state: &TodoState) -> bool {
        let pending = matches!(state.last_save, Some(SaveOutcome::Recovered { .. }));
        if pending {
            tracing::debug!("Rewriting list after failed save");
        }
        pending
    }

    /// Effect writing the current list, reporting back how the write went
    fn persist(env: &TodoEnvironment, todos: &[Todo]) -> Effect<TodoAction> {
        let storage = Arc::clone(&env.storage);
        let key = env.storage_key.clone();
        let snapshot = todos.to_vec();

        Effect::run(move || {
            let outcome = persistence::save(storage.as_ref(), &key, &snapshot);
            Some(TodoAction::Persisted { outcome })
        })
    }
}

impl Reducer for ListReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let changed = match action {
            TodoAction::Add { title } => {
                if !Self::add(state, env, &title) {
                    return SmallVec::new();
                }
                true
            },
            TodoAction::Toggle { id } => Self::toggle(state, &id),
            TodoAction::Remove { id } => Self::remove(state, &id),
            TodoAction::Update { id, title } => {
                let title = title.trim();
                if title.is_empty() {
                    Self::remove(state, &id)
                } else {
                    Self::rename(state, &id, title)
                }
            },
            TodoAction::ToggleAll { completed } => Self::set_all(state, completed),
            TodoAction::ClearCompleted => Self::clear_completed(state),
            // Not list mutations
            TodoAction::StartEditing { .. }
            | TodoAction::CancelEditing
            | TodoAction::SetFilter { .. }
            | TodoAction::Persisted { .. } => return SmallVec::new(),
        };

        if changed || Self::save_pending(state) {
            smallvec![Self::persist(env, &state.todos)]
        } else {
            SmallVec::new()
        }
    }
}

/// Owns the filter, the editing selection and the save status
///
/// Runs after [`ListReducer`]: a selection whose todo was just deleted is
/// cleared.
#[derive(Clone, Copy, Debug, Default)]
pub struct SelectionReducer;

impl SelectionReducer {
    fn clear_editing_if(state: &mut TodoState, stale: impl FnOnce(&TodoId, &TodoState) -> bool) {
        let is_stale = state.editing.as_ref().is_some_and(|id| stale(id, state));
        if is_stale {
            tracing::debug!("Editing selection cleared");
            state.editing = None;
        }
    }
}

impl Reducer for SelectionReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TodoAction::StartEditing { id } => {
                tracing::debug!(%id, "Editing started");
                state.editing = Some(id);
            },
            TodoAction::CancelEditing | TodoAction::Update { .. } => {
                state.editing = None;
            },
            TodoAction::Remove { id } => {
                Self::clear_editing_if(state, |editing, _| editing == &id);
            },
            TodoAction::ClearCompleted => {
                Self::clear_editing_if(state, |editing, state| !state.exists(editing));
            },
            TodoAction::SetFilter { filter } => {
                tracing::debug!(%filter, "Filter changed");
                state.filter = filter;
            },
            TodoAction::Persisted { outcome } => {
                state.last_save = Some(outcome);
            },
            TodoAction::Add { .. } | TodoAction::Toggle { .. } | TodoAction::ToggleAll { .. } => {},
        }

        SmallVec::new()
    }
}

/// The todo application reducer: [`ListReducer`] then [`SelectionReducer`]
pub struct TodoReducer {
    inner: CombinedReducer<TodoState, TodoAction, TodoEnvironment>,
}

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub fn new() -> Self {
        let reducers: Vec<BoxedReducer<TodoState, TodoAction, TodoEnvironment>> =
            vec![Box::new(ListReducer), Box::new(SelectionReducer)];
        Self {
            inner: combine_reducers(reducers),
        }
    }
}

impl Default for TodoReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TodoReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TodoReducer").field(&self.inner).finish()
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.inner.reduce(state, action, env)
    }
}
