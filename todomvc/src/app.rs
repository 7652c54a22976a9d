//! The todo application: a store, its views and the operations on them.

use crate::TodoStore;
use crate::config::TodoConfig;
use crate::ids::RandomIds;
use crate::persistence::{self, LoadOutcome, SaveOutcome};
use crate::reducer::{TodoEnvironment, TodoReducer};
use crate::types::{Filter, Todo, TodoAction, TodoId, TodoState};
use crate::views::TodoViews;
use reactive_atoms_core::environment::{IdGenerator, Storage};
use reactive_atoms_runtime::{Store, StoreConfig};
use std::sync::Arc;

/// A loaded todo list with its derived views
///
/// Every operation is total: unknown ids and blank titles are ignored, and
/// storage failures are recorded in [`TodoApp::last_save`] instead of being
/// returned.
///
/// # Example
///
/// ```no_run
/// use todomvc::{Filter, TodoApp, TodoConfig};
///
/// # async fn demo() {
/// let app = TodoApp::open_on_disk(TodoConfig::default()).await;
/// app.add("Buy milk").await;
/// app.set_filter(Filter::Active).await;
/// assert_eq!(app.views().active_count.get(), 1);
/// # }
/// ```
#[derive(Clone)]
pub struct TodoApp {
    store: TodoStore,
    views: TodoViews,
    load_recovery: Option<String>,
}

impl std::fmt::Debug for TodoApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoApp")
            .field("environment", self.store.environment())
            .field("views", &self.views)
            .field("load_recovery", &self.load_recovery)
            .finish_non_exhaustive()
    }
}

impl TodoApp {
    /// Load the list from `storage` and build the store around it
    ///
    /// A missing or unreadable list starts the session empty; the reason for
    /// discarding stored data is kept in [`TodoApp::load_recovery`]. A
    /// `max_feedback_depth` of 0 is raised to 1 so save results still land.
    pub async fn open(config: TodoConfig, storage: Arc<dyn Storage>, ids: Arc<dyn IdGenerator>) -> Self {
        let outcome = persistence::load(storage.as_ref(), &config.storage_key);
        let load_recovery = outcome.recovery_reason().map(str::to_string);
        if matches!(outcome, LoadOutcome::Missing) {
            tracing::info!(key = %config.storage_key, "Starting with an empty todo list");
        }

        let state = TodoState::with_todos(outcome.into_todos());
        tracing::info!(key = %config.storage_key, todos = state.count(), "Todo store ready");

        // Each write reports back through one generation of feedback
        let store_config = if config.store.max_feedback_depth == 0 {
            tracing::warn!("max_feedback_depth of 0 would drop save results, using 1");
            StoreConfig {
                max_feedback_depth: 1,
                ..config.store
            }
        } else {
            config.store
        };

        let environment = TodoEnvironment::new(ids, storage, config.storage_key);
        let store = Store::with_config(state, TodoReducer::new(), environment, store_config);
        let views = TodoViews::register(&store).await;

        Self {
            store,
            views,
            load_recovery,
        }
    }

    /// [`TodoApp::open`] with [`crate::FileStorage`] in the configured directory and random ids
    pub async fn open_on_disk(config: TodoConfig) -> Self {
        let storage = Arc::new(config.file_storage());
        Self::open(config, storage, Arc::new(RandomIds::new())).await
    }

    /// Apply one action
    ///
    /// Returns once the action, its persistence write and the resulting
    /// feedback have all been reduced.
    pub async fn dispatch(&self, action: TodoAction) {
        if let Err(error) = self.store.send(action).await {
            tracing::error!(%error, "Todo action aborted");
        }
    }

    /// Append a todo; blank titles are ignored
    pub async fn add(&self, title: &str) {
        self.dispatch(TodoAction::Add {
            title: title.to_string(),
        })
        .await;
    }

    /// Flip the completed flag of `id`
    pub async fn toggle(&self, id: &TodoId) {
        self.dispatch(TodoAction::Toggle { id: id.clone() }).await;
    }

    /// Delete `id`
    pub async fn remove(&self, id: &TodoId) {
        self.dispatch(TodoAction::Remove { id: id.clone() }).await;
    }

    /// Commit an inline edit of `id`; a blank title deletes it
    pub async fn update(&self, id: &TodoId, title: &str) {
        self.dispatch(TodoAction::Update {
            id: id.clone(),
            title: title.to_string(),
        })
        .await;
    }

    /// Set the completed flag of every todo
    pub async fn toggle_all(&self, completed: bool) {
        self.dispatch(TodoAction::ToggleAll { completed }).await;
    }

    /// Delete every completed todo
    pub async fn clear_completed(&self) {
        self.dispatch(TodoAction::ClearCompleted).await;
    }

    /// Put `id` in inline-edit mode
    pub async fn start_editing(&self, id: &TodoId) {
        self.dispatch(TodoAction::StartEditing { id: id.clone() }).await;
    }

    /// Leave inline-edit mode
    pub async fn cancel_editing(&self) {
        self.dispatch(TodoAction::CancelEditing).await;
    }

    /// Show a different subset of the list
    pub async fn set_filter(&self, filter: Filter) {
        self.dispatch(TodoAction::SetFilter { filter }).await;
    }

    /// Current list, in display order
    #[must_use]
    pub fn todos(&self) -> Vec<Todo> {
        self.views.todos.get()
    }

    /// Current filter
    #[must_use]
    pub fn filter(&self) -> Filter {
        self.views.filter.get()
    }

    /// Current inline-edit selection
    #[must_use]
    pub fn editing(&self) -> Option<TodoId> {
        self.views.editing.get()
    }

    /// Atoms for every cell and view
    #[must_use]
    pub const fn views(&self) -> &TodoViews {
        &self.views
    }

    /// Outcome of the latest persistence write, if any happened
    pub async fn last_save(&self) -> Option<SaveOutcome> {
        self.store.state(|state| state.last_save.clone()).await
    }

    /// Why the stored list was discarded at startup, if it was
    #[must_use]
    pub fn load_recovery(&self) -> Option<&str> {
        self.load_recovery.as_deref()
    }

    /// The underlying store
    #[must_use]
    pub const fn store(&self) -> &TodoStore {
        &self.store
    }
}
