//! # `TodoMVC` on Reactive Atoms
//!
//! The state core of a `TodoMVC` application: an ordered todo list, a
//! visibility filter and an inline-edit selection, held in a
//! [`reactive_atoms_runtime::Store`] and observed through atoms.
//!
//! - [`types`]: todos, filter, state and actions
//! - [`reducer`]: the list and selection reducers
//! - [`views`]: filtered list, counts and `all_completed`
//! - [`persistence`]: loading and saving the list as JSON
//! - [`app`]: [`TodoApp`], one method per user operation
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use todomvc::{FileStorage, RandomIds, TodoApp, TodoConfig};
//!
//! # async fn demo() {
//! let config = TodoConfig::default();
//! let app = TodoApp::open(config, Arc::new(FileStorage::new(".todomvc")), Arc::new(RandomIds::new())).await;
//!
//! app.add("Buy milk").await;
//! app.add("  Buy eggs  ").await;
//!
//! assert_eq!(app.views().active_count.get(), 2);
//! # }
//! ```

pub mod app;
pub mod config;
pub mod ids;
pub mod persistence;
pub mod reducer;
pub mod storage;
pub mod types;
pub mod views;

pub use app::TodoApp;
pub use config::TodoConfig;
pub use ids::{RandomIds, TimestampIds};
pub use persistence::{DEFAULT_STORAGE_KEY, LoadOutcome, SaveOutcome};
pub use reducer::{ListReducer, SelectionReducer, TodoEnvironment, TodoReducer};
pub use storage::FileStorage;
pub use types::{Filter, Todo, TodoAction, TodoId, TodoState};
pub use views::TodoViews;

/// Store running the todo reducers
pub type TodoStore = reactive_atoms_runtime::Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;
