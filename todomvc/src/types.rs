//! Domain types for the TodoMVC state core.
//!
//! The state holds three independently observable cells: the ordered todo
//! list, the visibility filter and the inline-edit selection. Only the list
//! is ever persisted.

use crate::persistence::SaveOutcome;
use serde::{Deserialize, Serialize};

/// Opaque, immutable identifier of a todo
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Wrap an identifier produced by an `IdGenerator` (or read from storage)
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TodoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single todo item
///
/// Serialized as `{"id": "...", "title": "...", "completed": false}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier
    pub id: TodoId,
    /// Trimmed, non-empty title
    pub title: String,
    /// Whether the todo is completed
    pub completed: bool,
}

impl Todo {
    /// Creates a new, active todo
    #[must_use]
    pub fn new(id: impl Into<TodoId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
        }
    }

    /// Same todo, marked completed
    #[must_use]
    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }
}

/// Which subset of the list is visible
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Every todo
    #[default]
    All,
    /// Todos not yet completed
    Active,
    /// Completed todos
    Completed,
}

impl Filter {
    /// Returns `true` if `todo` is visible under this filter
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }

    /// Filter selected by a navigation fragment (`#/`, `#/active`, `#/completed`)
    ///
    /// Unknown fragments select [`Filter::All`].
    #[must_use]
    pub fn from_fragment(fragment: &str) -> Self {
        match fragment.trim_start_matches('#').trim_start_matches('/') {
            "active" => Self::Active,
            "completed" => Self::Completed,
            _ => Self::All,
        }
    }

    /// Navigation fragment selecting this filter
    #[must_use]
    pub const fn fragment(self) -> &'static str {
        match self {
            Self::All => "#/",
            Self::Active => "#/active",
            Self::Completed => "#/completed",
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the todo application
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoState {
    /// Todos in display order
    pub todos: Vec<Todo>,
    /// Current visibility filter
    pub filter: Filter,
    /// Todo currently in inline-edit mode
    pub editing: Option<TodoId>,
    /// Outcome of the most recent persistence write
    pub last_save: Option<SaveOutcome>,
}

impl TodoState {
    /// Creates a new empty todo state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh session state over a loaded list
    ///
    /// Filter and editing selection always start at their defaults.
    #[must_use]
    pub fn with_todos(todos: Vec<Todo>) -> Self {
        Self {
            todos,
            ..Self::default()
        }
    }

    /// Returns the number of todos
    #[must_use]
    pub fn count(&self) -> usize {
        self.todos.len()
    }

    /// Returns a todo by ID
    #[must_use]
    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| &todo.id == id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn exists(&self, id: &TodoId) -> bool {
        self.get(id).is_some()
    }
}

/// Every input the todo reducers accept
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoAction {
    /// Append a todo with the given (untrimmed) title
    Add {
        /// Raw title as typed
        title: String,
    },

    /// Flip the completed flag of a todo
    Toggle {
        /// Todo to toggle
        id: TodoId,
    },

    /// Delete a todo
    Remove {
        /// Todo to delete
        id: TodoId,
    },

    /// Commit an inline edit; a blank title deletes the todo
    Update {
        /// Todo being edited
        id: TodoId,
        /// Raw title as typed
        title: String,
    },

    /// Set the completed flag of every todo
    ToggleAll {
        /// Desired flag
        completed: bool,
    },

    /// Delete every completed todo
    ClearCompleted,

    /// Put a todo in inline-edit mode
    StartEditing {
        /// Todo to edit
        id: TodoId,
    },

    /// Leave inline-edit mode without committing
    CancelEditing,

    /// Change the visibility filter
    SetFilter {
        /// Filter to show
        filter: Filter,
    },

    /// Feedback: the list was written to storage (or the write was recovered)
    Persisted {
        /// What happened to the write
        outcome: SaveOutcome,
    },
}
