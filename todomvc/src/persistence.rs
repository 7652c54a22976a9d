//! Loading and saving the todo list.
//!
//! The list lives under one storage key as a JSON array of
//! `{"id", "title", "completed"}` records, rewritten in full on every save.
//! Neither direction ever fails: storage faults and corrupt data are
//! recovered and reported through [`LoadOutcome`] and [`SaveOutcome`].

use crate::types::Todo;
use reactive_atoms_core::environment::Storage;
use std::collections::HashSet;

/// Storage key used when none is configured
pub const DEFAULT_STORAGE_KEY: &str = "todos-effect-atom";

/// Result of reading the persisted list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A list was read (possibly repaired, possibly empty)
    Loaded(Vec<Todo>),
    /// Nothing is stored under the key
    Missing,
    /// The stored value could not be read or parsed; start empty
    Recovered {
        /// What went wrong
        reason: String,
    },
}

impl LoadOutcome {
    /// The list to start the session with
    #[must_use]
    pub fn into_todos(self) -> Vec<Todo> {
        match self {
            Self::Loaded(todos) => todos,
            Self::Missing | Self::Recovered { .. } => Vec::new(),
        }
    }

    /// Why the stored value was discarded, if it was
    #[must_use]
    pub fn recovery_reason(&self) -> Option<&str> {
        match self {
            Self::Recovered { reason } => Some(reason),
            Self::Loaded(_) | Self::Missing => None,
        }
    }
}

/// Result of writing the list
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The full list was written
    Saved,
    /// The write failed and was ignored; memory stays authoritative
    Recovered {
        /// What went wrong
        reason: String,
    },
}

impl SaveOutcome {
    /// Returns `true` if the write reached storage
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// Read the list stored under `key`
///
/// Records are repaired on the way in: titles are trimmed, records with a
/// blank title are dropped, and only the first record of each id is kept.
pub fn load(storage: &dyn Storage, key: &str) -> LoadOutcome {
    let raw = match storage.read(key) {
        Ok(Some(raw)) if !raw.trim().is_empty() => raw,
        Ok(_) => {
            tracing::debug!(key, "No persisted todos");
            return LoadOutcome::Missing;
        },
        Err(error) => {
            tracing::warn!(key, %error, "Failed to read persisted todos, starting empty");
            return LoadOutcome::Recovered {
                reason: error.to_string(),
            };
        },
    };

    match serde_json::from_str::<Vec<Todo>>(&raw) {
        Ok(todos) => {
            let todos = normalize(todos);
            tracing::debug!(key, count = todos.len(), "Loaded persisted todos");
            LoadOutcome::Loaded(todos)
        },
        Err(error) => {
            tracing::warn!(key, %error, "Persisted todos are corrupt, starting empty");
            LoadOutcome::Recovered {
                reason: format!("invalid todo list: {error}"),
            }
        },
    }
}

/// Write the whole list under `key`
pub fn save(storage: &dyn Storage, key: &str, todos: &[Todo]) -> SaveOutcome {
    let blob = match serde_json::to_string(todos) {
        Ok(blob) => blob,
        Err(error) => {
            tracing::warn!(key, %error, "Failed to encode todos, keeping them in memory only");
            return SaveOutcome::Recovered {
                reason: error.to_string(),
            };
        },
    };

    match storage.write(key, &blob) {
        Ok(()) => {
            tracing::trace!(key, count = todos.len(), "Todos saved");
            SaveOutcome::Saved
        },
        Err(error) => {
            tracing::warn!(key, %error, "Failed to save todos, keeping them in memory only");
            SaveOutcome::Recovered {
                reason: error.to_string(),
            }
        },
    }
}

fn normalize(todos: Vec<Todo>) -> Vec<Todo> {
    let read = todos.len();
    let mut seen = HashSet::with_capacity(read);

    let kept: Vec<Todo> = todos
        .into_iter()
        .filter_map(|mut todo| {
            let title = todo.title.trim();
            if title.is_empty() || !seen.insert(todo.id.clone()) {
                return None;
            }
            if title.len() != todo.title.len() {
                todo.title = title.to_string();
            }
            Some(todo)
        })
        .collect();

    if kept.len() != read {
        tracing::warn!(
            dropped = read - kept.len(),
            "Dropped persisted todos with blank titles or duplicate ids"
        );
    }
    kept
}
