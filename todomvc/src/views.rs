//! Derived views over the todo list.
//!
//! The pure functions are the definitions; [`TodoViews`] registers them as
//! atoms on a store so observers are notified only when a view changes.

use crate::TodoStore;
use crate::types::{Filter, Todo, TodoId, TodoState};
use reactive_atoms_core::Atom;

/// Entries visible under `filter`, in list order
#[must_use]
pub fn filtered_todos(todos: &[Todo], filter: Filter) -> Vec<Todo> {
    todos.iter().filter(|todo| filter.matches(todo)).cloned().collect()
}

/// Number of entries not yet completed
#[must_use]
pub fn active_count(todos: &[Todo]) -> usize {
    todos.iter().filter(|todo| !todo.completed).count()
}

/// Number of completed entries
#[must_use]
pub fn completed_count(todos: &[Todo]) -> usize {
    todos.iter().filter(|todo| todo.completed).count()
}

/// `true` for a non-empty list whose entries are all completed
#[must_use]
pub fn all_completed(todos: &[Todo]) -> bool {
    !todos.is_empty() && todos.iter().all(|todo| todo.completed)
}

/// Atoms for every cell and view of a todo store
#[derive(Clone, Debug)]
pub struct TodoViews {
    /// The todo list
    pub todos: Atom<Vec<Todo>>,
    /// The visibility filter
    pub filter: Atom<Filter>,
    /// The inline-edit selection
    pub editing: Atom<Option<TodoId>>,
    /// [`filtered_todos`] of `todos` under `filter`
    pub filtered_todos: Atom<Vec<Todo>>,
    /// [`active_count`] of `todos`
    pub active_count: Atom<usize>,
    /// [`completed_count`] of `todos`
    pub completed_count: Atom<usize>,
    /// [`all_completed`] of `todos`
    pub all_completed: Atom<bool>,
}

impl TodoViews {
    /// Register the source and derived atoms on `store`
    ///
    /// `all_completed` is derived from the two counts, so it is only
    /// re-evaluated when one of them moves.
    pub async fn register(store: &TodoStore) -> Self {
        let todos = store.atom("todos", |state: &TodoState| state.todos.clone()).await;
        let filter = store.atom("filter", |state: &TodoState| state.filter).await;
        let editing = store.atom("editing", |state: &TodoState| state.editing.clone()).await;

        let visible = {
            let (todos, filter) = (todos.clone(), filter.clone());
            store
                .derive("filtered_todos", move |get| {
                    let filter = get.get(&filter);
                    get.with(&todos, |todos: &Vec<Todo>| filtered_todos(todos, filter))
                })
                .await
        };

        let active = {
            let todos = todos.clone();
            store
                .derive("active_count", move |get| {
                    get.with(&todos, |todos: &Vec<Todo>| active_count(todos))
                })
                .await
        };

        let completed = {
            let todos = todos.clone();
            store
                .derive("completed_count", move |get| {
                    get.with(&todos, |todos: &Vec<Todo>| completed_count(todos))
                })
                .await
        };

        let everything_done = {
            let (active, completed) = (active.clone(), completed.clone());
            store
                .derive("all_completed", move |get| get.get(&completed) > 0 && get.get(&active) == 0)
                .await
        };

        Self {
            todos,
            filter,
            editing,
            filtered_todos: visible,
            active_count: active,
            completed_count: completed,
            all_completed: everything_done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Todo> {
        vec![
            Todo::new("1", "a"),
            Todo::new("2", "b").completed(),
            Todo::new("3", "c"),
            Todo::new("4", "d").completed(),
        ]
    }

    fn ids(todos: &[Todo]) -> Vec<&str> {
        todos.iter().map(|todo| todo.id.as_str()).collect()
    }

    #[test]
    fn test_filtered_todos_preserves_order() {
        let todos = sample();

        assert_eq!(filtered_todos(&todos, Filter::All), todos);
        assert_eq!(ids(&filtered_todos(&todos, Filter::Active)), ["1", "3"]);
        assert_eq!(ids(&filtered_todos(&todos, Filter::Completed)), ["2", "4"]);
    }

    #[test]
    fn test_counts() {
        let todos = sample();

        assert_eq!(active_count(&todos), 2);
        assert_eq!(completed_count(&todos), 2);
        assert_eq!(active_count(&[]), 0);
        assert_eq!(completed_count(&[]), 0);
    }

    #[test]
    fn test_all_completed() {
        assert!(!all_completed(&[]));
        assert!(!all_completed(&sample()));

        let done: Vec<Todo> = sample().into_iter().map(Todo::completed).collect();
        assert!(all_completed(&done));
    }
}
