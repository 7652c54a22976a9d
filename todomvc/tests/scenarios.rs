//! End-to-end scenarios through `TodoApp`
//!
//! Every scenario runs against in-memory storage with predictable ids, except
//! the restart scenarios, which go through real files.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use reactive_atoms_runtime::StoreConfig;
use reactive_atoms_testing::{MemoryStorage, SequentialIds, init_tracing};
use std::sync::Arc;
use todomvc::{
    DEFAULT_STORAGE_KEY, FileStorage, Filter, LoadOutcome, SaveOutcome, Todo, TodoAction, TodoApp,
    TodoConfig, TodoId, persistence,
};

// ============================================================================
// Fixtures
// ============================================================================

async fn open(storage: &Arc<MemoryStorage>) -> TodoApp {
    init_tracing();
    TodoApp::open(TodoConfig::default(), storage.clone(), Arc::new(SequentialIds::new())).await
}

fn titles(todos: &[Todo]) -> Vec<&str> {
    todos.iter().map(|todo| todo.title.as_str()).collect()
}

fn id_of(app: &TodoApp, title: &str) -> TodoId {
    app.todos()
        .into_iter()
        .find(|todo| todo.title == title)
        .map(|todo| todo.id)
        .expect("todo should exist")
}

// ============================================================================
// Walkthrough
// ============================================================================

#[tokio::test]
async fn test_add_toggle_filter_clear() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    let views = app.views().clone();

    app.add("Buy milk").await;
    app.add("  Buy eggs  ").await;

    assert_eq!(titles(&app.todos()), ["Buy milk", "Buy eggs"]);
    assert!(app.todos().iter().all(|todo| !todo.completed));
    assert_eq!(views.active_count.get(), 2);
    assert_eq!(views.completed_count.get(), 0);

    app.toggle(&id_of(&app, "Buy eggs")).await;

    assert_eq!(views.completed_count.get(), 1);
    assert!(!views.all_completed.get());

    app.set_filter(Filter::Active).await;
    assert_eq!(titles(&views.filtered_todos.get()), ["Buy milk"]);

    app.clear_completed().await;
    assert_eq!(titles(&app.todos()), ["Buy milk"]);

    // add, add, toggle, clear
    assert_eq!(storage.writes(), 4);
    assert_eq!(app.last_save().await, Some(SaveOutcome::Saved));
    assert_eq!(
        persistence::load(storage.as_ref(), DEFAULT_STORAGE_KEY),
        LoadOutcome::Loaded(vec![Todo::new("todo-1", "Buy milk")])
    );
}

// ============================================================================
// Operations
// ============================================================================

#[tokio::test]
async fn test_blank_add_writes_nothing() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;

    app.add("").await;
    app.add("   \n").await;

    assert!(app.todos().is_empty());
    assert_eq!(storage.writes(), 0);
    assert_eq!(app.last_save().await, None);
}

#[tokio::test]
async fn test_same_title_twice_gets_distinct_ids() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;

    app.add("Buy milk").await;
    app.add("Buy milk").await;

    let todos = app.todos();
    assert_eq!(titles(&todos), ["Buy milk", "Buy milk"]);
    assert_ne!(todos[0].id, todos[1].id);
}

#[tokio::test]
async fn test_toggle_twice_restores() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    app.add("Buy milk").await;
    let before = app.todos();

    let id = id_of(&app, "Buy milk");
    app.toggle(&id).await;
    assert!(app.todos()[0].completed);
    app.toggle(&id).await;

    assert_eq!(app.todos(), before);
}

#[tokio::test]
async fn test_unknown_ids_are_ignored() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    app.add("Buy milk").await;
    let writes = storage.writes();

    let ghost = TodoId::from("ghost");
    app.toggle(&ghost).await;
    app.remove(&ghost).await;
    app.update(&ghost, "Renamed").await;

    assert_eq!(titles(&app.todos()), ["Buy milk"]);
    assert_eq!(storage.writes(), writes);
}

#[tokio::test]
async fn test_editing_lifecycle() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    app.add("Buy milk").await;
    app.add("Buy eggs").await;
    let milk = id_of(&app, "Buy milk");

    app.start_editing(&milk).await;
    assert_eq!(app.editing(), Some(milk.clone()));

    app.cancel_editing().await;
    assert_eq!(app.editing(), None);

    app.start_editing(&milk).await;
    app.update(&milk, "  Buy oat milk ").await;
    assert_eq!(app.editing(), None);
    assert_eq!(titles(&app.todos()), ["Buy oat milk", "Buy eggs"]);
}

#[tokio::test]
async fn test_blank_update_removes_and_clears_selection() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    app.add("Buy milk").await;
    app.add("Buy eggs").await;
    let eggs = id_of(&app, "Buy eggs");

    app.start_editing(&eggs).await;
    app.update(&eggs, "   ").await;

    assert_eq!(titles(&app.todos()), ["Buy milk"]);
    assert_eq!(app.editing(), None);
}

#[tokio::test]
async fn test_removing_edited_todo_clears_selection() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    app.add("Buy milk").await;
    let milk = id_of(&app, "Buy milk");

    app.start_editing(&milk).await;
    app.remove(&milk).await;
    assert_eq!(app.editing(), None);

    app.add("Buy eggs").await;
    let eggs = id_of(&app, "Buy eggs");
    app.toggle(&eggs).await;
    app.start_editing(&eggs).await;
    app.clear_completed().await;

    assert!(app.todos().is_empty());
    assert_eq!(app.editing(), None);
}

#[tokio::test]
async fn test_toggle_all() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    let views = app.views().clone();
    for title in ["a", "b", "c"] {
        app.add(title).await;
    }
    app.toggle(&id_of(&app, "b")).await;

    app.toggle_all(true).await;
    assert!(views.all_completed.get());
    assert_eq!(views.completed_count.get(), 3);

    app.toggle_all(false).await;
    assert_eq!(views.active_count.get(), 3);
    assert!(!views.all_completed.get());

    let writes = storage.writes();
    app.toggle_all(false).await;
    assert_eq!(storage.writes(), writes, "unchanged list must not be written");
}

#[tokio::test]
async fn test_filter_fragments_round_trip_through_app() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;

    for fragment in ["#/completed", "#/active", "#/"] {
        app.set_filter(Filter::from_fragment(fragment)).await;
        assert_eq!(app.filter().fragment(), fragment);
    }
    assert_eq!(storage.writes(), 0);
}

// ============================================================================
// Views and observers
// ============================================================================

#[tokio::test]
async fn test_atoms_register_in_dependency_order() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;

    assert_eq!(
        app.store().atom_names().await,
        [
            "todos",
            "filter",
            "editing",
            "filtered_todos",
            "active_count",
            "completed_count",
            "all_completed"
        ]
    );
}

#[tokio::test]
async fn test_filter_change_leaves_counts_untouched() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    app.add("Buy milk").await;
    app.add("Buy eggs").await;
    app.toggle(&id_of(&app, "Buy eggs")).await;

    let views = app.views();
    let mut active = views.active_count.subscribe();
    let mut done = views.all_completed.subscribe();
    let mut visible = views.filtered_todos.subscribe();

    app.set_filter(Filter::Completed).await;

    assert!(!active.has_changed().unwrap());
    assert!(!done.has_changed().unwrap());
    assert!(visible.has_changed().unwrap());
    assert_eq!(titles(&visible.borrow_and_update()), ["Buy eggs"]);

    app.toggle(&id_of(&app, "Buy milk")).await;

    assert!(active.has_changed().unwrap());
    assert_eq!(*active.borrow_and_update(), 0);
    assert!(done.has_changed().unwrap());
    assert!(*done.borrow_and_update());
}

#[tokio::test]
async fn test_views_agree_with_list_after_every_turn() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    let views = app.views().clone();

    app.add("a").await;
    app.add("b").await;
    app.toggle(&id_of(&app, "a")).await;
    app.set_filter(Filter::Active).await;
    app.remove(&id_of(&app, "b")).await;

    let todos = app.todos();
    assert_eq!(views.active_count.get(), todomvc::views::active_count(&todos));
    assert_eq!(views.completed_count.get(), todomvc::views::completed_count(&todos));
    assert_eq!(views.all_completed.get(), todomvc::views::all_completed(&todos));
    assert_eq!(views.filtered_todos.get(), todomvc::views::filtered_todos(&todos, Filter::Active));
}

#[tokio::test]
async fn test_applied_actions_include_persistence_feedback() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    let mut actions = app.store().subscribe_actions();

    app.add("Buy milk").await;
    app.set_filter(Filter::Active).await;

    assert_eq!(
        actions.recv().await.unwrap(),
        TodoAction::Add {
            title: "Buy milk".to_string()
        }
    );
    assert_eq!(
        actions.recv().await.unwrap(),
        TodoAction::Persisted {
            outcome: SaveOutcome::Saved
        }
    );
    assert_eq!(
        actions.recv().await.unwrap(),
        TodoAction::SetFilter {
            filter: Filter::Active
        }
    );
}

#[tokio::test]
async fn test_concurrent_adds_are_serialized() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;

    let handles: Vec<_> = (0..10)
        .map(|n| {
            let app = app.clone();
            tokio::spawn(async move { app.add(&format!("task {n}")).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(app.todos().len(), 10);
    assert_eq!(storage.writes(), 10);
    assert_eq!(
        persistence::load(storage.as_ref(), DEFAULT_STORAGE_KEY).into_todos(),
        app.todos()
    );
}

// ============================================================================
// Persistence and recovery
// ============================================================================

#[tokio::test]
async fn test_session_restores_list_but_not_selection() {
    let storage = Arc::new(MemoryStorage::new());
    let first = open(&storage).await;
    first.add("Buy milk").await;
    first.add("Buy eggs").await;
    first.toggle(&id_of(&first, "Buy eggs")).await;
    first.set_filter(Filter::Completed).await;
    first.start_editing(&id_of(&first, "Buy milk")).await;

    let second = TodoApp::open(
        TodoConfig::default(),
        storage.clone(),
        Arc::new(SequentialIds::with_prefix("later")),
    )
    .await;

    assert_eq!(second.todos(), first.todos());
    assert_eq!(second.filter(), Filter::All);
    assert_eq!(second.editing(), None);
    assert_eq!(second.load_recovery(), None);
}

#[tokio::test]
async fn test_corrupt_storage_starts_empty() {
    let storage = Arc::new(MemoryStorage::new().with_entry(DEFAULT_STORAGE_KEY, "{not json"));
    let app = open(&storage).await;

    assert!(app.todos().is_empty());
    assert!(app.load_recovery().is_some());

    app.add("Buy milk").await;
    assert_eq!(
        persistence::load(storage.as_ref(), DEFAULT_STORAGE_KEY),
        LoadOutcome::Loaded(vec![Todo::new("todo-1", "Buy milk")])
    );
}

#[tokio::test]
async fn test_failed_write_keeps_memory_authoritative() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    storage.fail_writes(true);

    app.add("Buy milk").await;

    assert_eq!(titles(&app.todos()), ["Buy milk"]);
    assert!(matches!(app.last_save().await, Some(SaveOutcome::Recovered { .. })));
    assert_eq!(storage.entry(DEFAULT_STORAGE_KEY), None);

    storage.fail_writes(false);
    app.add("Buy eggs").await;

    assert_eq!(app.last_save().await, Some(SaveOutcome::Saved));
    assert_eq!(
        persistence::load(storage.as_ref(), DEFAULT_STORAGE_KEY).into_todos(),
        app.todos()
    );
}

#[tokio::test]
async fn test_noop_after_failed_write_catches_storage_up() {
    let storage = Arc::new(MemoryStorage::new());
    let app = open(&storage).await;
    storage.fail_writes(true);
    app.add("Buy milk").await;
    storage.fail_writes(false);

    app.toggle_all(false).await;

    assert_eq!(app.last_save().await, Some(SaveOutcome::Saved));
    assert_eq!(
        persistence::load(storage.as_ref(), DEFAULT_STORAGE_KEY).into_todos(),
        app.todos()
    );

    // Storage is current again, so the next no-op stays silent
    let writes = storage.writes();
    app.toggle_all(false).await;
    assert_eq!(storage.writes(), writes);
}

#[tokio::test]
async fn test_zero_feedback_depth_still_records_saves() {
    init_tracing();
    let storage = Arc::new(MemoryStorage::new());
    let config = TodoConfig::default().with_store(StoreConfig::default().with_max_feedback_depth(0));
    let app = TodoApp::open(config, storage.clone(), Arc::new(SequentialIds::new())).await;

    app.add("Buy milk").await;

    assert_eq!(app.store().config().max_feedback_depth, 1);
    assert_eq!(storage.writes(), 1);
    assert_eq!(app.last_save().await, Some(SaveOutcome::Saved));
}

#[tokio::test]
async fn test_custom_storage_key() {
    let storage = Arc::new(MemoryStorage::new());
    let config = TodoConfig::default().with_storage_key("todos-work");
    let app = TodoApp::open(config, storage.clone(), Arc::new(SequentialIds::new())).await;

    app.add("Ship it").await;

    assert!(storage.entry("todos-work").is_some());
    assert_eq!(storage.entry(DEFAULT_STORAGE_KEY), None);
}

#[tokio::test]
async fn test_restart_from_files() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = TodoConfig::default().with_storage_dir(dir.path());

    let first = TodoApp::open_on_disk(config.clone()).await;
    first.add("Buy milk").await;
    first.add("Buy eggs").await;
    first.toggle(&id_of(&first, "Buy milk")).await;
    assert!(config.file_storage().path_for(DEFAULT_STORAGE_KEY).exists());

    let second = TodoApp::open(
        config.clone(),
        Arc::new(FileStorage::new(dir.path())),
        Arc::new(SequentialIds::new()),
    )
    .await;

    assert_eq!(second.todos(), first.todos());
    assert!(second.todos()[0].completed);
    assert!(uuid::Uuid::parse_str(second.todos()[0].id.as_str()).is_ok());
}
