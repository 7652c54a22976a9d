//! Command-line walkthrough of the todo application.
//!
//! Persists to a directory under the system temp dir, so running it twice
//! shows the list surviving a restart. Set `RUST_LOG=debug` to see every
//! reduced action.

use anyhow::Context;
use todomvc::{Filter, SaveOutcome, Todo, TodoApp, TodoConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_list(heading: &str, todos: &[Todo]) {
    println!("\n{heading}:");
    if todos.is_empty() {
        println!("  (nothing)");
    }
    for todo in todos {
        let status = if todo.completed { "x" } else { " " };
        println!("  [{status}] {}", todo.title);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todomvc=info,reactive_atoms_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== TodoMVC ===");

    let config = TodoConfig::default().with_storage_dir(std::env::temp_dir().join("todomvc-demo"));
    let app = TodoApp::open_on_disk(config.clone()).await;
    if let Some(reason) = app.load_recovery() {
        println!("Stored list was unusable ({reason}), starting empty");
    }
    print_list("Loaded", &app.todos());

    app.add("Buy milk").await;
    app.add("  Buy eggs  ").await;
    app.add("   ").await;

    let eggs = app
        .todos()
        .into_iter()
        .rev()
        .find(|todo| todo.title == "Buy eggs")
        .context("freshly added todo is missing")?;
    app.toggle(&eggs.id).await;

    let views = app.views();
    print_list("All", &app.todos());
    println!(
        "\n{} active, {} completed, all completed: {}",
        views.active_count.get(),
        views.completed_count.get(),
        views.all_completed.get()
    );

    app.set_filter(Filter::Active).await;
    print_list(&format!("Filter {}", app.filter().fragment()), &views.filtered_todos.get());

    app.clear_completed().await;
    print_list("After clearing completed", &app.todos());

    match app.last_save().await {
        Some(SaveOutcome::Saved) => println!(
            "\nSaved to {}",
            config.file_storage().path_for(&config.storage_key).display()
        ),
        Some(SaveOutcome::Recovered { reason }) => println!("\nNot saved: {reason}"),
        None => println!("\nNothing to save"),
    }

    println!("\n=== Demo Complete ===");
    Ok(())
}
