use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::{Local, Utc};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::commands::{self, Command, Outcome};
use crate::html;
use crate::query;
use crate::store::{self, TaskFields, TaskStore};
use crate::types::{Priority, Task};

/// Application state shared across requests
pub struct AppState {
    pub store: RwLock<TaskStore>,
}

/// Start the web server over the store in `data_dir`
pub async fn serve(port: u16, data_dir: PathBuf) -> anyhow::Result<()> {
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
    let store_path = data_dir.join(store::STORE_FILE);
    let store = TaskStore::load(&store_path).context("Failed to load task store")?;

    // One-shot deadline check at startup
    let due = query::due_soon(store.tasks(), Local::now().date_naive());
    if !due.is_empty() {
        warn!(count = due.len(), "Tasks due today or tomorrow");
    }
    info!(count = store.len(), path = %store_path.display(), "Task store ready");

    let state = Arc::new(AppState {
        store: RwLock::new(store),
    });

    start_file_watcher(state.clone(), store_path)?;

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!("\nServer running at http://{}", addr);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/tasks", post(create_handler))
        .route("/tasks/{id}/toggle", post(toggle_handler))
        .route("/tasks/{id}/delete", post(delete_handler))
        .route("/tasks/{id}/edit", get(edit_form_handler).post(edit_submit_handler))
        .route("/calendar", get(calendar_handler))
        .route("/export", get(export_handler))
        .route("/api/tasks", get(api_tasks_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Watch the store file and reload the collection when it changes on
/// disk outside this process
fn start_file_watcher(state: Arc<AppState>, store_path: PathBuf) -> anyhow::Result<()> {
    let watch_dir = store_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = store_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(store::STORE_FILE)
        .to_string();

    // Create a channel to receive events
    let (tx, mut rx) = tokio::sync::mpsc::channel(10);

    // Spawn a blocking task for the file watcher
    std::thread::spawn(move || {
        let tx_clone = tx.clone();
        let mut debouncer = new_debouncer(
            Duration::from_secs(2),
            move |result: DebounceEventResult| {
                if let Ok(events) = result {
                    let store_changed = events.iter().any(|e| {
                        e.path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .map(|n| n == file_name)
                            .unwrap_or(false)
                    });

                    if store_changed {
                        let _ = tx_clone.blocking_send(());
                    }
                }
            },
        )
        .expect("Failed to create debouncer");

        debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .expect("Failed to watch data directory");

        // Keep the watcher alive
        loop {
            std::thread::sleep(Duration::from_secs(60));
        }
    });

    // Spawn a task to handle file change notifications
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            // Reload under the write lock; a racing mutation must not
            // be clobbered by stale file contents.
            let mut store = state.store.write().await;
            match store.reload() {
                Ok(count) => debug!(count, "Store file changed on disk, reloaded"),
                Err(e) => warn!(error = %e, "Failed to reload store file"),
            }
        }
    });

    Ok(())
}

/// Apply a command under the write lock, log the outcome, redirect home
async fn run_command(state: &AppState, command: Command) -> Response {
    let mut store = state.store.write().await;
    match commands::apply(&mut store, command, Utc::now().timestamp_millis()) {
        Ok(Outcome::Created(task)) => info!(id = task.id, subject = %task.subject, "Task created"),
        Ok(Outcome::Replaced(task)) => info!(id = task.id, "Task replaced"),
        Ok(Outcome::Toggled { id, completed }) => info!(id, completed, "Task toggled"),
        Ok(Outcome::Deleted { id }) => info!(id, "Task deleted"),
        Ok(Outcome::NotFound { id }) => warn!(id, "No task with this id"),
        Err(e) => {
            error!(error = %e, "Store operation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "store failure").into_response();
        }
    }
    Redirect::to("/").into_response()
}

#[derive(Debug, Deserialize)]
struct IndexParams {
    q: Option<String>,
}

/// Serve the main tracker page
async fn index_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IndexParams>,
) -> Html<String> {
    let store = state.store.read().await;
    let filter = params.q.unwrap_or_default();
    let markup = html::render_page(store.tasks(), &filter, Local::now().date_naive());
    Html(markup.into_string())
}

#[derive(Debug, Deserialize)]
struct TaskForm {
    name: String,
    deadline: String,
    priority: Priority,
    subject: String,
}

impl TaskForm {
    fn into_fields(self) -> TaskFields {
        TaskFields {
            name: self.name,
            deadline: self.deadline,
            priority: self.priority,
            subject: self.subject,
        }
    }
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TaskForm>,
) -> Response {
    run_command(&state, Command::Create(form.into_fields())).await
}

async fn toggle_handler(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    run_command(&state, Command::Toggle { id }).await
}

async fn delete_handler(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    run_command(&state, Command::Delete { id }).await
}

/// Serve the pre-filled edit form for one task
async fn edit_form_handler(State(state): State<Arc<AppState>>, Path(id): Path<i64>) -> Response {
    let store = state.store.read().await;
    match store.get(id) {
        Some(task) => Html(html::render_edit_page(task).into_string()).into_response(),
        None => (StatusCode::NOT_FOUND, "no such task").into_response(),
    }
}

async fn edit_submit_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<TaskForm>,
) -> Response {
    run_command(
        &state,
        Command::Edit {
            id,
            fields: form.into_fields(),
        },
    )
    .await
}

#[derive(Debug, Deserialize)]
struct CalendarParams {
    date: Option<String>,
}

/// Serve the per-date calendar view, defaulting to today
async fn calendar_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CalendarParams>,
) -> Html<String> {
    let date = params
        .date
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string());

    let store = state.store.read().await;
    let matches = query::tasks_on(store.tasks(), &date);
    Html(html::render_calendar_page(&date, &matches).into_string())
}

/// Download the collection as a pretty-printed JSON file
async fn export_handler(State(state): State<Arc<AppState>>) -> Response {
    let store = state.store.read().await;
    match serde_json::to_string_pretty(store.tasks()) {
        Ok(json) => (
            [
                (header::CONTENT_TYPE, "application/json"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"study-tasks.json\"",
                ),
            ],
            json,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to serialize tasks");
            (StatusCode::INTERNAL_SERVER_ERROR, "export failure").into_response()
        }
    }
}

/// Return the collection as JSON
async fn api_tasks_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Task>> {
    let store = state.store.read().await;
    Json(store.tasks().to_vec())
}
