use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::error::TaskError;
use crate::models::{NewTask, Task, TaskFilter, TaskId, TaskUpdate};
use crate::store::{MemoryTaskStore, TaskStore};

/// Shared state passed to the handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryTaskStore>,
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let status = match &self {
            TaskError::NotFound(_) => StatusCode::NOT_FOUND,
            TaskError::Validation(_) => StatusCode::BAD_REQUEST,
            TaskError::Transport(_) => StatusCode::BAD_GATEWAY,
            TaskError::Storage(_) | TaskError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the router exposing the task store under `/api/tasks`.
pub fn build_router(store: Arc<MemoryTaskStore>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .with_state(AppState { store })
        .layer(CorsLayer::permissive())
}

/// Handle returned by [`start`]; the server stops when it is shut down or dropped with the runtime.
pub struct ServerHandle {
    pub addr: SocketAddr,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn shutdown(self) {
        self.server.abort();
    }
}

/// Binds `addr` and serves in a background task.
pub async fn start(addr: &str, store: Arc<MemoryTaskStore>) -> std::io::Result<ServerHandle> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    let router = build_router(store);

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "server stopped");
        }
    });

    tracing::info!(addr = %local_addr, "task server started");
    Ok(ServerHandle { addr: local_addr, server })
}

/// Serves until ctrl-c.
pub async fn run(addr: &str) -> std::io::Result<()> {
    let store = Arc::new(MemoryTaskStore::new());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "task server listening");

    axum::serve(listener, build_router(store))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await?;

    tracing::info!("shutting down");
    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_tasks(
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<Task>>, TaskError> {
    let tasks = state.store.list().await?;
    Ok(Json(filter.apply(tasks)))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<Task>, TaskError> {
    Ok(Json(state.store.get(id).await?))
}

async fn create_task(
    State(state): State<AppState>,
    Json(new_task): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), TaskError> {
    let task = state.store.create(new_task).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    Json(update): Json<TaskUpdate>,
) -> Result<Json<Task>, TaskError> {
    Ok(Json(state.store.update(id, update).await?))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, TaskError> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
