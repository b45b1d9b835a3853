use std::sync::Arc;

use chrono::NaiveDate;
use taskbin::api::HttpTaskStore;
use taskbin::models::{NewTask, TaskUpdate};
use taskbin::recycle_bin::RecycleBinManager;
use taskbin::server::{self, ServerHandle};
use taskbin::storage::RecycleBin;
use taskbin::store::{MemoryTaskStore, TaskStore};
use taskbin::TaskError;

async fn spawn_server() -> (ServerHandle, Arc<MemoryTaskStore>, HttpTaskStore) {
    let store = Arc::new(MemoryTaskStore::new());
    let handle = server::start("127.0.0.1:0", store.clone()).await.unwrap();
    let client = HttpTaskStore::new(handle.url());
    (handle, store, client)
}

#[tokio::test]
async fn test_crud_over_http() {
    let (handle, backend, client) = spawn_server().await;

    let created = client
        .create(NewTask::new("Call mom").with_due_date(NaiveDate::from_ymd_opt(2024, 5, 12).unwrap()))
        .await
        .unwrap();
    assert_eq!(created.category, "none");
    assert_eq!(backend.len().await, 1);

    let fetched = client.get(created.id).await.unwrap();
    assert_eq!(fetched, created);

    let updated = client.update(created.id, TaskUpdate::completed(true)).await.unwrap();
    assert!(updated.completed);
    assert_eq!(updated.due_date, created.due_date);

    client.delete(created.id).await.unwrap();
    assert!(client.list().await.unwrap().is_empty());

    handle.shutdown();
}

#[tokio::test]
async fn test_http_errors_are_typed() {
    let (handle, _backend, client) = spawn_server().await;

    assert!(matches!(client.get(9).await, Err(TaskError::NotFound(9))));
    assert!(matches!(client.delete(9).await, Err(TaskError::NotFound(9))));
    assert!(matches!(client.update(9, TaskUpdate::completed(true)).await, Err(TaskError::NotFound(9))));

    let raw = reqwest::Client::new()
        .post(format!("{}/api/tasks", handle.url()))
        .json(&serde_json::json!({ "title": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(raw.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = raw.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("title"));

    handle.shutdown();
}

#[tokio::test]
async fn test_list_query_filters() {
    let (handle, backend, client) = spawn_server().await;
    let a = backend.create(NewTask::new("a").with_category("work")).await.unwrap();
    backend.create(NewTask::new("b").with_category("home")).await.unwrap();
    backend.update(a.id, TaskUpdate::completed(true)).await.unwrap();

    let http = reqwest::Client::new();
    let active: Vec<serde_json::Value> = http
        .get(format!("{}/api/tasks?status=active", handle.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["title"], "b");

    let work: Vec<serde_json::Value> = http
        .get(format!("{}/api/tasks?category=work", handle.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(work.len(), 1);
    assert_eq!(work[0]["completed"], true);

    assert_eq!(client.list().await.unwrap().len(), 2);
    handle.shutdown();
}

#[tokio::test]
async fn test_recycle_and_restore_through_http() {
    let (handle, backend, client) = spawn_server().await;
    let task = client.create(NewTask::new("Water plants").with_category("home")).await.unwrap();
    let mut manager = RecycleBinManager::new(client.clone(), RecycleBin::in_memory());

    let remaining = manager.recycle(task.id).await;
    assert!(remaining.is_empty());
    assert!(backend.is_empty().await);

    let bin = manager.restore(task.id).await;
    assert!(bin.is_empty());
    let tasks = backend.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Water plants");
    assert_eq!(tasks[0].category, "home");
    // the store hands out a fresh id on re-create
    assert_ne!(tasks[0].id, task.id);

    handle.shutdown();
}

#[tokio::test]
async fn test_unreachable_server_is_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = HttpTaskStore::new(format!("http://{}", addr));

    assert!(matches!(client.list().await, Err(TaskError::Transport(_))));

    let mut manager = RecycleBinManager::new(client, RecycleBin::in_memory());
    assert!(manager.recycle(1).await.is_empty());
    assert!(manager.list().is_empty());
}
