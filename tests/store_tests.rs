use chrono::NaiveDate;
use taskbin::models::{NewTask, RecycledTask, StatusFilter, TaskFilter, TaskUpdate, DEFAULT_CATEGORY};
use taskbin::storage::RecycleBin;
use taskbin::store::{MemoryTaskStore, TaskStore};
use taskbin::TaskError;

#[tokio::test]
async fn test_create_assigns_defaults() {
    let store = MemoryTaskStore::new();

    let task = store.create(NewTask::new("  Buy milk  ")).await.unwrap();

    assert_eq!(task.id, 1);
    assert_eq!(task.title, "Buy milk");
    assert_eq!(task.category, DEFAULT_CATEGORY);
    assert!(!task.completed);
    assert_eq!(task.description, None);
    assert_eq!(task.due_date, None);
}

#[tokio::test]
async fn test_create_rejects_blank_title() {
    let store = MemoryTaskStore::new();

    let err = store.create(NewTask::new("   ")).await.unwrap_err();

    assert!(matches!(err, TaskError::Validation(_)));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_ids_are_not_reused_after_delete() {
    let store = MemoryTaskStore::new();
    let a = store.create(NewTask::new("a")).await.unwrap();
    let b = store.create(NewTask::new("b")).await.unwrap();
    store.delete(b.id).await.unwrap();

    let c = store.create(NewTask::new("c")).await.unwrap();

    assert_ne!(c.id, a.id);
    assert_ne!(c.id, b.id);
}

#[tokio::test]
async fn test_update_and_not_found() {
    let store = MemoryTaskStore::new();
    let t = store
        .create(NewTask::new("Plan trip").with_due_date(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()))
        .await
        .unwrap();

    let updated = store
        .update(t.id, TaskUpdate {
            title: Some("Plan summer trip".into()),
            due_date: Some(None),
            category: Some("travel".into()),
            completed: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(updated.title, "Plan summer trip");
    assert_eq!(updated.due_date, None);
    assert_eq!(updated.category, "travel");
    assert!(updated.completed);
    assert_eq!(updated.created_at, t.created_at);

    let blank = TaskUpdate { title: Some("".into()), ..Default::default() };
    assert!(matches!(store.update(t.id, blank).await, Err(TaskError::Validation(_))));
    assert!(matches!(store.update(42, TaskUpdate::completed(true)).await, Err(TaskError::NotFound(42))));
    assert!(matches!(store.delete(42).await, Err(TaskError::NotFound(42))));
    assert!(matches!(store.get(42).await, Err(TaskError::NotFound(42))));
}

#[test]
fn test_update_json_distinguishes_null_from_missing() {
    let clear: TaskUpdate = serde_json::from_str(r#"{"dueDate": null}"#).unwrap();
    assert_eq!(clear.due_date, Some(None));

    let untouched: TaskUpdate = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
    assert_eq!(untouched.due_date, None);
    assert_eq!(untouched.description, None);

    let set: TaskUpdate = serde_json::from_str(r#"{"dueDate": "2024-05-06"}"#).unwrap();
    assert_eq!(set.due_date, Some(NaiveDate::from_ymd_opt(2024, 5, 6)));
}

#[tokio::test]
async fn test_filter_by_status_and_category() {
    let store = MemoryTaskStore::new();
    let a = store.create(NewTask::new("a").with_category("work")).await.unwrap();
    store.create(NewTask::new("b").with_category("home")).await.unwrap();
    store.create(NewTask::new("c").with_category("work")).await.unwrap();
    store.update(a.id, TaskUpdate::completed(true)).await.unwrap();
    let tasks = store.list().await.unwrap();

    let active_work = TaskFilter { status: StatusFilter::Active, category: Some("work".into()) };
    let titles: Vec<_> = active_work.apply(tasks.clone()).into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["c"]);

    let done = TaskFilter { status: StatusFilter::Completed, category: None };
    assert_eq!(done.apply(tasks.clone()).len(), 1);
    assert_eq!(TaskFilter::default().apply(tasks).len(), 3);
}

#[tokio::test]
async fn test_recycled_task_json_is_flat() {
    let store = MemoryTaskStore::new();
    let task = store.create(NewTask::new("flat")).await.unwrap();
    let entry = RecycledTask::new(task.clone(), task.created_at);

    let value = serde_json::to_value(&entry).unwrap();

    assert_eq!(value["id"], task.id);
    assert_eq!(value["title"], "flat");
    assert!(value.get("deletedAt").is_some());
    assert!(value.get("task").is_none());
}

#[tokio::test]
async fn test_bin_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("recycle_bin.json");
    let store = MemoryTaskStore::new();
    let task = store.create(NewTask::new("kept")).await.unwrap();

    let mut bin = RecycleBin::open(&path).unwrap();
    assert!(bin.is_empty());
    assert!(bin.insert(RecycledTask::new(task.clone(), task.created_at)));
    assert!(!bin.insert(RecycledTask::new(task.clone(), task.created_at)));
    bin.save().unwrap();

    let reopened = RecycleBin::open(&path).unwrap();
    assert_eq!(reopened.entries(), bin.entries());
}

#[test]
fn test_corrupt_bin_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recycle_bin.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(RecycleBin::open(&path), Err(TaskError::Serialization(_))));
}
