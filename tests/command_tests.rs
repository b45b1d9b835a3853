use std::sync::Arc;

use chrono::NaiveDate;
use taskbin::commands::*;
use taskbin::recycle_bin::RecycleBinManager;
use taskbin::storage::RecycleBin;
use taskbin::store::{MemoryTaskStore, TaskStore};

fn with_test_bin<F>(test_name: &str, f: F)
where
    F: FnOnce(RecycleBinManager<Arc<MemoryTaskStore>>, Arc<MemoryTaskStore>, std::path::PathBuf),
{
    let dir = tempfile::tempdir().unwrap();
    let bin_path = dir.path().join(format!("taskbin_test_{}.json", test_name));
    let store = Arc::new(MemoryTaskStore::new());
    let manager = RecycleBinManager::new(store.clone(), RecycleBin::open(&bin_path).unwrap());
    f(manager, store, bin_path);
}

#[tokio::test]
async fn test_add_and_list() {
    let store = MemoryTaskStore::new();
    cmd_add(&store, "Test Task".into(), Some("details".into()), Some("2025-12-01".into()), Some("work".into()), true).await;

    let tasks = store.list().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Test Task");
    assert_eq!(tasks[0].category, "work");
    assert_eq!(tasks[0].due_date, NaiveDate::from_ymd_opt(2025, 12, 1));
}

#[tokio::test]
async fn test_add_rejects_bad_date_and_blank_title() {
    let store = MemoryTaskStore::new();
    cmd_add(&store, "Bad date".into(), None, Some("12/01/2025".into()), None, true).await;
    cmd_add(&store, "   ".into(), None, None, None, true).await;

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_toggle_task() {
    let store = MemoryTaskStore::new();
    cmd_add(&store, "Task to complete".into(), None, None, None, true).await;
    let id = store.list().await.unwrap()[0].id;

    cmd_toggle(&store, id, true).await;
    assert!(store.get(id).await.unwrap().completed);

    cmd_toggle(&store, id, true).await;
    assert!(!store.get(id).await.unwrap().completed);
}

#[tokio::test]
async fn test_edit_task() {
    let store = MemoryTaskStore::new();
    cmd_add(&store, "Draft".into(), Some("old".into()), Some("2025-01-01".into()), None, true).await;
    let id = store.list().await.unwrap()[0].id;

    cmd_edit(&store, id, Some("Final".into()), Some("".into()), None, Some("docs".into()), true, true).await;

    let t = store.get(id).await.unwrap();
    assert_eq!(t.title, "Final");
    assert_eq!(t.description, None);
    assert_eq!(t.due_date, None);
    assert_eq!(t.category, "docs");
}

#[test]
fn test_remove_restore_purge() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    with_test_bin("remove_restore", |mut manager, store, bin_path| {
        rt.block_on(async {
            cmd_add(&*store, "One".into(), None, None, None, true).await;
            cmd_add(&*store, "Two".into(), None, None, None, true).await;
            let ids: Vec<_> = store.list().await.unwrap().iter().map(|t| t.id).collect();

            cmd_remove(&mut manager, ids[0], true, true).await;
            cmd_remove(&mut manager, ids[1], true, true).await;
            assert!(store.is_empty().await);
            assert_eq!(RecycleBin::open(&bin_path).unwrap().len(), 2);

            cmd_bin_restore(&mut manager, ids[0], true).await;
            assert_eq!(store.list().await.unwrap()[0].title, "One");

            cmd_bin_purge(&mut manager, ids[1], true, true);
            assert!(manager.list().is_empty());
            assert!(RecycleBin::open(&bin_path).unwrap().is_empty());
        });
    });
}

#[test]
fn test_empty_bin() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    with_test_bin("empty", |mut manager, store, bin_path| {
        rt.block_on(async {
            for title in ["a", "b", "c"] {
                cmd_add(&*store, title.into(), None, None, None, true).await;
            }
            let ids: Vec<_> = store.list().await.unwrap().iter().map(|t| t.id).collect();
            for id in ids {
                cmd_remove(&mut manager, id, true, true).await;
            }
            assert_eq!(manager.list().len(), 3);

            cmd_bin_empty(&mut manager, true, true);

            assert!(manager.list().is_empty());
            assert!(RecycleBin::open(&bin_path).unwrap().is_empty());
        });
    });
}

#[test]
fn test_parse_date() {
    assert_eq!(parse_date("2024-02-29", true), NaiveDate::from_ymd_opt(2024, 2, 29));
    assert_eq!(parse_date("2023-02-29", true), None);
    assert_eq!(parse_date("tomorrow", true), None);
}
