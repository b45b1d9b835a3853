use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use taskbin::calendar::{dates_with_tasks, month_grid, tasks_on_date, Calendar, YearMonth, GRID_CELLS};
use taskbin::clock::FixedClock;
use taskbin::models::{NewTask, Task, TaskId, TaskUpdate};
use taskbin::store::{MemoryTaskStore, TaskStore};
use taskbin::{Result, TaskError};

/// Wraps a store whose `list` can be switched off like an unreachable backend.
struct OfflineStore {
    inner: Arc<MemoryTaskStore>,
    offline: AtomicBool,
}

#[async_trait]
impl TaskStore for OfflineStore {
    async fn list(&self) -> Result<Vec<Task>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TaskError::Transport("connection refused".into()));
        }
        self.inner.list().await
    }

    async fn create(&self, new_task: NewTask) -> Result<Task> {
        self.inner.create(new_task).await
    }

    async fn update(&self, id: TaskId, update: TaskUpdate) -> Result<Task> {
        self.inner.update(id, update).await
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        self.inner.delete(id).await
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn seeded_store() -> Arc<MemoryTaskStore> {
    let store = Arc::new(MemoryTaskStore::new());
    store.create(NewTask::new("A").with_due_date(date(2024, 1, 5))).await.unwrap();
    store.create(NewTask::new("B").with_due_date(date(2024, 1, 5))).await.unwrap();
    store.create(NewTask::new("C").with_due_date(date(2024, 2, 1))).await.unwrap();
    store.create(NewTask::new("D")).await.unwrap();
    store
}

#[tokio::test]
async fn test_dates_with_tasks_collapses_duplicates() {
    let store = seeded_store().await;
    let tasks = store.list().await.unwrap();

    let dates = dates_with_tasks(&tasks);

    let expected: BTreeSet<NaiveDate> = [date(2024, 1, 5), date(2024, 2, 1)].into_iter().collect();
    assert_eq!(dates, expected);
}

#[tokio::test]
async fn test_dates_follow_store_changes() {
    let store = seeded_store().await;
    let mut calendar = Calendar::new(store.clone());
    let c = store.list().await.unwrap().into_iter().find(|t| t.title == "C").unwrap();

    store.delete(c.id).await.unwrap();
    let dates = calendar.dates_with_tasks().await;
    assert!(!dates.contains(&date(2024, 2, 1)));

    let a = store.list().await.unwrap().into_iter().find(|t| t.title == "A").unwrap();
    let update = TaskUpdate { due_date: Some(Some(date(2024, 3, 9))), ..Default::default() };
    store.update(a.id, update).await.unwrap();
    let dates = calendar.dates_with_tasks().await;
    assert!(dates.contains(&date(2024, 1, 5)));
    assert!(dates.contains(&date(2024, 3, 9)));
    assert_eq!(dates.len(), 2);
}

#[tokio::test]
async fn test_tasks_on_date_keeps_store_order() {
    let store = seeded_store().await;
    let mut calendar = Calendar::new(store);

    let titles: Vec<String> = calendar
        .tasks_on_date(date(2024, 1, 5))
        .await
        .into_iter()
        .map(|t| t.title)
        .collect();

    assert_eq!(titles, vec!["A", "B"]);
    assert!(calendar.tasks_on_date(date(2024, 1, 6)).await.is_empty());
}

#[test]
fn test_tasks_on_date_pure() {
    assert!(tasks_on_date(&[], date(2024, 1, 1)).is_empty());
}

#[test]
fn test_february_2024_grid() {
    let month = YearMonth::new(2024, 2).unwrap();
    let dates: BTreeSet<NaiveDate> = [date(2024, 2, 14), date(2024, 3, 1)].into_iter().collect();

    let cells = month_grid(month, Some(date(2024, 2, 20)), date(2024, 2, 10), &dates);

    assert_eq!(cells.len(), GRID_CELLS);
    assert!(cells[..4].iter().all(|c| !c.in_month));
    assert_eq!(cells[0].date, date(2024, 1, 28));
    assert!(cells[4].in_month);
    assert_eq!(cells[4].date, date(2024, 2, 1));
    assert_eq!(cells[32].date, date(2024, 2, 29));
    assert!(cells[33..].iter().all(|c| !c.in_month));
    assert_eq!(cells.iter().filter(|c| c.in_month).count(), 29);

    let find = |d: NaiveDate| cells.iter().find(|c| c.date == d).unwrap();
    assert!(find(date(2024, 2, 14)).has_tasks);
    assert!(find(date(2024, 2, 10)).is_today);
    assert!(find(date(2024, 2, 20)).is_selected);
    // padding days never carry flags
    assert!(!find(date(2024, 3, 1)).has_tasks);

    let plain = find(date(2024, 2, 15));
    assert!(!plain.is_today && !plain.is_selected && !plain.has_tasks);
}

#[test]
fn test_every_month_fills_42_cells() {
    let empty = BTreeSet::new();
    let today = date(2024, 6, 1);
    for (year, month, days) in [(2023, 2, 28), (2024, 2, 29), (2024, 4, 30), (2024, 12, 31), (2026, 8, 31)] {
        let ym = YearMonth::new(year, month).unwrap();
        assert_eq!(ym.num_days(), days);
        let cells = month_grid(ym, None, today, &empty);
        assert_eq!(cells.len(), GRID_CELLS);
        assert_eq!(cells.iter().filter(|c| c.in_month).count(), days as usize);
        let first = cells.iter().position(|c| c.in_month).unwrap();
        assert_eq!(cells[first].date, ym.first_day());
    }
}

#[test]
fn test_month_starting_on_sunday_has_no_leading_padding() {
    // September 2024 starts on a Sunday
    let cells = month_grid(YearMonth::new(2024, 9).unwrap(), None, date(2024, 1, 1), &BTreeSet::new());
    assert!(cells[0].in_month);
    assert_eq!(cells[0].date, date(2024, 9, 1));
}

#[test]
fn test_year_month_parsing_and_navigation() {
    let ym: YearMonth = "2024-12".parse().unwrap();
    assert_eq!(ym.next(), YearMonth::new(2025, 1).unwrap());
    assert_eq!(ym.prev(), YearMonth::new(2024, 11).unwrap());
    assert_eq!(YearMonth::new(2024, 1).unwrap().prev().to_string(), "2023-12");
    assert_eq!(ym.title(), "December 2024");
    assert!("2024-13".parse::<YearMonth>().is_err());
    assert!("december".parse::<YearMonth>().is_err());
    assert!(YearMonth::new(2024, 0).is_err());
}

#[tokio::test]
async fn test_calendar_grid_uses_clock_for_today() {
    let store = seeded_store().await;
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap()));
    let mut calendar = Calendar::with_clock(store, clock);

    let cells = calendar.month_grid(YearMonth::new(2024, 1).unwrap(), None).await;
    let fifth = cells.iter().find(|c| c.date == date(2024, 1, 5)).unwrap();

    assert!(fifth.is_today);
    assert!(fifth.has_tasks);
    assert!(!fifth.is_selected);
}

#[tokio::test]
async fn test_calendar_answers_from_last_known_tasks_when_store_is_down() {
    let store = Arc::new(OfflineStore { inner: seeded_store().await, offline: AtomicBool::new(false) });
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap()));
    let mut calendar = Calendar::with_clock(store.clone(), clock);
    assert_eq!(calendar.dates_with_tasks().await.len(), 2);

    store.offline.store(true, Ordering::SeqCst);
    // changes made while unreachable are not visible
    store.inner.create(NewTask::new("E").with_due_date(date(2024, 1, 20))).await.unwrap();

    let titles: Vec<String> = calendar
        .tasks_on_date(date(2024, 1, 5))
        .await
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, vec!["A".to_string(), "B".to_string()]);

    let expected: BTreeSet<NaiveDate> = [date(2024, 1, 5), date(2024, 2, 1)].into_iter().collect();
    assert_eq!(calendar.dates_with_tasks().await, expected);

    let cells = calendar.month_grid(YearMonth::new(2024, 1).unwrap(), Some(date(2024, 1, 20))).await;
    assert_eq!(cells.len(), GRID_CELLS);
    let fifth = cells.iter().find(|c| c.date == date(2024, 1, 5)).unwrap();
    assert!(fifth.has_tasks && fifth.is_today);
    let twentieth = cells.iter().find(|c| c.date == date(2024, 1, 20)).unwrap();
    assert!(twentieth.is_selected && !twentieth.has_tasks);
}
