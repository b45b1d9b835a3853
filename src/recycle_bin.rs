use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use crate::clock::{Clock, SystemClock};
use crate::error::TaskError;
use crate::models::{RecycledTask, Task, TaskId};
use crate::storage::RecycleBin;
use crate::store::TaskStore;

/// Days a recycled task is kept before it becomes eligible for purging.
pub const RETENTION_DAYS: i64 = 30;

/// Moves deleted tasks into the recycle bin and manages their lifetime there.
///
/// None of the operations return errors. Failures talking to the task store
/// are logged and the manager answers with the last list it saw, so a caller
/// can always re-render.
pub struct RecycleBinManager<S> {
    store: S,
    bin: RecycleBin,
    clock: Arc<dyn Clock>,
    last_known: Vec<Task>,
}

impl<S: TaskStore> RecycleBinManager<S> {
    pub fn new(store: S, bin: RecycleBin) -> Self {
        Self::with_clock(store, bin, Arc::new(SystemClock))
    }

    pub fn with_clock(store: S, bin: RecycleBin, clock: Arc<dyn Clock>) -> Self {
        RecycleBinManager { store, bin, clock, last_known: Vec::new() }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current bin contents, in the order they were recycled.
    pub fn list(&self) -> &[RecycledTask] {
        self.bin.entries()
    }

    pub fn get(&self, id: TaskId) -> Option<&RecycledTask> {
        self.bin.get(id)
    }

    /// The active list as of the last successful read.
    pub fn last_known_tasks(&self) -> &[Task] {
        &self.last_known
    }

    /// Re-reads the active list, falling back to the last one seen.
    pub async fn active_tasks(&mut self) -> Vec<Task> {
        match self.store.list().await {
            Ok(tasks) => {
                self.last_known = tasks.clone();
                tasks
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not refresh task list, using last known state");
                self.last_known.clone()
            }
        }
    }

    /// Moves the task into the bin and deletes it from the task store.
    ///
    /// The bin entry is saved before the delete is issued. If the delete then
    /// fails the task is left in both places rather than lost. Recycling a
    /// task that is already in the bin keeps the existing entry and retries the
    /// delete; an older entry that merely shares the id is left alone and the
    /// task gets an entry of its own. An unknown id is a no-op.
    pub async fn recycle(&mut self, id: TaskId) -> Vec<Task> {
        let tasks = match self.store.list().await {
            Ok(tasks) => {
                self.last_known = tasks.clone();
                tasks
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "recycle aborted, task list unavailable");
                return self.last_known.clone();
            }
        };
        let Some(task) = tasks.into_iter().find(|t| t.id == id) else {
            tracing::debug!(id, "recycle of unknown task ignored");
            return self.last_known.clone();
        };

        let deleted_at = self.clock.now();
        let entry = RecycledTask::new(task, deleted_at);
        if self.bin.insert(entry.clone()) {
            if let Err(e) = self.bin.save() {
                tracing::error!(id, error = %e, "could not save recycle bin, task left in place");
                self.bin.remove_entry(&entry);
                return self.last_known.clone();
            }
        } else {
            tracing::info!(id, "task already in recycle bin, replaying delete");
        }

        match self.store.delete(id).await {
            Ok(()) | Err(TaskError::NotFound(_)) => {
                tracing::info!(id, %deleted_at, "task moved to recycle bin");
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "delete failed after recycling, task kept in both stores");
            }
        }
        self.active_tasks().await
    }

    /// Re-creates the most recently recycled task with this id and drops it
    /// from the bin.
    ///
    /// The store may assign a new id. The entry stays in the bin when the
    /// create fails. Returns the bin contents.
    pub async fn restore(&mut self, id: TaskId) -> Vec<RecycledTask> {
        let Some(entry) = self.bin.get(id).cloned() else {
            tracing::debug!(id, "restore of unknown bin entry ignored");
            return self.bin.entries().to_vec();
        };
        self.restore_entry(&entry).await
    }

    /// Like [`restore`](Self::restore), for one specific entry.
    pub async fn restore_entry(&mut self, entry: &RecycledTask) -> Vec<RecycledTask> {
        let id = entry.id();
        if !self.bin.entries().contains(entry) {
            tracing::debug!(id, "restore of unknown bin entry ignored");
            return self.bin.entries().to_vec();
        }

        match self.store.create(entry.to_new_task()).await {
            Ok(task) => {
                self.bin.remove_entry(entry);
                self.persist("restore");
                tracing::info!(id, new_id = task.id, "task restored from recycle bin");
                self.last_known.push(task);
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "restore failed, entry kept in recycle bin");
            }
        }
        self.bin.entries().to_vec()
    }

    /// Drops the most recently recycled entry with this id for good. Unknown
    /// ids are ignored.
    pub fn permanently_delete(&mut self, id: TaskId) -> bool {
        match self.bin.get(id).cloned() {
            Some(entry) => self.permanently_delete_entry(&entry),
            None => false,
        }
    }

    pub fn permanently_delete_entry(&mut self, entry: &RecycledTask) -> bool {
        if !self.bin.remove_entry(entry) {
            return false;
        }
        self.persist("permanent delete");
        tracing::info!(id = entry.id(), "task permanently deleted");
        true
    }

    /// Whether the last recycle of `id` went through: the task has an entry
    /// and is gone from `active`, the list that recycle returned.
    pub fn is_recycled(&self, id: TaskId, active: &[Task]) -> bool {
        self.bin.contains(id) && !active.iter().any(|t| t.id == id)
    }

    /// Drops every entry.
    pub fn empty_all(&mut self) -> usize {
        let removed = self.bin.clear();
        self.persist("empty");
        tracing::info!(removed, "recycle bin emptied");
        removed
    }

    /// Drops entries deleted strictly before the retention cutoff.
    pub fn cleanup_expired(&mut self) -> usize {
        let cutoff = retention_cutoff(self.clock.now());
        let removed = self.bin.retain(|e| e.deleted_at >= cutoff);
        if removed > 0 {
            self.persist("cleanup");
            tracing::info!(removed, %cutoff, "expired tasks purged from recycle bin");
        }
        removed
    }

    /// Re-issues the delete for bin entries whose task is still active, which
    /// happens when a recycle was interrupted between its two steps.
    pub async fn reconcile(&mut self) -> usize {
        let tasks = self.active_tasks().await;
        let pending: Vec<TaskId> = tasks
            .iter()
            .filter(|t| self.bin.entry_for(t).is_some())
            .map(|t| t.id)
            .collect();
        let mut replayed = 0;
        for id in pending {
            match self.store.delete(id).await {
                Ok(()) | Err(TaskError::NotFound(_)) => replayed += 1,
                Err(e) => tracing::warn!(id, error = %e, "replayed delete failed"),
            }
        }
        if replayed > 0 {
            tracing::info!(replayed, "interrupted recycles completed");
            self.active_tasks().await;
        }
        replayed
    }

    /// Housekeeping to run whenever the bin is shown, then its contents.
    pub async fn open_bin(&mut self) -> &[RecycledTask] {
        self.cleanup_expired();
        self.reconcile().await;
        self.bin.entries()
    }

    fn persist(&self, action: &str) {
        if let Err(e) = self.bin.save() {
            tracing::warn!(action, error = %e, "could not save recycle bin");
        }
    }
}

/// Oldest deletion time still inside the retention window.
pub fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(RETENTION_DAYS)
}

/// Days until an entry expires, relative to `now`. Zero or less means due.
pub fn days_left(entry: &RecycledTask, now: DateTime<Utc>) -> i64 {
    let expires = entry.deleted_at + Duration::days(RETENTION_DAYS);
    (expires - now).num_days()
}
