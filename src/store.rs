use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TaskError};
use crate::models::{NewTask, Task, TaskId, TaskUpdate};

/// Create/read/update/delete access to the active tasks.
///
/// Every call may involve a round trip, so callers await each one before
/// issuing a dependent call.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All active tasks, in insertion order.
    async fn list(&self) -> Result<Vec<Task>>;

    /// A single task by id.
    async fn get(&self, id: TaskId) -> Result<Task> {
        self.list()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(TaskError::NotFound(id))
    }

    /// Stores a new task under a fresh id.
    async fn create(&self, new_task: NewTask) -> Result<Task>;

    /// Applies a partial update and returns the updated task.
    async fn update(&self, id: TaskId, update: TaskUpdate) -> Result<Task>;

    /// Removes a task.
    async fn delete(&self, id: TaskId) -> Result<()>;
}

#[async_trait]
impl<S: TaskStore + ?Sized> TaskStore for Arc<S> {
    async fn list(&self) -> Result<Vec<Task>> {
        (**self).list().await
    }

    async fn get(&self, id: TaskId) -> Result<Task> {
        (**self).get(id).await
    }

    async fn create(&self, new_task: NewTask) -> Result<Task> {
        (**self).create(new_task).await
    }

    async fn update(&self, id: TaskId, update: TaskUpdate) -> Result<Task> {
        (**self).update(id, update).await
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        (**self).delete(id).await
    }
}

struct Inner {
    tasks: Vec<Task>,
    next_id: TaskId,
}

/// In-process task store backing the REST server.
///
/// Ids come from a counter that only moves forward, so a deleted task's id
/// is never handed out again.
pub struct MemoryTaskStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        MemoryTaskStore {
            inner: RwLock::new(Inner { tasks: Vec::new(), next_id: 1 }),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.tasks.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list(&self) -> Result<Vec<Task>> {
        Ok(self.inner.read().await.tasks.clone())
    }

    async fn get(&self, id: TaskId) -> Result<Task> {
        self.inner
            .read()
            .await
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(TaskError::NotFound(id))
    }

    async fn create(&self, new_task: NewTask) -> Result<Task> {
        new_task.validate()?;
        let mut inner = self.inner.write().await;
        let task = new_task.into_task(inner.next_id, self.clock.now())?;
        inner.next_id += 1;
        inner.tasks.push(task.clone());
        tracing::debug!(id = task.id, title = %task.title, "task created");
        Ok(task)
    }

    async fn update(&self, id: TaskId, update: TaskUpdate) -> Result<Task> {
        update.validate()?;
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TaskError::NotFound(id))?;
        update.apply(task)?;
        tracing::debug!(id, "task updated");
        Ok(task.clone())
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        let mut inner = self.inner.write().await;
        let len_before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != id);
        if inner.tasks.len() == len_before {
            return Err(TaskError::NotFound(id));
        }
        tracing::debug!(id, "task deleted");
        Ok(())
    }
}
