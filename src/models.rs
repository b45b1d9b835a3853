use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use crate::error::{Result, TaskError};

/// Identifier assigned by the task store. Never reused while the store lives.
pub type TaskId = u64;

/// Category given to tasks created without one.
pub const DEFAULT_CATEGORY: &str = "none";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Represents a single task held by the task store.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task.
    pub id: TaskId,
    /// Short title, never empty.
    pub title: String,
    /// Optional longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Calendar day the task is due, serialized as `YYYY-MM-DD`.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Free-form category tag.
    #[serde(default = "default_category")]
    pub category: String,
    /// Whether the task has been completed.
    #[serde(default)]
    pub completed: bool,
    /// Timestamp when the task was created.
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating a task.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        NewTask { title: title.into(), ..Default::default() }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Rejects requests without a usable title.
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)
    }

    /// Builds the stored task, trimming the title and filling in the default category.
    pub fn into_task(self, id: TaskId, created_at: DateTime<Utc>) -> Result<Task> {
        self.validate()?;
        Ok(Task {
            id,
            title: self.title.trim().to_string(),
            description: self.description.filter(|d| !d.trim().is_empty()),
            due_date: self.due_date,
            category: normalize_category(self.category),
            completed: false,
            created_at,
        })
    }
}

/// Partial update of a task. Only the listed fields are mutable.
///
/// `description` and `due_date` distinguish "leave unchanged" (`None`) from
/// "clear" (`Some(None)`, sent as JSON `null`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskUpdate {
    pub fn completed(completed: bool) -> Self {
        TaskUpdate { completed: Some(completed), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool {
        self == &TaskUpdate::default()
    }

    pub fn validate(&self) -> Result<()> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }

    /// Validates, then merges the update into `task`.
    pub fn apply(&self, task: &mut Task) -> Result<()> {
        self.validate()?;
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            task.description = description.clone().filter(|d| !d.trim().is_empty());
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(category) = &self.category {
            task.category = normalize_category(Some(category.clone()));
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        Ok(())
    }
}

/// A deleted task waiting in the recycle bin.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecycledTask {
    #[serde(flatten)]
    pub task: Task,
    /// When the task was moved to the bin. Written once.
    pub deleted_at: DateTime<Utc>,
}

impl RecycledTask {
    pub fn new(task: Task, deleted_at: DateTime<Utc>) -> Self {
        RecycledTask { task, deleted_at }
    }

    pub fn id(&self) -> TaskId {
        self.task.id
    }

    /// Whether this entry was taken from `task`. Ids repeat across store
    /// restarts, so the creation time has to match too.
    pub fn is_snapshot_of(&self, task: &Task) -> bool {
        self.task.id == task.id && self.task.created_at == task.created_at
    }

    /// Creation request carrying the task's identity fields, without its id or deletion stamp.
    pub fn to_new_task(&self) -> NewTask {
        NewTask {
            title: self.task.title.clone(),
            description: self.task.description.clone(),
            due_date: self.task.due_date,
            category: Some(self.task.category.clone()),
        }
    }
}

/// Completion state filter used by listings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Active,
            StatusFilter::Active => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Active => "active",
            StatusFilter::Completed => "completed",
        }
    }
}

/// Which tasks a listing shows.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub category: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        };
        let category_ok = match &self.category {
            Some(c) => task.category == *c,
            None => true,
        };
        status_ok && category_ok
    }

    /// Keeps matching tasks, preserving store order.
    pub fn apply(&self, mut tasks: Vec<Task>) -> Vec<Task> {
        tasks.retain(|t| self.matches(t));
        tasks
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(TaskError::Validation("title must not be empty".into()));
    }
    Ok(())
}

fn normalize_category(category: Option<String>) -> String {
    match category {
        Some(c) if !c.trim().is_empty() => c.trim().to_string(),
        _ => default_category(),
    }
}

fn double_option<'de, T, D>(de: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
