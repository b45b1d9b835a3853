use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use crate::error::{Result, TaskError};
use crate::models::{NewTask, Task, TaskId, TaskUpdate};
use crate::store::TaskStore;

/// Task store reached over the REST API served by `taskbin serve`.
#[derive(Clone, Debug)]
pub struct HttpTaskStore {
    client: Client,
    base_url: String,
}

impl HttpTaskStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpTaskStore { client: Client::new(), base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self) -> String {
        format!("{}/api/tasks", self.base_url)
    }

    fn task_url(&self, id: TaskId) -> String {
        format!("{}/api/tasks/{}", self.base_url, id)
    }
}

/// Maps an HTTP response onto the store's error taxonomy.
async fn check(res: Response, id: Option<TaskId>) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);
    match (status, id) {
        (StatusCode::NOT_FOUND, Some(id)) => Err(TaskError::NotFound(id)),
        (StatusCode::BAD_REQUEST, _) => Err(TaskError::Validation(message)),
        _ => Err(TaskError::Transport(format!("{}: {}", status, message))),
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    Ok(res.json::<T>().await?)
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list(&self) -> Result<Vec<Task>> {
        let res = self.client.get(self.tasks_url()).send().await?;
        decode(check(res, None).await?).await
    }

    async fn get(&self, id: TaskId) -> Result<Task> {
        let res = self.client.get(self.task_url(id)).send().await?;
        decode(check(res, Some(id)).await?).await
    }

    async fn create(&self, new_task: NewTask) -> Result<Task> {
        new_task.validate()?;
        let res = self.client.post(self.tasks_url()).json(&new_task).send().await?;
        decode(check(res, None).await?).await
    }

    async fn update(&self, id: TaskId, update: TaskUpdate) -> Result<Task> {
        update.validate()?;
        let res = self.client.put(self.task_url(id)).json(&update).send().await?;
        decode(check(res, Some(id)).await?).await
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        let res = self.client.delete(self.task_url(id)).send().await?;
        check(res, Some(id)).await?;
        Ok(())
    }
}
