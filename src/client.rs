use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::model::{Action, Notes, Status, Task, TaskPatch};

/// Upper bound on a single request, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the dashboard API.
#[derive(Debug, Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl DashboardClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>> {
        let resp = self.http.get(self.url("/tasks")).send().await;
        decode(resp, "list tasks").await
    }

    pub async fn create_task(&self, title: &str, status: Status) -> Result<Task> {
        let resp = self
            .http
            .post(self.url("/tasks"))
            .json(&json!({ "title": title, "status": status }))
            .send()
            .await;
        decode(resp, "create task").await
    }

    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task> {
        let resp = self
            .http
            .patch(self.url(&format!("/tasks/{id}")))
            .json(patch)
            .send()
            .await;
        decode(resp, "update task").await
    }

    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/tasks/{id}")))
            .send()
            .await;
        decode::<serde_json::Value>(resp, "delete task").await?;
        Ok(())
    }

    pub async fn get_notes(&self) -> Result<String> {
        let resp = self.http.get(self.url("/notes")).send().await;
        let notes: Notes = decode(resp, "fetch notes").await?;
        Ok(notes.content)
    }

    pub async fn set_notes(&self, content: &str) -> Result<()> {
        let resp = self
            .http
            .put(self.url("/notes"))
            .json(&Notes {
                content: content.to_string(),
            })
            .send()
            .await;
        decode::<serde_json::Value>(resp, "save notes").await?;
        Ok(())
    }

    pub async fn list_actions(&self) -> Result<Vec<Action>> {
        let resp = self.http.get(self.url("/actions")).send().await;
        decode(resp, "fetch actions").await
    }
}

async fn decode<T: DeserializeOwned>(
    resp: reqwest::Result<Response>,
    what: &str,
) -> Result<T> {
    let resp = resp.with_context(|| format!("failed to {what}"))?;
    let status = resp.status();
    if !status.is_success() {
        let message = resp
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| status_text(status));
        bail!("failed to {what}: {message} ({})", status.as_u16());
    }
    resp.json()
        .await
        .with_context(|| format!("failed to {what}: malformed response"))
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("unexpected status")
        .to_string()
}
