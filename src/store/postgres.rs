use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, Row};

use super::{Clock, Store, ACTION_LOG_LIMIT, NOTES_ID};
use crate::error::StoreError;
use crate::model::{Action, Status, Task};
use crate::validate::validate_title;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id         TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'todo' CHECK (status IN ('todo', 'in_progress', 'done', 'archived')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    position   BIGINT NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS action_log (
    id        TEXT PRIMARY KEY,
    action    TEXT NOT NULL,
    timestamp TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS notes (
    id      TEXT PRIMARY KEY DEFAULT 'main',
    content TEXT NOT NULL DEFAULT ''
);

INSERT INTO notes (id, content) VALUES ('main', '') ON CONFLICT (id) DO NOTHING;
";

const TASK_COLUMNS: &str = "id, title, status, position, created_at, updated_at";

/// Remote backend over a single tokio-postgres client. Each operation is a
/// short sequence of independent statements; the server provides
/// statement-level atomicity only.
pub struct PostgresStore {
    client: Client,
    clock: Clock,
}

impl PostgresStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("postgres connection closed: {e}");
            }
        });
        Ok(Self {
            client,
            clock: Clock::default(),
        })
    }

    async fn require_task(&self, id: &str) -> Result<Task, StoreError> {
        self.get_task(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn append_action(
        &self,
        action: &str,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StoreError> {
        self.client
            .execute(
                "INSERT INTO action_log (id, action, timestamp) VALUES ($1, $2, $3)",
                &[&super::new_id(), &action, &at],
            )
            .await?;
        Ok(())
    }
}

fn task_from_row(row: &Row) -> Result<Task, StoreError> {
    let status: String = row.try_get(2)?;
    Ok(Task {
        id: row.try_get(0)?,
        title: row.try_get(1)?,
        status: status
            .parse::<Status>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?,
        position: row.try_get(3)?,
        created_at: row.try_get(4)?,
        updated_at: row.try_get(5)?,
    })
}

#[async_trait]
impl Store for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn init(&self) -> Result<(), StoreError> {
        self.client.batch_execute(SCHEMA).await?;
        Ok(())
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let rows = self
            .client
            .query(
                &format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY position ASC, created_at DESC"),
                &[],
            )
            .await?;
        rows.iter().map(task_from_row).collect()
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let row = self
            .client
            .query_opt(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"),
                &[&id],
            )
            .await?;
        row.as_ref().map(task_from_row).transpose()
    }

    async fn create_task(&self, title: &str, status: Status) -> Result<Task, StoreError> {
        let title = validate_title(title)?;
        let id = super::new_id();
        let at = self.clock.now();
        let row = self
            .client
            .query_one(
                &format!(
                    "INSERT INTO tasks (id, title, status, position, created_at, updated_at)
                     VALUES ($1, $2, $3, (SELECT COALESCE(MAX(position), 0) + 1 FROM tasks WHERE status = $3), $4, $4)
                     RETURNING {TASK_COLUMNS}"
                ),
                &[&id, &title, &status.as_str(), &at],
            )
            .await?;
        let task = task_from_row(&row)?;
        self.append_action(&super::created_message(title), at).await?;
        Ok(task)
    }

    async fn update_task(
        &self,
        id: &str,
        title: &str,
        status: Status,
        position: i64,
    ) -> Result<Task, StoreError> {
        let previous = self.require_task(id).await?;
        let at = self.clock.now();
        let row = self
            .client
            .query_opt(
                &format!(
                    "UPDATE tasks SET title = $1, status = $2, position = $3, updated_at = $4
                     WHERE id = $5 RETURNING {TASK_COLUMNS}"
                ),
                &[&title, &status.as_str(), &position, &at, &id],
            )
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if previous.status != status {
            self.append_action(&super::moved_message(title, status), at)
                .await?;
        }
        task_from_row(&row)
    }

    async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        let Some(task) = self.get_task(id).await? else {
            return Ok(());
        };
        let at = self.clock.now();
        self.client
            .execute("DELETE FROM tasks WHERE id = $1", &[&id])
            .await?;
        self.append_action(&super::deleted_message(&task.title), at)
            .await
    }

    async fn get_notes(&self) -> Result<String, StoreError> {
        let row = self
            .client
            .query_opt("SELECT content FROM notes WHERE id = $1", &[&NOTES_ID])
            .await?;
        match row {
            Some(row) => Ok(row.try_get(0)?),
            None => Ok(String::new()),
        }
    }

    async fn set_notes(&self, content: &str) -> Result<(), StoreError> {
        self.client
            .execute(
                "INSERT INTO notes (id, content) VALUES ($1, $2)
                 ON CONFLICT (id) DO UPDATE SET content = EXCLUDED.content",
                &[&NOTES_ID, &content],
            )
            .await?;
        Ok(())
    }

    async fn list_actions(&self) -> Result<Vec<Action>, StoreError> {
        let rows = self
            .client
            .query(
                "SELECT id, action, timestamp FROM action_log ORDER BY timestamp DESC LIMIT $1",
                &[&ACTION_LOG_LIMIT],
            )
            .await?;
        rows.iter()
            .map(|row| -> Result<Action, StoreError> {
                Ok(Action {
                    id: row.try_get(0)?,
                    action: row.try_get(1)?,
                    timestamp: row.try_get(2)?,
                })
            })
            .collect()
    }
}
