//! Persistence for tasks, the notes document, and the action log.
//!
//! [`Store`] is the operation contract shared by both backends. Callers hold
//! an `Arc<dyn Store>` and never see which SQL dialect sits behind it.

pub mod postgres;
pub mod sqlite;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};

use crate::error::StoreError;
use crate::model::{Action, Status, Task};

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;

/// Maximum number of entries [`Store::list_actions`] returns.
pub const ACTION_LOG_LIMIT: i64 = 50;

/// Primary key of the singleton notes row.
pub const NOTES_ID: &str = "main";

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Create tables and the notes row if missing. Idempotent; run once at
    /// startup before any other operation.
    async fn init(&self) -> Result<(), StoreError>;

    /// All tasks ordered by position, newest first within equal positions.
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError>;

    /// Insert a task at the end of its status group and log the creation.
    async fn create_task(&self, title: &str, status: Status) -> Result<Task, StoreError>;

    /// Overwrite title, status and position. Logs a move only when the
    /// status changed.
    async fn update_task(
        &self,
        id: &str,
        title: &str,
        status: Status,
        position: i64,
    ) -> Result<Task, StoreError>;

    /// Delete a task if it exists. Unknown ids are not an error.
    async fn delete_task(&self, id: &str) -> Result<(), StoreError>;

    async fn get_notes(&self) -> Result<String, StoreError>;

    async fn set_notes(&self, content: &str) -> Result<(), StoreError>;

    /// The newest [`ACTION_LOG_LIMIT`] actions, newest first.
    async fn list_actions(&self) -> Result<Vec<Action>, StoreError>;
}

/// Which backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Sqlite { path: PathBuf },
    Postgres { url: String },
}

/// Open the configured backend. Does not create the schema; call
/// [`Store::init`] afterwards.
pub async fn open(backend: &Backend) -> Result<Arc<dyn Store>, StoreError> {
    let store: Arc<dyn Store> = match backend {
        Backend::Sqlite { path } => Arc::new(SqliteStore::open(path)?),
        Backend::Postgres { url } => Arc::new(PostgresStore::connect(url).await?),
    };
    log::info!("opened {} store", store.backend());
    Ok(store)
}

pub fn created_message(title: &str) -> String {
    format!("Created task: \"{title}\"")
}

pub fn moved_message(title: &str, status: Status) -> String {
    format!("Moved \"{title}\" to {}", status.spoken())
}

pub fn deleted_message(title: &str) -> String {
    format!("Deleted task: \"{title}\"")
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Issues write timestamps at microsecond resolution, each strictly later
/// than the last one handed out.
#[derive(Debug, Default)]
pub struct Clock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        let mut now = Utc::now().trunc_subsecs(6);
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + TimeDelta::microseconds(1);
            }
        }
        *last = Some(now);
        now
    }
}
