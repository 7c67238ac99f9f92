use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use super::{Clock, Store, ACTION_LOG_LIMIT, NOTES_ID};
use crate::error::StoreError;
use crate::model::{Action, Status, Task};
use crate::validate::validate_title;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id         TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    status     TEXT NOT NULL DEFAULT 'todo' CHECK(status IN ('todo', 'in_progress', 'done', 'archived')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    position   INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS action_log (
    id        TEXT PRIMARY KEY,
    action    TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    id      TEXT PRIMARY KEY DEFAULT 'main',
    content TEXT NOT NULL DEFAULT ''
);

INSERT OR IGNORE INTO notes (id, content) VALUES ('main', '');
";

const TASK_COLUMNS: &str = "id, title, status, position, created_at, updated_at";

fn set_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

pub fn open(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    set_pragmas(&conn)?;
    Ok(conn)
}

pub fn open_memory() -> Result<Connection, StoreError> {
    let conn = Connection::open_in_memory()?;
    set_pragmas(&conn)?;
    Ok(conn)
}

pub fn init(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ── Column conversions ─────────────────────────────────────────────────

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// Fixed-width RFC 3339 so that text order equals time order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        status: row.get(2)?,
        position: row.get(3)?,
        created_at: timestamp(row, 4)?,
        updated_at: timestamp(row, 5)?,
    })
}

// ── Operations ─────────────────────────────────────────────────────────

pub fn list_tasks(conn: &Connection) -> Result<Vec<Task>, StoreError> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks ORDER BY position ASC, created_at DESC"
    ))?;
    let rows = stmt.query_map([], task_from_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Into::into)
}

pub fn get_task(conn: &Connection, id: &str) -> Result<Option<Task>, StoreError> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            [id],
            task_from_row,
        )
        .optional()?;
    Ok(task)
}

fn require_task(conn: &Connection, id: &str) -> Result<Task, StoreError> {
    get_task(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))
}

fn append_action(conn: &Connection, action: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO action_log (id, action, timestamp) VALUES (?1, ?2, ?3)",
        params![super::new_id(), action, format_timestamp(at)],
    )?;
    Ok(())
}

pub fn create_task(
    conn: &Connection,
    id: &str,
    title: &str,
    status: Status,
    at: DateTime<Utc>,
) -> Result<Task, StoreError> {
    let title = validate_title(title)?;
    let ts = format_timestamp(at);
    conn.execute(
        "INSERT INTO tasks (id, title, status, position, created_at, updated_at)
         VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(position), 0) + 1 FROM tasks WHERE status = ?3), ?4, ?4)",
        params![id, title, status, ts],
    )?;
    append_action(conn, &super::created_message(title), at)?;
    require_task(conn, id)
}

pub fn update_task(
    conn: &Connection,
    id: &str,
    title: &str,
    status: Status,
    position: i64,
    at: DateTime<Utc>,
) -> Result<Task, StoreError> {
    let previous = require_task(conn, id)?;
    conn.execute(
        "UPDATE tasks SET title = ?1, status = ?2, position = ?3, updated_at = ?4 WHERE id = ?5",
        params![title, status, position, format_timestamp(at), id],
    )?;
    if previous.status != status {
        append_action(conn, &super::moved_message(title, status), at)?;
    }
    require_task(conn, id)
}

pub fn delete_task(conn: &Connection, id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
    let Some(task) = get_task(conn, id)? else {
        return Ok(());
    };
    conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
    append_action(conn, &super::deleted_message(&task.title), at)?;
    Ok(())
}

pub fn get_notes(conn: &Connection) -> Result<String, StoreError> {
    let content: Option<String> = conn
        .query_row("SELECT content FROM notes WHERE id = ?1", [NOTES_ID], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(content.unwrap_or_default())
}

pub fn set_notes(conn: &Connection, content: &str) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO notes (id, content) VALUES (?1, ?2)",
        params![NOTES_ID, content],
    )?;
    Ok(())
}

pub fn list_actions(conn: &Connection) -> Result<Vec<Action>, StoreError> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, action, timestamp FROM action_log ORDER BY timestamp DESC, rowid DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map([ACTION_LOG_LIMIT], |row| {
        Ok(Action {
            id: row.get(0)?,
            action: row.get(1)?,
            timestamp: timestamp(row, 2)?,
        })
    })?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Into::into)
}

// ── Async backend ──────────────────────────────────────────────────────

/// Embedded single-file backend. Operations run on tokio's blocking pool;
/// the mutex serializes them over the one connection.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    clock: Clock,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::from_connection(open(path)?))
    }

    /// A private in-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self::from_connection(open_memory()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            clock: Clock::default(),
        }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&*guard)
        })
        .await?
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn init(&self) -> Result<(), StoreError> {
        self.with_conn(init).await
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.with_conn(list_tasks).await
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |conn| get_task(conn, &id)).await
    }

    async fn create_task(&self, title: &str, status: Status) -> Result<Task, StoreError> {
        let id = super::new_id();
        let title = title.to_string();
        let at = self.clock.now();
        self.with_conn(move |conn| create_task(conn, &id, &title, status, at))
            .await
    }

    async fn update_task(
        &self,
        id: &str,
        title: &str,
        status: Status,
        position: i64,
    ) -> Result<Task, StoreError> {
        let id = id.to_string();
        let title = title.to_string();
        let at = self.clock.now();
        self.with_conn(move |conn| update_task(conn, &id, &title, status, position, at))
            .await
    }

    async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        let at = self.clock.now();
        self.with_conn(move |conn| delete_task(conn, &id, at)).await
    }

    async fn get_notes(&self) -> Result<String, StoreError> {
        self.with_conn(get_notes).await
    }

    async fn set_notes(&self, content: &str) -> Result<(), StoreError> {
        let content = content.to_string();
        self.with_conn(move |conn| set_notes(conn, &content)).await
    }

    async fn list_actions(&self) -> Result<Vec<Action>, StoreError> {
        self.with_conn(list_actions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn test_conn() -> Connection {
        let conn = open_memory().unwrap();
        init(&conn).unwrap();
        conn
    }

    /// Timestamps one second apart, starting at a fixed instant.
    fn at(n: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + TimeDelta::seconds(n)
    }

    fn action_texts(conn: &Connection) -> Vec<String> {
        list_actions(conn)
            .unwrap()
            .into_iter()
            .map(|a| a.action)
            .collect()
    }

    #[test]
    fn create_and_get_task() {
        let conn = test_conn();
        let task = create_task(&conn, "t1", "Buy milk", Status::Todo, at(0)).unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.position, 1);
        assert_eq!(task.created_at, at(0));
        assert_eq!(task.updated_at, at(0));
        assert_eq!(get_task(&conn, "t1").unwrap(), Some(task));
    }

    #[test]
    fn get_missing_task_is_none() {
        let conn = test_conn();
        assert_eq!(get_task(&conn, "nope").unwrap(), None);
    }

    #[test]
    fn create_trims_title() {
        let conn = test_conn();
        let task = create_task(&conn, "t1", "  Buy milk ", Status::Todo, at(0)).unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(action_texts(&conn), vec!["Created task: \"Buy milk\""]);
    }

    #[test]
    fn create_blank_title_fails() {
        let conn = test_conn();
        for title in ["", "   ", "\n\t"] {
            let err = create_task(&conn, "t1", title, Status::Todo, at(0)).unwrap_err();
            assert!(matches!(err, StoreError::Validation(_)));
        }
        assert!(list_tasks(&conn).unwrap().is_empty());
        assert!(list_actions(&conn).unwrap().is_empty());
    }

    #[test]
    fn position_is_max_within_status_plus_one() {
        let conn = test_conn();
        assert_eq!(create_task(&conn, "a", "a", Status::Todo, at(0)).unwrap().position, 1);
        assert_eq!(create_task(&conn, "b", "b", Status::Todo, at(1)).unwrap().position, 2);
        assert_eq!(create_task(&conn, "c", "c", Status::Done, at(2)).unwrap().position, 1);

        update_task(&conn, "a", "a", Status::Todo, 10, at(3)).unwrap();
        assert_eq!(create_task(&conn, "d", "d", Status::Todo, at(4)).unwrap().position, 11);
        assert_eq!(create_task(&conn, "e", "e", Status::Done, at(5)).unwrap().position, 2);
    }

    #[test]
    fn list_orders_by_position_then_newest() {
        let conn = test_conn();
        create_task(&conn, "a", "a", Status::Todo, at(0)).unwrap();
        create_task(&conn, "b", "b", Status::Done, at(1)).unwrap();
        create_task(&conn, "c", "c", Status::Todo, at(2)).unwrap();
        // a and b share position 1; b is newer.
        let ids: Vec<String> = list_tasks(&conn).unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn status_change_logs_one_move() {
        let conn = test_conn();
        create_task(&conn, "t", "Buy milk", Status::Todo, at(0)).unwrap();
        let task = update_task(&conn, "t", "Buy milk", Status::Done, 1, at(1)).unwrap();
        assert_eq!(task.status, Status::Done);
        assert_eq!(task.updated_at, at(1));
        assert_eq!(task.created_at, at(0));
        assert_eq!(
            action_texts(&conn),
            vec!["Moved \"Buy milk\" to done", "Created task: \"Buy milk\""]
        );
    }

    #[test]
    fn move_message_uses_spoken_status_and_new_title() {
        let conn = test_conn();
        create_task(&conn, "t", "Old", Status::Todo, at(0)).unwrap();
        update_task(&conn, "t", "New", Status::InProgress, 0, at(1)).unwrap();
        assert_eq!(action_texts(&conn)[0], "Moved \"New\" to in progress");
    }

    #[test]
    fn title_and_position_changes_are_not_logged() {
        let conn = test_conn();
        create_task(&conn, "t", "Old", Status::Todo, at(0)).unwrap();
        let task = update_task(&conn, "t", "New", Status::Todo, 7, at(1)).unwrap();
        assert_eq!(task.title, "New");
        assert_eq!(task.position, 7);
        assert_eq!(action_texts(&conn).len(), 1);
    }

    #[test]
    fn update_missing_task_fails() {
        let conn = test_conn();
        let err = update_task(&conn, "nope", "x", Status::Done, 0, at(0)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "nope"));
        assert!(list_actions(&conn).unwrap().is_empty());
    }

    #[test]
    fn delete_logs_title() {
        let conn = test_conn();
        create_task(&conn, "t", "Buy milk", Status::Todo, at(0)).unwrap();
        delete_task(&conn, "t", at(1)).unwrap();
        assert_eq!(get_task(&conn, "t").unwrap(), None);
        assert_eq!(action_texts(&conn)[0], "Deleted task: \"Buy milk\"");
    }

    #[test]
    fn delete_missing_task_is_silent() {
        let conn = test_conn();
        delete_task(&conn, "nope", at(0)).unwrap();
        delete_task(&conn, "nope", at(1)).unwrap();
        assert!(list_actions(&conn).unwrap().is_empty());
    }

    #[test]
    fn init_creates_empty_notes_and_is_idempotent() {
        let conn = test_conn();
        assert_eq!(get_notes(&conn).unwrap(), "");
        set_notes(&conn, "keep me").unwrap();
        init(&conn).unwrap();
        assert_eq!(get_notes(&conn).unwrap(), "keep me");
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn notes_round_trip_including_empty() {
        let conn = test_conn();
        set_notes(&conn, "hello\nworld").unwrap();
        assert_eq!(get_notes(&conn).unwrap(), "hello\nworld");
        set_notes(&conn, "").unwrap();
        assert_eq!(get_notes(&conn).unwrap(), "");
    }

    #[test]
    fn missing_notes_row_reads_empty() {
        let conn = test_conn();
        conn.execute("DELETE FROM notes", []).unwrap();
        assert_eq!(get_notes(&conn).unwrap(), "");
        set_notes(&conn, "back").unwrap();
        assert_eq!(get_notes(&conn).unwrap(), "back");
    }

    #[test]
    fn actions_are_capped_and_newest_first() {
        let conn = test_conn();
        for i in 0..60 {
            create_task(&conn, &format!("t{i}"), &format!("task {i}"), Status::Todo, at(i)).unwrap();
        }
        let actions = list_actions(&conn).unwrap();
        assert_eq!(actions.len(), ACTION_LOG_LIMIT as usize);
        assert_eq!(actions[0].action, "Created task: \"task 59\"");
        for pair in actions.windows(2) {
            assert!(pair[0].timestamp > pair[1].timestamp);
        }
    }

    #[test]
    fn timestamps_sort_as_text() {
        let early = format_timestamp(at(0));
        let later = format_timestamp(at(0) + TimeDelta::microseconds(1));
        assert_eq!(early, "2026-10-19T12:00:00.000000Z");
        assert!(later > early);
    }

    #[test]
    fn bad_status_row_is_an_error() {
        let conn = test_conn();
        conn.execute_batch("PRAGMA ignore_check_constraints = ON").unwrap();
        conn.execute(
            "INSERT INTO tasks (id, title, status, created_at, updated_at) VALUES ('x', 'x', 'blocked', ?1, ?1)",
            [format_timestamp(at(0))],
        )
        .unwrap();
        assert!(list_tasks(&conn).is_err());
    }

    #[tokio::test]
    async fn async_store_end_to_end() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init().await.unwrap();

        let task = store.create_task("Buy milk", Status::Todo).await.unwrap();
        assert_eq!(task.position, 1);
        assert_eq!(store.get_task(&task.id).await.unwrap(), Some(task.clone()));

        let moved = store
            .update_task(&task.id, "Buy milk", Status::InProgress, 0)
            .await
            .unwrap();
        assert!(moved.updated_at > task.updated_at);

        store.delete_task(&task.id).await.unwrap();
        assert!(store.list_tasks().await.unwrap().is_empty());

        let actions: Vec<String> = store
            .list_actions()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                "Deleted task: \"Buy milk\"",
                "Moved \"Buy milk\" to in progress",
                "Created task: \"Buy milk\"",
            ]
        );

        store.set_notes("hello").await.unwrap();
        assert_eq!(store.get_notes().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dashboard.db");
        let store = SqliteStore::open(&path).unwrap();
        store.init().await.unwrap();
        assert!(path.exists());
    }
}
