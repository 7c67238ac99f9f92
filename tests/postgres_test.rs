//! Runs only when `TASKDASH_TEST_DATABASE_URL` points at a scratch database.
//! The dashboard tables in that database are emptied first.

use taskdash::error::StoreError;
use taskdash::model::Status;
use taskdash::store::{self, Backend, Store, ACTION_LOG_LIMIT};

const URL_VAR: &str = "TASKDASH_TEST_DATABASE_URL";

async fn reset(url: &str) {
    let (client, connection) = tokio_postgres::connect(url, tokio_postgres::NoTls)
        .await
        .unwrap();
    tokio::spawn(connection);
    client
        .batch_execute(
            "DROP TABLE IF EXISTS tasks; DROP TABLE IF EXISTS action_log; DROP TABLE IF EXISTS notes;",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn postgres_backend_semantics() {
    let Ok(url) = std::env::var(URL_VAR) else {
        eprintln!("skipping: {URL_VAR} not set");
        return;
    };
    reset(&url).await;

    let store = store::open(&Backend::Postgres { url }).await.unwrap();
    assert_eq!(store.backend(), "postgres");
    store.init().await.unwrap();
    store.init().await.unwrap();
    assert_eq!(store.get_notes().await.unwrap(), "");

    // Create
    assert!(matches!(
        store.create_task("  ", Status::Todo).await,
        Err(StoreError::Validation(_))
    ));
    let milk = store.create_task(" Buy milk ", Status::Todo).await.unwrap();
    assert_eq!(milk.title, "Buy milk");
    assert_eq!(milk.position, 1);
    let eggs = store.create_task("Buy eggs", Status::Todo).await.unwrap();
    assert_eq!(eggs.position, 2);
    let done = store.create_task("Filed taxes", Status::Done).await.unwrap();
    assert_eq!(done.position, 1);

    // Update
    let moved = store
        .update_task(&milk.id, "Buy milk", Status::InProgress, 1)
        .await
        .unwrap();
    assert_eq!(moved.status, Status::InProgress);
    assert!(moved.updated_at > milk.updated_at);
    store
        .update_task(&eggs.id, "Buy brown eggs", Status::Todo, 9)
        .await
        .unwrap();
    assert!(matches!(
        store.update_task("nope", "x", Status::Todo, 0).await,
        Err(StoreError::NotFound(_))
    ));

    // Delete
    store.delete_task(&done.id).await.unwrap();
    store.delete_task(&done.id).await.unwrap();
    assert!(store.get_task(&done.id).await.unwrap().is_none());

    let titles: Vec<String> = store
        .list_tasks()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(titles, ["Buy milk", "Buy brown eggs"]);

    let actions: Vec<String> = store
        .list_actions()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.action)
        .collect();
    assert_eq!(
        actions,
        [
            "Deleted task: \"Filed taxes\"",
            "Moved \"Buy milk\" to in progress",
            "Created task: \"Filed taxes\"",
            "Created task: \"Buy eggs\"",
            "Created task: \"Buy milk\"",
        ]
    );

    // Notes
    store.set_notes("hello").await.unwrap();
    assert_eq!(store.get_notes().await.unwrap(), "hello");
    store.set_notes("").await.unwrap();
    assert_eq!(store.get_notes().await.unwrap(), "");

    // Action cap
    for i in 0..ACTION_LOG_LIMIT {
        store.create_task(&format!("t{i}"), Status::Archived).await.unwrap();
    }
    let actions = store.list_actions().await.unwrap();
    assert_eq!(actions.len() as i64, ACTION_LOG_LIMIT);
    assert!(actions.windows(2).all(|w| w[0].timestamp > w[1].timestamp));
}
