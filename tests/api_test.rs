use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{DateTime, FixedOffset};
use serde_json::{json, Value};
use tower::ServiceExt;

use taskdash::server;
use taskdash::store::{SqliteStore, Store};

async fn app() -> Router {
    let store = SqliteStore::open_in_memory().unwrap();
    store.init().await.unwrap();
    server::router(Arc::new(store))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn action_texts(app: &Router) -> Vec<String> {
    let (status, actions) = send(app, Method::GET, "/actions", None).await;
    assert_eq!(status, StatusCode::OK);
    actions
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["action"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn task_lifecycle() {
    let app = app().await;

    let (status, task) = send(&app, Method::POST, "/tasks", Some(json!({"title": "Buy milk"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["status"], "todo");
    assert_eq!(task["position"], 1);
    let id = task["id"].as_str().unwrap().to_string();

    let (status, moved) = send(
        &app,
        Method::PATCH,
        &format!("/tasks/{id}"),
        Some(json!({"status": "in_progress"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["status"], "in_progress");
    assert_eq!(moved["title"], "Buy milk");
    assert_eq!(
        action_texts(&app).await,
        [
            "Moved \"Buy milk\" to in progress",
            "Created task: \"Buy milk\"",
        ]
    );

    let (status, body) = send(&app, Method::DELETE, &format!("/tasks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));

    let (status, tasks) = send(&app, Method::GET, "/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks, json!([]));
    assert_eq!(action_texts(&app).await[0], "Deleted task: \"Buy milk\"");
}

#[tokio::test]
async fn create_in_explicit_status_appends_to_group() {
    let app = app().await;
    for title in ["one", "two"] {
        let (status, task) = send(
            &app,
            Method::POST,
            "/tasks",
            Some(json!({"title": title, "status": "done"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["status"], "done");
    }
    let (_, task) = send(&app, Method::POST, "/tasks", Some(json!({"title": "three"}))).await;
    assert_eq!(task["position"], 1);

    let (_, tasks) = send(&app, Method::GET, "/tasks", None).await;
    let done: Vec<i64> = tasks
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["status"] == "done")
        .map(|t| t["position"].as_i64().unwrap())
        .collect();
    assert_eq!(done, [1, 2]);
}

#[tokio::test]
async fn create_rejects_bad_input() {
    let app = app().await;
    let cases = [
        json!({}),
        json!({"title": ""}),
        json!({"title": "   "}),
        json!({"title": 42}),
        json!({"title": "ok", "status": "blocked"}),
    ];
    for body in cases {
        let (status, err) = send(&app, Method::POST, "/tasks", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert!(err["error"].is_string(), "body {body}");
    }
    assert!(action_texts(&app).await.is_empty());
}

#[tokio::test]
async fn malformed_json_is_400() {
    let app = app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tasks")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_unknown_task_is_404() {
    let app = app().await;
    let (status, err) = send(
        &app,
        Method::PATCH,
        "/tasks/does-not-exist",
        Some(json!({"title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err, json!({"error": "Task not found"}));
}

#[tokio::test]
async fn patch_merges_and_ignores_nulls() {
    let app = app().await;
    let (_, task) = send(&app, Method::POST, "/tasks", Some(json!({"title": "Draft"}))).await;
    let id = task["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        Method::PATCH,
        &format!("/tasks/{id}"),
        Some(json!({"title": null, "status": null, "position": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Draft");
    assert_eq!(updated["status"], "todo");
    assert_eq!(updated["position"], 7);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/tasks/{id}"),
        Some(json!({"title": "Final"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Neither edit changed the status.
    assert_eq!(action_texts(&app).await, ["Created task: \"Draft\""]);
}

#[tokio::test]
async fn patch_rejects_bad_fields() {
    let app = app().await;
    let (_, task) = send(&app, Method::POST, "/tasks", Some(json!({"title": "Keep"}))).await;
    let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

    for body in [
        json!({"title": "  "}),
        json!({"status": "later"}),
        json!({"position": "first"}),
        json!({"position": 1.5}),
        json!(["not", "an", "object"]),
    ] {
        let (status, _) = send(&app, Method::PATCH, &uri, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
    }

    let (_, tasks) = send(&app, Method::GET, "/tasks", None).await;
    assert_eq!(tasks[0]["title"], "Keep");
}

#[tokio::test]
async fn delete_unknown_task_succeeds_silently() {
    let app = app().await;
    let (status, body) = send(&app, Method::DELETE, "/tasks/nope", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    assert!(action_texts(&app).await.is_empty());
}

#[tokio::test]
async fn notes_round_trip() {
    let app = app().await;
    let (status, notes) = send(&app, Method::GET, "/notes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(notes, json!({"content": ""}));

    let (status, body) = send(&app, Method::PUT, "/notes", Some(json!({"content": "hello"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    let (_, notes) = send(&app, Method::GET, "/notes", None).await;
    assert_eq!(notes, json!({"content": "hello"}));

    send(&app, Method::PUT, "/notes", Some(json!({"content": ""}))).await;
    let (_, notes) = send(&app, Method::GET, "/notes", None).await;
    assert_eq!(notes, json!({"content": ""}));

    let (status, _) = send(&app, Method::PUT, "/notes", Some(json!({"content": 3}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // Notes edits are not logged.
    assert!(action_texts(&app).await.is_empty());
}

#[tokio::test]
async fn actions_are_capped_at_fifty() {
    let app = app().await;
    for i in 0..55 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/tasks",
            Some(json!({"title": format!("task {i}")})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (_, actions) = send(&app, Method::GET, "/actions", None).await;
    let actions = actions.as_array().unwrap();
    assert_eq!(actions.len(), 50);
    assert_eq!(actions[0]["action"], "Created task: \"task 54\"");
    assert_eq!(actions[49]["action"], "Created task: \"task 5\"");

    let stamps: Vec<DateTime<FixedOffset>> = actions
        .iter()
        .map(|a| DateTime::parse_from_rfc3339(a["timestamp"].as_str().unwrap()).unwrap())
        .collect();
    assert!(stamps.windows(2).all(|w| w[0] > w[1]));
}
