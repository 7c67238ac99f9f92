use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use super::error::{ApiError, StoreResultExt};
use super::AppState;
use crate::model::{Action, Notes, Success, Task};
use crate::validate;

/// Unwrap a JSON body, turning malformed input into a 400.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            log::debug!("rejected request body: {rejection}");
            Err(ApiError::bad_request("Invalid JSON body"))
        }
    }
}

/// GET /tasks
pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .store
        .list_tasks()
        .await
        .or_respond("Failed to fetch tasks")?;
    Ok(Json(tasks))
}

/// POST /tasks
pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let body = json_body(body)?;
    let new = validate::parse_new_task(&body).or_respond("Failed to create task")?;
    let task = state
        .store
        .create_task(&new.title, new.status)
        .await
        .or_respond("Failed to create task")?;
    log::info!("created task {} in {}", task.id, task.status);
    Ok((StatusCode::CREATED, Json(task)))
}

/// PATCH /tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let body = json_body(body)?;
    let patch = validate::parse_task_patch(&body).or_respond("Failed to update task")?;
    let existing = state
        .store
        .get_task(&id)
        .await
        .or_respond("Failed to update task")?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    let (title, status, position) = patch.merge(&existing);
    let task = state
        .store
        .update_task(&id, &title, status, position)
        .await
        .or_respond("Failed to update task")?;
    Ok(Json(task))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Success>, ApiError> {
    state
        .store
        .delete_task(&id)
        .await
        .or_respond("Failed to delete task")?;
    Ok(Json(Success::OK))
}

/// GET /notes
pub async fn get_notes(State(state): State<AppState>) -> Result<Json<Notes>, ApiError> {
    let content = state
        .store
        .get_notes()
        .await
        .or_respond("Failed to fetch notes")?;
    Ok(Json(Notes { content }))
}

/// PUT /notes
pub async fn put_notes(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Success>, ApiError> {
    let body = json_body(body)?;
    let content = validate::parse_notes(&body).or_respond("Failed to update notes")?;
    state
        .store
        .set_notes(&content)
        .await
        .or_respond("Failed to update notes")?;
    Ok(Json(Success::OK))
}

/// GET /actions
pub async fn list_actions(State(state): State<AppState>) -> Result<Json<Vec<Action>>, ApiError> {
    let actions = state
        .store
        .list_actions()
        .await
        .or_respond("Failed to fetch actions")?;
    Ok(Json(actions))
}
