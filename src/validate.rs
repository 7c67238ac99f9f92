use serde_json::Value;

use crate::error::StoreError;
use crate::model::{Status, TaskPatch};

/// Validate a task title: must contain something other than whitespace.
/// Returns the trimmed title.
pub fn validate_title(title: &str) -> Result<&str, StoreError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(StoreError::validation("Title is required"));
    }
    Ok(trimmed)
}

pub fn parse_status(s: &str) -> Result<Status, StoreError> {
    s.parse::<Status>()
        .map_err(|e| StoreError::validation(e.to_string()))
}

/// A create request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub status: Status,
}

/// `{title, status?}`. JSON `null` is treated like an absent field.
pub fn parse_new_task(body: &Value) -> Result<NewTask, StoreError> {
    let title = match body.get("title") {
        Some(Value::String(s)) => validate_title(s)?.to_string(),
        _ => return Err(StoreError::validation("Title is required")),
    };
    let status = optional_status(body)?.unwrap_or(Status::Todo);
    Ok(NewTask { title, status })
}

/// `{title?, status?, position?}`.
pub fn parse_task_patch(body: &Value) -> Result<TaskPatch, StoreError> {
    if !body.is_object() {
        return Err(StoreError::validation("Request body must be a JSON object"));
    }
    let title = match body.get("title") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(validate_title(s)?.to_string()),
        Some(_) => return Err(StoreError::validation("Title must be a string")),
    };
    let position = match body.get("position") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            v.as_i64()
                .ok_or_else(|| StoreError::validation("Position must be an integer"))?,
        ),
    };
    Ok(TaskPatch {
        title,
        status: optional_status(body)?,
        position,
    })
}

/// `{content}`; content must be a string, empty allowed.
pub fn parse_notes(body: &Value) -> Result<String, StoreError> {
    match body.get("content") {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(StoreError::validation("Content must be a string")),
    }
}

fn optional_status(body: &Value) -> Result<Option<Status>, StoreError> {
    match body.get("status") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_status(s).map(Some),
        Some(_) => Err(StoreError::validation("Status must be a string")),
    }
}
