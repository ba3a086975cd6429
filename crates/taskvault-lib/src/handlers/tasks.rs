// ============================
// crates/taskvault-lib/src/handlers/tasks.rs
// ============================
//! Task endpoints.
//!
//! Identity on this route group is resolved through the cookie-session
//! strategy; every store call is scoped to the resolved owner. Status text
//! is checked against the fixed enumeration here, before the store is
//! touched.
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::{Task, TaskCreateRequest, TaskPatch, TaskStatus, TaskUpdateRequest};
use crate::store::{NewTask, DEFAULT_LIST_LIMIT};
use crate::validation;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// `GET /tasks`
pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Task>>, AppError> {
    let owner = state.session_identity.resolve(&headers).await?;

    let tasks = match params.status {
        Some(status) => {
            let status = TaskStatus::parse(&status)?;
            state.tasks.list_by_status(&owner, status).await?
        }
        None => {
            let offset = params.offset.max(0);
            let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 500);
            state.tasks.list(&owner, offset, limit).await?
        }
    };

    tracing::debug!(owner = %owner, count = tasks.len(), "listed tasks");
    Ok(Json(tasks))
}

/// `POST /tasks`
pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TaskCreateRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let owner = state.session_identity.resolve(&headers).await?;

    validation::validate_title(&body.title)?;
    if let Some(description) = &body.description {
        validation::validate_description(description)?;
    }
    let status = match body.status.as_deref() {
        Some(raw) => TaskStatus::parse(raw)?,
        None => TaskStatus::Pending,
    };

    let task = state
        .tasks
        .create(
            &owner,
            NewTask {
                title: body.title,
                description: body.description,
                status,
                due_date: body.due_date,
            },
        )
        .await?;

    tracing::info!(task_id = %task.id, owner = %owner, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /tasks/{id}`
pub async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let owner = state.session_identity.resolve(&headers).await?;

    let task = state
        .tasks
        .get_by_id(&id, &owner)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    Ok(Json(task))
}

/// `PUT /tasks/{id}`
pub async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<TaskUpdateRequest>,
) -> Result<Json<Task>, AppError> {
    let owner = state.session_identity.resolve(&headers).await?;

    let mut patch = TaskPatch::default();
    if let Some(title) = body.title {
        validation::validate_title(&title)?;
        patch.title = Some(title);
    }
    if let Some(description) = body.description {
        validation::validate_description(&description)?;
        patch.description = Some(description);
    }
    if let Some(status) = body.status {
        patch.status = Some(TaskStatus::parse(&status)?);
    }
    patch.due_date = body.due_date;

    let task = state
        .tasks
        .update(&id, &owner, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %task.id, owner = %owner, "task updated");
    Ok(Json(task))
}

/// `DELETE /tasks/{id}`
pub async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let owner = state.session_identity.resolve(&headers).await?;

    if !state.tasks.delete(&id, &owner).await? {
        return Err(AppError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %id, owner = %owner, "task deleted");
    Ok(StatusCode::NO_CONTENT)
}
