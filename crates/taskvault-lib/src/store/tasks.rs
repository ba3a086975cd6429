// ============================
// crates/taskvault-lib/src/store/tasks.rs
// ============================
//! Owner-scoped task persistence.
//!
//! Every read, update and delete filters by (id, owner). A task id alone
//! never resolves a row, so a foreign-owned task is indistinguishable
//! from a nonexistent one.
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, TaskPatch, TaskStatus};

/// Default page size for listings.
pub const DEFAULT_LIST_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

/// A validated new task. Construction goes through the handler-level
/// validation; the store only persists.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<chrono::DateTime<Utc>>,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner: &str, new: NewTask) -> Result<Task, AppError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            status: new.status,
            user_id: owner.to_string(),
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO tasks (id, title, description, status, user_id, due_date, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(&task.user_id)
        .bind(task.due_date)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(task)
    }

    pub async fn get_by_id(&self, id: &str, owner: &str) -> Result<Option<Task>, AppError> {
        let task =
            sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE id = ? AND user_id = ?")
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?;
        Ok(task)
    }

    pub async fn list(
        &self,
        owner: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE user_id = ?
             ORDER BY created_at DESC, id LIMIT ? OFFSET ?",
        )
        .bind(owner)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    pub async fn list_by_status(
        &self,
        owner: &str,
        status: TaskStatus,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE user_id = ? AND status = ?
             ORDER BY created_at DESC, id",
        )
        .bind(owner)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(tasks)
    }

    /// Apply a partial update. Only fields present in the patch change;
    /// the rest keep their stored values. Returns `None` for a missing or
    /// foreign-owned task.
    pub async fn update(
        &self,
        id: &str,
        owner: &str,
        patch: TaskPatch,
    ) -> Result<Option<Task>, AppError> {
        let mut tx = self.pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut task) = task else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = Utc::now();

        sqlx::query(
            "UPDATE tasks SET title = ?, description = ?, status = ?, due_date = ?, updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(task.updated_at)
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(task))
    }

    /// Delete an owner's task. Returns whether a row was removed.
    pub async fn delete(&self, id: &str, owner: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
