// src/store/tasks.rs

//! Multi-step pending actions. The core only ever creates tasks in the
//! `pending` state; later transitions are driven by future conversation
//! turns outside this crate.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(anyhow::anyhow!("Unknown task status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub id: i64,
    pub user_id: i64,
    pub task_type: String,
    pub status: TaskStatus,
    pub description: Option<String>,
}

pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_pending(
        &self,
        user_id: i64,
        task_type: &str,
        description: &str,
        input_data: &Value,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO tasks (user_id, task_type, status, description, input_data)
            VALUES (?, ?, 'pending', ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(task_type)
        .bind(description)
        .bind(input_data.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<TaskRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, task_type, status, description
            FROM tasks
            WHERE user_id = ?
            ORDER BY id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let status_raw: String = row.get("status");
                Ok(TaskRecord {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    task_type: row.get("task_type"),
                    status: status_raw.parse()?,
                    description: row.get("description"),
                })
            })
            .collect()
    }
}
