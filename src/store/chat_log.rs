// src/store/chat_log.rs

//! Conversation transcript persistence, loaded back as the history for
//! subsequent `converse` calls.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

pub struct ChatLogStore {
    pool: SqlitePool,
}

impl ChatLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, user_id: i64, role: &str, content: &str, error: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO chat_messages (user_id, role, content, error) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(role)
        .bind(content)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The last `n` turns for a user, in chronological order.
    pub async fn recent(&self, user_id: i64, n: usize) -> Result<Vec<ChatTurn>> {
        let rows = sqlx::query(
            r#"
            SELECT role, content
            FROM chat_messages
            WHERE user_id = ? AND error = 0
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut turns: Vec<ChatTurn> = rows
            .iter()
            .map(|row| ChatTurn {
                role: row.get("role"),
                content: row.get("content"),
            })
            .collect();
        turns.reverse();

        Ok(turns)
    }
}
