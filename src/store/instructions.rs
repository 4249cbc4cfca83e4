// src/store/instructions.rs

//! Standing instructions: user-authored rules evaluated automatically
//! against future events.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::fmt;
use std::str::FromStr;

/// Which event category activates a standing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerType {
    Communication,
    Calendar,
    Crm,
    All,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Communication => "communication",
            TriggerType::Calendar => "calendar",
            TriggerType::Crm => "crm",
            TriggerType::All => "all",
        }
    }

    /// Does an instruction with this trigger type fire for an event from
    /// `source`? `All` fires for every source.
    pub fn matches(&self, source: TriggerType) -> bool {
        *self == TriggerType::All || *self == source
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "communication" => Ok(TriggerType::Communication),
            "calendar" => Ok(TriggerType::Calendar),
            "crm" => Ok(TriggerType::Crm),
            "all" => Ok(TriggerType::All),
            _ => Err(anyhow::anyhow!("Unknown trigger type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingInstruction {
    pub id: i64,
    pub user_id: i64,
    pub instruction: String,
    pub trigger_type: TriggerType,
    pub is_active: bool,
}

pub struct InstructionStore {
    pool: SqlitePool,
}

impl InstructionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: i64,
        instruction: &str,
        trigger_type: TriggerType,
    ) -> Result<StandingInstruction> {
        let row = sqlx::query(
            r#"
            INSERT INTO standing_instructions (user_id, instruction, trigger_type, is_active)
            VALUES (?, ?, ?, 1)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(instruction)
        .bind(trigger_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(StandingInstruction {
            id: row.get("id"),
            user_id,
            instruction: instruction.to_string(),
            trigger_type,
            is_active: true,
        })
    }

    /// All active instructions for a user (for the system prompt).
    pub async fn active_for_user(&self, user_id: i64) -> Result<Vec<StandingInstruction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, instruction, trigger_type, is_active
            FROM standing_instructions
            WHERE user_id = ? AND is_active = 1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::from_row).collect()
    }

    /// Active instructions that fire for an event from `source`
    /// (trigger_type equals the source, or `all`).
    pub async fn matching(
        &self,
        user_id: i64,
        source: TriggerType,
    ) -> Result<Vec<StandingInstruction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, instruction, trigger_type, is_active
            FROM standing_instructions
            WHERE user_id = ? AND is_active = 1
              AND (trigger_type = ? OR trigger_type = 'all')
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .bind(source.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::from_row).collect()
    }

    /// Toggle the active flag. Instruction text is never edited.
    pub async fn set_active(&self, id: i64, active: bool) -> Result<()> {
        sqlx::query("UPDATE standing_instructions SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<StandingInstruction> {
        let trigger_raw: String = row.get("trigger_type");
        Ok(StandingInstruction {
            id: row.get("id"),
            user_id: row.get("user_id"),
            instruction: row.get("instruction"),
            trigger_type: trigger_raw.parse()?,
            is_active: row.get("is_active"),
        })
    }
}
