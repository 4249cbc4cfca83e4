// src/store/records.rs

//! SQLite store for the searchable record corpus (emails and contacts).
//! Embeddings are fixed-width f32 vectors stored as little-endian BLOBs.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::providers::traits::{CrmContact, EmailDetail};

#[derive(Debug, Clone)]
pub struct EmailRecord {
    pub id: i64,
    pub user_id: i64,
    pub external_id: String,
    pub subject: Option<String>,
    pub from_address: Option<String>,
    pub body_text: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone)]
pub struct ContactRecord {
    pub id: i64,
    pub user_id: i64,
    pub external_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub notes: Option<String>,
    pub embedding: Option<Vec<f32>>,
}

impl ContactRecord {
    /// Display name, falling back to "Unknown" when both parts are missing.
    pub fn display_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let name = name.trim();
        if name.is_empty() {
            "Unknown".to_string()
        } else {
            name.to_string()
        }
    }
}

/// Contact fields at insert time (provider contact + its combined notes).
#[derive(Debug, Clone)]
pub struct NewContact {
    pub contact: CrmContact,
    pub notes: String,
}

pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // Helper to convert &[f32] to Vec<u8> for BLOB storage
    fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    // Helper to convert BLOB (Vec<u8>) to Vec<f32>
    fn blob_to_embedding(blob: Option<Vec<u8>>) -> Option<Vec<f32>> {
        blob.map(|bytes| {
            bytes
                .chunks_exact(4)
                .map(|chunk| f32::from_le_bytes(chunk.try_into().expect("4-byte chunk")))
                .collect()
        })
    }

    fn email_from_row(row: &SqliteRow) -> EmailRecord {
        let received_at: Option<NaiveDateTime> = row.get("received_at");
        EmailRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            external_id: row.get("external_id"),
            subject: row.get("subject"),
            from_address: row.get("from_address"),
            body_text: row.get("body_text"),
            received_at: received_at.map(|naive| Utc.from_utc_datetime(&naive)),
            embedding: Self::blob_to_embedding(row.get("embedding")),
        }
    }

    fn contact_from_row(row: &SqliteRow) -> ContactRecord {
        ContactRecord {
            id: row.get("id"),
            user_id: row.get("user_id"),
            external_id: row.get("external_id"),
            email: row.get("email"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            company: row.get("company"),
            notes: row.get("notes"),
            embedding: Self::blob_to_embedding(row.get("embedding")),
        }
    }

    // ── Emails ──────────────────────────────────────────────────────────

    pub async fn email_exists(&self, user_id: i64, external_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM emails WHERE user_id = ? AND external_id = ?",
        )
        .bind(user_id)
        .bind(external_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Insert an email record. Returns None when the (user, external id)
    /// dedup key already exists. The constraint is the authoritative safety
    /// net against concurrent imports.
    pub async fn insert_email(&self, user_id: i64, detail: &EmailDetail) -> Result<Option<i64>> {
        let to_json = serde_json::to_string(&detail.to_addresses)?;
        let cc_json = serde_json::to_string(&detail.cc_addresses)?;

        let row = sqlx::query(
            r#"
            INSERT INTO emails (
                user_id, external_id, thread_id, subject, from_address,
                to_addresses, cc_addresses, body_text, received_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, external_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&detail.id)
        .bind(&detail.thread_id)
        .bind(&detail.subject)
        .bind(&detail.from_address)
        .bind(to_json)
        .bind(cc_json)
        .bind(&detail.body_text)
        .bind(detail.received_at.map(|dt| dt.naive_utc()))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("id")))
    }

    pub async fn set_email_embedding(&self, id: i64, embedding: &[f32]) -> Result<()> {
        sqlx::query("UPDATE emails SET embedding = ? WHERE id = ?")
            .bind(Self::embedding_to_blob(embedding))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Case-insensitive sender-substring matches, newest first. `patterns`
    /// are SQL LIKE patterns (already lowercased and %-wrapped).
    pub async fn find_emails_by_sender(
        &self,
        user_id: i64,
        patterns: &[String],
        limit: usize,
    ) -> Result<Vec<EmailRecord>> {
        if patterns.is_empty() {
            return Ok(Vec::new());
        }

        let clauses = vec!["LOWER(from_address) LIKE ?"; patterns.len()].join(" OR ");
        let sql = format!(
            r#"
            SELECT id, user_id, external_id, subject, from_address, body_text,
                   received_at, embedding
            FROM emails
            WHERE user_id = ? AND ({})
            ORDER BY received_at DESC
            LIMIT ?
            "#,
            clauses
        );

        let mut query = sqlx::query(&sql).bind(user_id);
        for pattern in patterns {
            query = query.bind(pattern);
        }
        let rows = query.bind(limit as i64).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(Self::email_from_row).collect())
    }

    /// All of a user's emails that have an embedding, for semantic ranking.
    pub async fn emails_with_embeddings(&self, user_id: i64) -> Result<Vec<EmailRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, external_id, subject, from_address, body_text,
                   received_at, embedding
            FROM emails
            WHERE user_id = ? AND embedding IS NOT NULL
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::email_from_row).collect())
    }

    pub async fn email_count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM emails WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // ── Contacts ────────────────────────────────────────────────────────

    pub async fn contact_exists(&self, user_id: i64, external_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contacts WHERE user_id = ? AND external_id = ?",
        )
        .bind(user_id)
        .bind(external_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Insert a contact record; None on a dedup-key hit.
    pub async fn insert_contact(&self, user_id: i64, new: &NewContact) -> Result<Option<i64>> {
        let row = sqlx::query(
            r#"
            INSERT INTO contacts (
                user_id, external_id, email, first_name, last_name,
                phone, company, notes
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (user_id, external_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&new.contact.id)
        .bind(&new.contact.email)
        .bind(&new.contact.first_name)
        .bind(&new.contact.last_name)
        .bind(&new.contact.phone)
        .bind(&new.contact.company)
        .bind(&new.notes)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("id")))
    }

    pub async fn set_contact_embedding(&self, id: i64, embedding: &[f32]) -> Result<()> {
        sqlx::query("UPDATE contacts SET embedding = ? WHERE id = ?")
            .bind(Self::embedding_to_blob(embedding))
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn contacts_with_embeddings(&self, user_id: i64) -> Result<Vec<ContactRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, external_id, email, first_name, last_name,
                   company, notes, embedding
            FROM contacts
            WHERE user_id = ? AND embedding IS NOT NULL
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::contact_from_row).collect())
    }

    pub async fn contact_count(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
