// src/retrieval/mod.rs

//! Retrieval over the user's historical emails and contacts.
//!
//! Emails get a cheap exact-match pass on the sender address first, which is
//! what users expect for "emails from X" queries, and only fall back to
//! semantic ranking when no literal match exists. Contacts are always ranked
//! semantically. The query is embedded at most once per call, and only when
//! at least one embedded candidate record exists.

use anyhow::Result;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::config::CONFIG;
use crate::llm::embeddings::cosine_distance;
use crate::llm::traits::Embedder;
use crate::store::records::{ContactRecord, EmailRecord, RecordStore};

pub const NO_CONTEXT_SENTINEL: &str = "No relevant context found.";

pub struct RetrievalEngine {
    records: Arc<RecordStore>,
    embedder: Arc<dyn Embedder>,
}

impl RetrievalEngine {
    pub fn new(records: Arc<RecordStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { records, embedder }
    }

    /// Relevant historical context for a query, formatted for the model.
    pub async fn relevant_context(
        &self,
        user_id: i64,
        query: &str,
        k_emails: usize,
        k_contacts: usize,
    ) -> Result<String> {
        let mut query_vec: Option<Vec<f32>> = None;

        let emails = self
            .search_emails(user_id, query, k_emails, &mut query_vec)
            .await?;
        let contacts = self
            .search_contacts(user_id, query, k_contacts, &mut query_vec)
            .await?;

        Ok(format_context(&emails, &contacts))
    }

    /// Exact sender match first; semantic ranking only on a miss.
    async fn search_emails(
        &self,
        user_id: i64,
        query: &str,
        k: usize,
        query_vec: &mut Option<Vec<f32>>,
    ) -> Result<Vec<EmailRecord>> {
        let patterns = sender_patterns(query);
        let exact = self
            .records
            .find_emails_by_sender(user_id, &patterns, k)
            .await?;

        if !exact.is_empty() {
            debug!(user_id, hits = exact.len(), "exact sender match, skipping semantic search");
            return Ok(exact);
        }

        let candidates = self.records.emails_with_embeddings(user_id).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let vec = self.query_embedding(query_vec, query).await?;
        Ok(top_k_by_distance(candidates, |e| e.embedding.as_deref(), &vec, k))
    }

    async fn search_contacts(
        &self,
        user_id: i64,
        query: &str,
        k: usize,
        query_vec: &mut Option<Vec<f32>>,
    ) -> Result<Vec<ContactRecord>> {
        let candidates = self.records.contacts_with_embeddings(user_id).await?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let vec = self.query_embedding(query_vec, query).await?;
        Ok(top_k_by_distance(candidates, |c| c.embedding.as_deref(), &vec, k))
    }

    /// Embed the query lazily and cache the vector for the rest of the call.
    async fn query_embedding(
        &self,
        cache: &mut Option<Vec<f32>>,
        query: &str,
    ) -> Result<Vec<f32>> {
        if let Some(vec) = cache {
            return Ok(vec.clone());
        }
        let vec = self.embedder.embed(query).await?;
        *cache = Some(vec.clone());
        Ok(vec)
    }
}

/// LIKE patterns for the sender field: the query as-is, plus with internal
/// whitespace removed so "john smith" still matches "johnsmith@...".
fn sender_patterns(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase().trim().to_string();
    if lowered.is_empty() {
        return Vec::new();
    }

    let mut patterns = vec![format!("%{}%", lowered)];
    let squeezed: String = lowered.split_whitespace().collect();
    if squeezed != lowered {
        patterns.push(format!("%{}%", squeezed));
    }
    patterns
}

/// Rank by ascending cosine distance to the query vector; stable sort keeps
/// the original order for ties.
fn top_k_by_distance<T>(
    mut items: Vec<T>,
    embedding_of: impl Fn(&T) -> Option<&[f32]>,
    query_vec: &[f32],
    k: usize,
) -> Vec<T> {
    items.sort_by(|a, b| {
        let da = embedding_of(a).map(|e| cosine_distance(query_vec, e)).unwrap_or(f32::MAX);
        let db = embedding_of(b).map(|e| cosine_distance(query_vec, e)).unwrap_or(f32::MAX);
        da.partial_cmp(&db).unwrap_or(Ordering::Equal)
    });
    items.truncate(k);
    items
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

/// One human-readable block for the model, or the no-context sentinel.
fn format_context(emails: &[EmailRecord], contacts: &[ContactRecord]) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !emails.is_empty() {
        parts.push("## Relevant Emails:".to_string());
        for email in emails {
            let date = email
                .received_at
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string());
            parts.push(format!(
                "\nFrom: {}\nSubject: {}\nDate: {}\nBody: {}\n",
                email.from_address.as_deref().unwrap_or("unknown"),
                email.subject.as_deref().unwrap_or("(no subject)"),
                date,
                truncate_chars(
                    email.body_text.as_deref().unwrap_or(""),
                    CONFIG.email_snippet_chars
                ),
            ));
        }
    }

    if !contacts.is_empty() {
        parts.push("\n## Relevant Contacts:".to_string());
        for contact in contacts {
            parts.push(format!(
                "\nName: {}\nEmail: {}\nCompany: {}\nNotes: {}\n",
                contact.display_name(),
                contact.email.as_deref().unwrap_or("unknown"),
                contact.company.as_deref().unwrap_or("N/A"),
                truncate_chars(
                    contact.notes.as_deref().unwrap_or("No notes"),
                    CONFIG.contact_notes_chars
                ),
            ));
        }
    }

    if parts.is_empty() {
        NO_CONTEXT_SENTINEL.to_string()
    } else {
        parts.join("\n")
    }
}
