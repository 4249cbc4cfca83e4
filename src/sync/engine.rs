// src/sync/engine.rs

//! Ingestion pipeline: pulls records from connected providers, dedups them
//! into the store, embeds their text, and raises trigger evaluation for each
//! genuinely new record. All writes funnel through the dedup key, so a
//! crashed or duplicated run never produces duplicate records.

use anyhow::Result;
use chrono::{Duration, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::agent::trigger::TriggerEvaluator;
use crate::config::CONFIG;
use crate::llm::embeddings::truncate_for_embedding;
use crate::llm::traits::Embedder;
use crate::providers::registry::ProviderRegistry;
use crate::store::records::{NewContact, RecordStore};
use crate::sync::state::{SyncError, SyncSource, SyncTracker};

#[derive(Debug, Clone, Copy)]
pub struct SyncReport {
    pub imported: u64,
}

pub struct SyncEngine {
    records: Arc<RecordStore>,
    registry: Arc<ProviderRegistry>,
    embedder: Arc<dyn Embedder>,
    trigger: Arc<TriggerEvaluator>,
    tracker: Arc<SyncTracker>,
}

impl SyncEngine {
    pub fn new(
        records: Arc<RecordStore>,
        registry: Arc<ProviderRegistry>,
        embedder: Arc<dyn Embedder>,
        trigger: Arc<TriggerEvaluator>,
        tracker: Arc<SyncTracker>,
    ) -> Self {
        Self {
            records,
            registry,
            embedder,
            trigger,
            tracker,
        }
    }

    /// Full import of everything the provider will list. Refuses with
    /// `SyncError::AlreadyRunning` while another run holds the same
    /// (user, source) slot.
    pub async fn run_full_sync(&self, user_id: i64, source: SyncSource) -> Result<SyncReport> {
        if !self.tracker.try_begin(user_id, source) {
            return Err(SyncError::AlreadyRunning { user_id, sync_source: source }.into());
        }

        let mut imported = 0u64;
        let result = match source {
            SyncSource::Email => self.import_emails(user_id, None, &mut imported).await,
            SyncSource::Crm => self.import_contacts(user_id, &mut imported).await,
        };

        match result {
            Ok(()) => {
                self.tracker.finish_success(user_id, source, imported);
                info!(user_id, source = %source, imported, "sync complete");
                Ok(SyncReport { imported })
            }
            Err(err) => {
                self.tracker
                    .finish_error(user_id, source, imported, &format!("{err:#}"));
                warn!(user_id, source = %source, imported, "sync failed: {err:#}");
                Err(err)
            }
        }
    }

    /// Incremental email poll over a trailing window. The window overlaps
    /// previous runs on purpose; the dedup key absorbs the overlap. A run
    /// already in flight is skipped silently, not treated as an error.
    pub async fn run_incremental_poll(&self, user_id: i64) -> Result<SyncReport> {
        if !self.tracker.try_begin(user_id, SyncSource::Email) {
            debug!(user_id, "email sync in flight, skipping poll");
            return Ok(SyncReport { imported: 0 });
        }

        let since = Utc::now() - Duration::minutes(CONFIG.poll_window_minutes);
        let mut imported = 0u64;
        let result = self
            .import_emails(user_id, Some(since), &mut imported)
            .await;

        match result {
            Ok(()) => {
                self.tracker
                    .finish_success(user_id, SyncSource::Email, imported);
                if imported > 0 {
                    info!(user_id, imported, "poll imported new emails");
                }
                Ok(SyncReport { imported })
            }
            Err(err) => {
                self.tracker
                    .finish_error(user_id, SyncSource::Email, imported, &format!("{err:#}"));
                warn!(user_id, imported, "poll failed: {err:#}");
                Err(err)
            }
        }
    }

    /// Poll every user with a connected email provider. Per-user failures
    /// are logged and do not stop the sweep.
    pub async fn poll_connected_users(&self) {
        for user_id in self.registry.users_with_email() {
            if let Err(err) = self.run_incremental_poll(user_id).await {
                warn!(user_id, "incremental poll failed: {err:#}");
            }
        }
    }

    async fn import_emails(
        &self,
        user_id: i64,
        since: Option<chrono::DateTime<Utc>>,
        imported: &mut u64,
    ) -> Result<()> {
        let Some(provider) = self.registry.capabilities(user_id).email else {
            return Err(SyncError::NotConnected("email").into());
        };

        let mut page_token: Option<String> = None;
        loop {
            let page = provider.list(since, page_token.as_deref()).await?;

            for envelope in &page.items {
                if self.records.email_exists(user_id, &envelope.id).await? {
                    continue;
                }

                let detail = provider.fetch(&envelope.id).await?;
                let Some(record_id) = self.records.insert_email(user_id, &detail).await? else {
                    // Lost the insert race; the other writer owns this record
                    continue;
                };

                let text = format!(
                    "{} {}",
                    detail.subject.as_deref().unwrap_or(""),
                    detail.body_text.as_deref().unwrap_or("")
                );
                let text = text.trim();
                if !text.is_empty() {
                    let embedding = self.embedder.embed(truncate_for_embedding(text)).await?;
                    self.records.set_email_embedding(record_id, &embedding).await?;
                }

                *imported += 1;

                let summary = json!({
                    "email_id": detail.id,
                    "from": detail.from_address,
                    "subject": detail.subject,
                    "body": detail.body_text,
                });
                if let Err(err) = self
                    .trigger
                    .on_new_record(user_id, SyncSource::Email.trigger_type(), &summary)
                    .await
                {
                    warn!(user_id, email_id = %detail.id, "trigger evaluation failed: {err:#}");
                }
            }

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        Ok(())
    }

    async fn import_contacts(&self, user_id: i64, imported: &mut u64) -> Result<()> {
        let Some(provider) = self.registry.capabilities(user_id).crm else {
            return Err(SyncError::NotConnected("crm").into());
        };

        let mut after: Option<String> = None;
        loop {
            let page = provider.list_contacts(after.as_deref()).await?;

            for contact in &page.items {
                if self.records.contact_exists(user_id, &contact.id).await? {
                    continue;
                }

                let notes = provider.list_notes(&contact.id).await?.join("\n");
                let new = NewContact {
                    contact: contact.clone(),
                    notes,
                };
                let Some(record_id) = self.records.insert_contact(user_id, &new).await? else {
                    continue;
                };

                let text = format!(
                    "{} {} {} {}",
                    contact.first_name.as_deref().unwrap_or(""),
                    contact.last_name.as_deref().unwrap_or(""),
                    contact.email.as_deref().unwrap_or(""),
                    new.notes
                );
                let text = text.trim();
                if !text.is_empty() {
                    let embedding = self.embedder.embed(truncate_for_embedding(text)).await?;
                    self.records
                        .set_contact_embedding(record_id, &embedding)
                        .await?;
                }

                *imported += 1;

                let summary = json!({
                    "contact_id": contact.id,
                    "email": contact.email,
                    "first_name": contact.first_name,
                    "last_name": contact.last_name,
                    "company": contact.company,
                });
                if let Err(err) = self
                    .trigger
                    .on_new_record(user_id, SyncSource::Crm.trigger_type(), &summary)
                    .await
                {
                    warn!(user_id, contact_id = %contact.id, "trigger evaluation failed: {err:#}");
                }
            }

            after = page.next_after;
            if after.is_none() {
                break;
            }
        }

        Ok(())
    }
}
