// src/providers/traits.rs

//! Capability traits for the external systems the assistant acts through.
//! The core never sees wire formats or OAuth, only these contracts.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One list entry from the mail source; details are fetched separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailEnvelope {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailPage {
    pub items: Vec<EmailEnvelope>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailDetail {
    pub id: String,
    pub thread_id: Option<String>,
    pub subject: Option<String>,
    pub from_address: Option<String>,
    pub to_addresses: Vec<String>,
    pub cc_addresses: Vec<String>,
    pub body_text: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// List message envelopes, newest first. `since` restricts to messages
    /// observed after the given instant (provider-side filter).
    async fn list(
        &self,
        since: Option<DateTime<Utc>>,
        page_token: Option<&str>,
    ) -> Result<EmailPage>;

    async fn fetch(&self, id: &str) -> Result<EmailDetail>;

    /// Send a message; returns the provider-assigned message id.
    async fn send(&self, to: &str, subject: &str, body: &str, cc: &[String]) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: String,
    pub start_time: String,
    pub end_time: String,
    pub attendees: Vec<String>,
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn list_events(
        &self,
        time_min: Option<&str>,
        time_max: Option<&str>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Create an event; returns the provider-assigned event id.
    async fn create_event(
        &self,
        summary: &str,
        start_time: &str,
        end_time: &str,
        attendees: &[String],
        description: Option<&str>,
    ) -> Result<String>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrmContact {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrmContactFields {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrmContactPage {
    pub items: Vec<CrmContact>,
    pub next_after: Option<String>,
}

#[async_trait]
pub trait CrmProvider: Send + Sync {
    async fn list_contacts(&self, after: Option<&str>) -> Result<CrmContactPage>;

    async fn search_contacts(&self, query: &str) -> Result<Vec<CrmContact>>;

    async fn create_contact(&self, fields: &CrmContactFields) -> Result<CrmContact>;

    /// Attach a note to a contact; returns the note id.
    async fn create_note(&self, contact_id: &str, body: &str) -> Result<String>;

    /// All note bodies for a contact, oldest first.
    async fn list_notes(&self, contact_id: &str) -> Result<Vec<String>>;
}
