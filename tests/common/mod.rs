// tests/common/mod.rs

//! Shared test fixtures: an in-memory database and scripted stand-ins for
//! the model, embedder, and external providers.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use advisor_agent::llm::traits::{ChatModel, Embedder, ModelReply, ToolCallRequest};
use advisor_agent::providers::registry::ProviderRegistry;
use advisor_agent::providers::traits::{
    CalendarEvent, CalendarProvider, CrmContact, CrmContactFields, CrmContactPage, CrmProvider,
    EmailDetail, EmailEnvelope, EmailPage, EmailProvider,
};
use advisor_agent::state::{AppState, build_app_state};
use advisor_agent::store::migration::run_migrations;
use std::sync::Arc;

pub async fn test_pool() -> SqlitePool {
    // One connection: each :memory: connection is its own database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    run_migrations(&pool).await.expect("run migrations");
    pool
}

pub async fn build_state(
    llm: Arc<MockChatModel>,
    embedder: Arc<MockEmbedder>,
    registry: Arc<ProviderRegistry>,
) -> AppState {
    let pool = test_pool().await;
    build_app_state(pool, llm, embedder, registry)
}

// ── Model ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockChatModel {
    replies: Mutex<Vec<Result<ModelReply, String>>>,
    classifications: Mutex<Vec<String>>,
    chat_calls: AtomicUsize,
    classify_calls: AtomicUsize,
}

impl MockChatModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_text(&self, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .push(Ok(ModelReply::from_text(text)));
    }

    pub fn script_tool_call(&self, name: &str, arguments: Value) {
        let call_id = format!("call_{}", uuid::Uuid::new_v4().simple());
        let reply = ModelReply {
            message: json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": call_id.clone(),
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()},
                }],
            }),
            text: None,
            tool_calls: vec![ToolCallRequest {
                id: call_id,
                name: name.to_string(),
                arguments,
            }],
        };
        self.replies.lock().unwrap().push(Ok(reply));
    }

    pub fn script_error(&self, message: &str) {
        self.replies.lock().unwrap().push(Err(message.to_string()));
    }

    pub fn script_classification(&self, answer: &str) {
        self.classifications.lock().unwrap().push(answer.to_string());
    }

    pub fn chat_call_count(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn classify_call_count(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(&self, _messages: Vec<Value>, _tools: Vec<Value>) -> Result<ModelReply> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(ModelReply::from_text("OK"));
        }
        match replies.remove(0) {
            Ok(reply) => Ok(reply),
            Err(message) => Err(anyhow!(message)),
        }
    }

    async fn classify(&self, _system_prompt: &str, _prompt: &str) -> Result<String> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.classifications.lock().unwrap();
        if answers.is_empty() {
            return Err(anyhow!("no classification scripted"));
        }
        Ok(answers.remove(0))
    }
}

// ── Embedder ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockEmbedder {
    vectors: Mutex<Vec<Vec<f32>>>,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_vector(&self, vector: Vec<f32>) {
        self.vectors.lock().unwrap().push(vector);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut vectors = self.vectors.lock().unwrap();
        if vectors.is_empty() {
            return Ok(vec![0.5, 0.5, 0.5]);
        }
        Ok(vectors.remove(0))
    }
}

// ── Email provider ──────────────────────────────────────────────────────

pub struct MockEmailProvider {
    pages: Vec<Vec<EmailDetail>>,
    fail_fetch_id: Option<String>,
    list_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    sent: Mutex<Vec<(String, String)>>,
}

impl MockEmailProvider {
    /// Each inner Vec is one list page, in order.
    pub fn with_pages(pages: Vec<Vec<EmailDetail>>) -> Self {
        Self {
            pages,
            fail_fetch_id: None,
            list_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_fetch(mut self, id: &str) -> Self {
        self.fail_fetch_id = Some(id.to_string());
        self
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_call_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn list(
        &self,
        _since: Option<DateTime<Utc>>,
        page_token: Option<&str>,
    ) -> Result<EmailPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let index: usize = page_token.map(|t| t.parse().unwrap_or(0)).unwrap_or(0);
        let items = self
            .pages
            .get(index)
            .map(|page| {
                page.iter()
                    .map(|detail| EmailEnvelope {
                        id: detail.id.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let next_page_token = if index + 1 < self.pages.len() {
            Some((index + 1).to_string())
        } else {
            None
        };
        Ok(EmailPage {
            items,
            next_page_token,
        })
    }

    async fn fetch(&self, id: &str) -> Result<EmailDetail> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch_id.as_deref() == Some(id) {
            return Err(anyhow!("upstream error fetching {id}"));
        }
        self.pages
            .iter()
            .flatten()
            .find(|detail| detail.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("no such message: {id}"))
    }

    async fn send(&self, to: &str, subject: &str, _body: &str, _cc: &[String]) -> Result<String> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok("sent-message-1".to_string())
    }
}

pub fn email_detail(id: &str, from: &str, subject: &str, body: &str) -> EmailDetail {
    EmailDetail {
        id: id.to_string(),
        thread_id: None,
        subject: Some(subject.to_string()),
        from_address: Some(from.to_string()),
        to_addresses: vec!["advisor@firm.com".to_string()],
        cc_addresses: Vec::new(),
        body_text: Some(body.to_string()),
        received_at: Some(Utc::now()),
    }
}

// ── Calendar provider ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockCalendarProvider {
    created: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockCalendarProvider {
    pub fn created_events(&self) -> Vec<(String, Vec<String>)> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarProvider for MockCalendarProvider {
    async fn list_events(
        &self,
        _time_min: Option<&str>,
        _time_max: Option<&str>,
    ) -> Result<Vec<CalendarEvent>> {
        Ok(Vec::new())
    }

    async fn create_event(
        &self,
        summary: &str,
        _start_time: &str,
        _end_time: &str,
        attendees: &[String],
        _description: Option<&str>,
    ) -> Result<String> {
        self.created
            .lock()
            .unwrap()
            .push((summary.to_string(), attendees.to_vec()));
        Ok("event-1".to_string())
    }
}

// ── CRM provider ────────────────────────────────────────────────────────

pub struct MockCrmProvider {
    pages: Vec<Vec<CrmContact>>,
    notes: HashMap<String, Vec<String>>,
    list_calls: AtomicUsize,
}

impl MockCrmProvider {
    pub fn with_pages(pages: Vec<Vec<CrmContact>>) -> Self {
        Self {
            pages,
            notes: HashMap::new(),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_notes(mut self, contact_id: &str, notes: Vec<&str>) -> Self {
        self.notes.insert(
            contact_id.to_string(),
            notes.into_iter().map(String::from).collect(),
        );
        self
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CrmProvider for MockCrmProvider {
    async fn list_contacts(&self, after: Option<&str>) -> Result<CrmContactPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let index: usize = after.map(|t| t.parse().unwrap_or(0)).unwrap_or(0);
        let items = self.pages.get(index).cloned().unwrap_or_default();
        let next_after = if index + 1 < self.pages.len() {
            Some((index + 1).to_string())
        } else {
            None
        };
        Ok(CrmContactPage { items, next_after })
    }

    async fn search_contacts(&self, query: &str) -> Result<Vec<CrmContact>> {
        let query = query.to_lowercase();
        Ok(self
            .pages
            .iter()
            .flatten()
            .filter(|c| {
                c.email
                    .as_deref()
                    .map(|e| e.to_lowercase().contains(&query))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn create_contact(&self, fields: &CrmContactFields) -> Result<CrmContact> {
        Ok(CrmContact {
            id: "contact-new".to_string(),
            email: Some(fields.email.clone()),
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            phone: fields.phone.clone(),
            company: fields.company.clone(),
        })
    }

    async fn create_note(&self, _contact_id: &str, _body: &str) -> Result<String> {
        Ok("note-1".to_string())
    }

    async fn list_notes(&self, contact_id: &str) -> Result<Vec<String>> {
        Ok(self.notes.get(contact_id).cloned().unwrap_or_default())
    }
}

pub fn crm_contact(id: &str, email: &str, first: &str, last: &str) -> CrmContact {
    CrmContact {
        id: id.to_string(),
        email: Some(email.to_string()),
        first_name: Some(first.to_string()),
        last_name: Some(last.to_string()),
        phone: None,
        company: None,
    }
}
