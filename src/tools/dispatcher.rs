// src/tools/dispatcher.rs

//! Executes a single named tool on the model's behalf. Every handler is
//! exception-isolated: provider failures become `{"success": false, ...}`
//! payloads, never an Err to the orchestrator.

use anyhow::{Result, anyhow};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CONFIG;
use crate::llm::traits::ChatModel;
use crate::providers::registry::ProviderRegistry;
use crate::providers::traits::CrmContactFields;
use crate::retrieval::RetrievalEngine;
use crate::store::instructions::{InstructionStore, TriggerType};
use crate::store::tasks::TaskStore;

/// Closed set of actions the model may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    SearchContext,
    SendEmail,
    CreateCalendarEvent,
    GetCalendarEvents,
    SearchCrmContact,
    CreateCrmContact,
    CreateCrmNote,
    CreateTask,
    CreateStandingInstruction,
}

impl ToolKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "search_context" => Some(ToolKind::SearchContext),
            "send_email" => Some(ToolKind::SendEmail),
            "create_calendar_event" => Some(ToolKind::CreateCalendarEvent),
            "get_calendar_events" => Some(ToolKind::GetCalendarEvents),
            "search_crm_contact" => Some(ToolKind::SearchCrmContact),
            "create_crm_contact" => Some(ToolKind::CreateCrmContact),
            "create_crm_note" => Some(ToolKind::CreateCrmNote),
            "create_task" => Some(ToolKind::CreateTask),
            "create_standing_instruction" => Some(ToolKind::CreateStandingInstruction),
            _ => None,
        }
    }
}

pub struct ToolDispatcher {
    registry: Arc<ProviderRegistry>,
    retrieval: Arc<RetrievalEngine>,
    instructions: Arc<InstructionStore>,
    tasks: Arc<TaskStore>,
    llm: Arc<dyn ChatModel>,
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("Missing '{}' parameter", key))
}

fn optional_str_array(args: &Value, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

impl ToolDispatcher {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        retrieval: Arc<RetrievalEngine>,
        instructions: Arc<InstructionStore>,
        tasks: Arc<TaskStore>,
        llm: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            registry,
            retrieval,
            instructions,
            tasks,
            llm,
        }
    }

    /// Execute a tool by name. Never fails: unknown names and handler errors
    /// both come back as `success: false` payloads.
    pub async fn execute(&self, user_id: i64, name: &str, args: &Value) -> Value {
        let Some(kind) = ToolKind::from_name(name) else {
            return json!({"success": false, "error": format!("Unknown tool: {}", name)});
        };

        match self.dispatch(user_id, kind, args).await {
            Ok(payload) => payload,
            Err(err) => json!({"success": false, "error": err.to_string()}),
        }
    }

    async fn dispatch(&self, user_id: i64, kind: ToolKind, args: &Value) -> Result<Value> {
        match kind {
            ToolKind::SearchContext => {
                let query = required_str(args, "query")?;
                let context = self
                    .retrieval
                    .relevant_context(
                        user_id,
                        query,
                        CONFIG.retrieval_email_k,
                        CONFIG.retrieval_contact_k,
                    )
                    .await?;
                Ok(json!({"success": true, "context": context}))
            }

            ToolKind::SendEmail => {
                let Some(email) = self.registry.capabilities(user_id).email else {
                    return Ok(json!({"success": false, "error": "Email provider not connected"}));
                };
                let to = required_str(args, "to")?;
                let subject = required_str(args, "subject")?;
                let body = required_str(args, "body")?;
                let cc = optional_str_array(args, "cc");

                let message_id = email.send(to, subject, body, &cc).await?;
                info!(user_id, to, "email sent");
                Ok(json!({"success": true, "message_id": message_id}))
            }

            ToolKind::CreateCalendarEvent => {
                let Some(calendar) = self.registry.capabilities(user_id).calendar else {
                    return Ok(
                        json!({"success": false, "error": "Calendar provider not connected"}),
                    );
                };
                let summary = required_str(args, "summary")?;
                let start_time = required_str(args, "start_time")?;
                let end_time = required_str(args, "end_time")?;
                let attendees = optional_str_array(args, "attendees");
                let description = args.get("description").and_then(|v| v.as_str());

                let event_id = calendar
                    .create_event(summary, start_time, end_time, &attendees, description)
                    .await?;
                info!(user_id, summary, "calendar event created");
                Ok(json!({"success": true, "event_id": event_id}))
            }

            ToolKind::GetCalendarEvents => {
                let Some(calendar) = self.registry.capabilities(user_id).calendar else {
                    return Ok(
                        json!({"success": false, "error": "Calendar provider not connected"}),
                    );
                };
                let time_min = args.get("time_min").and_then(|v| v.as_str());
                let time_max = args.get("time_max").and_then(|v| v.as_str());

                let events = calendar.list_events(time_min, time_max).await?;
                Ok(json!({"success": true, "events": events}))
            }

            ToolKind::SearchCrmContact => {
                let Some(crm) = self.registry.capabilities(user_id).crm else {
                    return Ok(json!({"success": false, "error": "CRM provider not connected"}));
                };
                let query = required_str(args, "query")?;

                let contacts = crm.search_contacts(query).await?;
                Ok(json!({"success": true, "contacts": contacts}))
            }

            ToolKind::CreateCrmContact => {
                let Some(crm) = self.registry.capabilities(user_id).crm else {
                    return Ok(json!({"success": false, "error": "CRM provider not connected"}));
                };
                let fields = CrmContactFields {
                    email: required_str(args, "email")?.to_string(),
                    first_name: args
                        .get("first_name")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    last_name: args
                        .get("last_name")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    phone: args.get("phone").and_then(|v| v.as_str()).map(String::from),
                    company: args
                        .get("company")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                };

                let contact = crm.create_contact(&fields).await?;
                info!(user_id, email = %fields.email, "CRM contact created");
                Ok(json!({"success": true, "contact": contact}))
            }

            ToolKind::CreateCrmNote => {
                let Some(crm) = self.registry.capabilities(user_id).crm else {
                    return Ok(json!({"success": false, "error": "CRM provider not connected"}));
                };
                let contact_id = required_str(args, "contact_id")?;
                let note = required_str(args, "note")?;

                let note_id = crm.create_note(contact_id, note).await?;
                Ok(json!({"success": true, "note_id": note_id}))
            }

            ToolKind::CreateTask => {
                let task_type = required_str(args, "task_type")?;
                let description = required_str(args, "description")?;
                let input_data = args.get("input_data").cloned().unwrap_or(json!({}));

                let task_id = self
                    .tasks
                    .create_pending(user_id, task_type, description, &input_data)
                    .await?;
                Ok(json!({"success": true, "task_id": task_id}))
            }

            ToolKind::CreateStandingInstruction => {
                let instruction = required_str(args, "instruction")?;

                let trigger_type = match args.get("trigger_type").and_then(|v| v.as_str()) {
                    Some(explicit) => explicit.parse().unwrap_or(TriggerType::All),
                    None => self.detect_trigger_type(instruction).await,
                };

                let saved = self
                    .instructions
                    .create(user_id, instruction, trigger_type)
                    .await?;
                info!(user_id, trigger = %trigger_type, "standing instruction created");
                Ok(json!({
                    "success": true,
                    "instruction_id": saved.id,
                    "instruction": saved.instruction,
                    "trigger_type": saved.trigger_type.as_str(),
                }))
            }
        }
    }

    /// Classify which event category should trigger an instruction.
    ///
    /// Fails open to `All`: missing an automation is worse than
    /// over-triggering, so an unparseable or failed classification widens
    /// the trigger rather than dropping the instruction.
    async fn detect_trigger_type(&self, instruction: &str) -> TriggerType {
        let prompt = format!(
            r#"Analyze this instruction and determine what type of event should trigger it:
"{}"

The instruction should be triggered by:
- "communication" if it mentions emails, messages, or receiving communications
- "calendar" if it mentions calendar events, meetings, appointments, or scheduling
- "crm" if it mentions the CRM, contacts, or creating/updating contacts
- "all" if it applies to multiple types or is general

Respond with ONLY one word: communication, calendar, crm, or all"#,
            instruction
        );

        let system = "You are a helpful assistant that analyzes instructions and determines \
                      trigger types. Respond with only one word.";

        match self.llm.classify(system, &prompt).await {
            Ok(answer) => answer.parse().unwrap_or_else(|_| {
                warn!(answer = %answer, "unrecognized trigger classification, defaulting to all");
                TriggerType::All
            }),
            Err(err) => {
                warn!("trigger classification failed, defaulting to all: {err:#}");
                TriggerType::All
            }
        }
    }
}
