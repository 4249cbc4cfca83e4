// src/agent/orchestrator.rs

//! The conversation orchestrator: owns the system prompt, the message
//! sequence, and the two-round tool-calling protocol. Sole entry point for
//! both direct user chat and the trigger evaluator.

use anyhow::{Result, anyhow};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::agent::prompt::build_system_prompt;
use crate::llm::traits::ChatModel;
use crate::providers::registry::ProviderRegistry;
use crate::store::chat_log::ChatTurn;
use crate::store::instructions::InstructionStore;
use crate::tools::definitions::tool_schema;
use crate::tools::dispatcher::ToolDispatcher;

/// Result of one conversation turn. Exactly one of the fields is set; the
/// orchestrator never raises past its boundary.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub response: Option<String>,
    pub error: Option<String>,
}

pub struct AdvisorAgent {
    llm: Arc<dyn ChatModel>,
    dispatcher: Arc<ToolDispatcher>,
    instructions: Arc<InstructionStore>,
    registry: Arc<ProviderRegistry>,
}

impl AdvisorAgent {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        dispatcher: Arc<ToolDispatcher>,
        instructions: Arc<InstructionStore>,
        registry: Arc<ProviderRegistry>,
    ) -> Self {
        Self {
            llm,
            dispatcher,
            instructions,
            registry,
        }
    }

    /// Process one user message. Not idempotent: tools may have side
    /// effects, so callers must not retry blindly.
    pub async fn converse(&self, user_id: i64, message: &str, history: &[ChatTurn]) -> ChatOutcome {
        match self.run_conversation(user_id, message, history).await {
            Ok(response) => ChatOutcome {
                response: Some(response),
                error: None,
            },
            Err(err) => ChatOutcome {
                response: None,
                error: Some(format!("Error processing message: {err:#}")),
            },
        }
    }

    /// Two rounds, no recursion: one call with tools offered, sequential
    /// tool execution in model order, then one final call without tools.
    async fn run_conversation(
        &self,
        user_id: i64,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<String> {
        let caps = self.registry.capabilities(user_id);
        let active = self.instructions.active_for_user(user_id).await?;
        let system_prompt = build_system_prompt(Utc::now(), &caps, &active);

        let mut messages = vec![json!({"role": "system", "content": system_prompt})];
        for turn in history {
            messages.push(json!({"role": turn.role, "content": turn.content}));
        }
        messages.push(json!({"role": "user", "content": message}));

        let reply = self.llm.chat(messages.clone(), tool_schema()).await?;

        if reply.tool_calls.is_empty() {
            return reply
                .text
                .ok_or_else(|| anyhow!("Model returned neither text nor tool calls"));
        }

        debug!(user_id, tool_calls = reply.tool_calls.len(), "executing tool calls");
        messages.push(reply.message.clone());

        for call in &reply.tool_calls {
            let result = self.dispatcher.execute(user_id, &call.name, &call.arguments).await;
            info!(user_id, tool = %call.name, success = result["success"].as_bool().unwrap_or(false), "tool executed");
            messages.push(json!({
                "role": "tool",
                "tool_call_id": call.id,
                "content": result.to_string(),
            }));
        }

        // Final synthesis round with no tools offered
        let final_reply = self.llm.chat(messages, Vec::new()).await?;
        final_reply
            .text
            .ok_or_else(|| anyhow!("Model returned no content in final response"))
    }
}
