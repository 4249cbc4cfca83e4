// src/agent/trigger.rs

//! Evaluates standing instructions against newly ingested records. Thin by
//! design: it filters instructions, builds a synthetic prompt, and hands the
//! decision to the orchestrator as if it were a user message.

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::agent::orchestrator::AdvisorAgent;
use crate::agent::prompt::build_trigger_prompt;
use crate::store::instructions::{InstructionStore, TriggerType};

pub struct TriggerEvaluator {
    instructions: Arc<InstructionStore>,
    agent: Arc<AdvisorAgent>,
}

impl TriggerEvaluator {
    pub fn new(instructions: Arc<InstructionStore>, agent: Arc<AdvisorAgent>) -> Self {
        Self { instructions, agent }
    }

    /// Evaluate a new record against the user's standing instructions.
    /// Returns the agent's response when any instruction fired; `None` (with
    /// no model call) when nothing matches.
    pub async fn on_new_record(
        &self,
        user_id: i64,
        source: TriggerType,
        summary: &Value,
    ) -> Result<Option<String>> {
        let matching = self.instructions.matching(user_id, source).await?;
        if matching.is_empty() {
            debug!(user_id, source = %source, "no standing instructions match, skipping");
            return Ok(None);
        }

        let prompt = build_trigger_prompt(Utc::now(), source, summary, &matching);
        let outcome = self.agent.converse(user_id, &prompt, &[]).await;

        if let Some(err) = outcome.error {
            warn!(user_id, source = %source, "trigger evaluation failed: {err}");
        }
        Ok(outcome.response)
    }
}
