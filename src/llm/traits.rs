// src/llm/traits.rs

//! Capability traits for the language model and embedding provider.
//! All model access goes through these traits; no direct API calls in
//! business logic.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};

/// One tool invocation requested by the model, in the order returned.
#[derive(Debug, Clone)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// Parsed reply from a chat call. `message` is the raw assistant message so
/// it can be appended verbatim to the transcript before tool results.
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub message: Value,
    pub text: Option<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelReply {
    /// A plain-text reply with no tool calls.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            message: json!({"role": "assistant", "content": text}),
            text: Some(text),
            tool_calls: Vec::new(),
        }
    }
}

/// Conversational model with tool-calling support.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Submit a message sequence. `tools` is the function schema offered to
    /// the model (empty slice = no tools, forces a text reply).
    async fn chat(&self, messages: Vec<Value>, tools: Vec<Value>) -> Result<ModelReply>;

    /// Single-purpose low-temperature call returning a short text answer.
    async fn classify(&self, system_prompt: &str, prompt: &str) -> Result<String>;
}

/// Maps text to a fixed-dimensionality dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
