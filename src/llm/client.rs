// src/llm/client.rs

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::env;

use crate::config::CONFIG;
use crate::llm::embeddings::truncate_for_embedding;
use crate::llm::traits::{ChatModel, Embedder, ModelReply, ToolCallRequest};

#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    api_key: String,
}

impl OpenAIClient {
    pub fn new() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;

        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(CONFIG.openai_api_url(path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
    }

    async fn send_json(&self, path: &str, payload: &Value) -> Result<Value> {
        let response = self
            .post(path)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", path))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("OpenAI API error {}: {}", status, error_text));
        }

        response.json().await.context("Failed to parse response")
    }

    /// Chat completion with function calling support
    pub async fn chat_with_tools(&self, messages: Vec<Value>, tools: Vec<Value>) -> Result<Value> {
        let mut payload = json!({
            "model": CONFIG.chat_model,
            "messages": messages,
            "temperature": 0.7,
        });

        if !tools.is_empty() {
            payload["tools"] = json!(tools);
            payload["tool_choice"] = json!("auto");
        }

        self.send_json("chat/completions", &payload).await
    }

    /// Parse the first choice of a chat completion into a ModelReply.
    fn parse_reply(response: &Value) -> Result<ModelReply> {
        let message = response["choices"][0]
            .get("message")
            .cloned()
            .ok_or_else(|| anyhow!("No message in OpenAI chat response"))?;

        let text = message["content"].as_str().map(|s| s.to_string());

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let id = call["id"]
                    .as_str()
                    .ok_or_else(|| anyhow!("Tool call missing id"))?
                    .to_string();
                let name = call["function"]["name"]
                    .as_str()
                    .ok_or_else(|| anyhow!("Tool call missing function name"))?
                    .to_string();
                // Arguments arrive as a JSON-encoded string
                let raw_args = call["function"]["arguments"].as_str().unwrap_or("{}");
                let arguments: Value = serde_json::from_str(raw_args)
                    .with_context(|| format!("Invalid arguments for tool '{}'", name))?;
                tool_calls.push(ToolCallRequest { id, name, arguments });
            }
        }

        Ok(ModelReply {
            message,
            text,
            tool_calls,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIClient {
    async fn chat(&self, messages: Vec<Value>, tools: Vec<Value>) -> Result<ModelReply> {
        let response = self.chat_with_tools(messages, tools).await?;
        Self::parse_reply(&response)
    }

    async fn classify(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        let payload = json!({
            "model": CONFIG.classifier_model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": prompt},
            ],
            "temperature": 0.2,
            "max_tokens": 10,
        });

        let response = self.send_json("chat/completions", &payload).await?;

        response["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("No content in classification response"))
    }
}

#[async_trait]
impl Embedder for OpenAIClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = truncate_for_embedding(text);

        let payload = json!({
            "model": CONFIG.embedding_model,
            "input": input,
        });

        let response = self.send_json("embeddings", &payload).await?;

        let vector = response["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| anyhow!("No embedding in response"))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        Ok(vector)
    }
}
