// src/llm/mod.rs

pub mod client;
pub mod embeddings;
pub mod traits;

pub use client::OpenAIClient;
pub use traits::{ChatModel, Embedder, ModelReply, ToolCallRequest};
