// src/agent/mod.rs

pub mod orchestrator;
pub mod prompt;
pub mod trigger;

pub use orchestrator::{AdvisorAgent, ChatOutcome};
pub use trigger::TriggerEvaluator;
