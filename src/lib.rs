// src/lib.rs

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod providers;
pub mod retrieval;
pub mod state;
pub mod store;
pub mod sync;
pub mod tools;
