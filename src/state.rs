// src/state.rs

//! Shared application state, assembled once at startup and cloned into
//! handlers and background tasks via `Arc`s.

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::agent::orchestrator::AdvisorAgent;
use crate::agent::trigger::TriggerEvaluator;
use crate::llm::traits::{ChatModel, Embedder};
use crate::providers::registry::ProviderRegistry;
use crate::retrieval::RetrievalEngine;
use crate::store::chat_log::ChatLogStore;
use crate::store::instructions::InstructionStore;
use crate::store::records::RecordStore;
use crate::store::tasks::TaskStore;
use crate::sync::engine::SyncEngine;
use crate::sync::state::SyncTracker;
use crate::tools::dispatcher::ToolDispatcher;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub records: Arc<RecordStore>,
    pub instructions: Arc<InstructionStore>,
    pub tasks: Arc<TaskStore>,
    pub chat_log: Arc<ChatLogStore>,
    pub registry: Arc<ProviderRegistry>,
    pub retrieval: Arc<RetrievalEngine>,
    pub agent: Arc<AdvisorAgent>,
    pub trigger: Arc<TriggerEvaluator>,
    pub sync: Arc<SyncEngine>,
    pub tracker: Arc<SyncTracker>,
}

/// Wire the stores, engines, and agent together. The model and embedder are
/// injected so tests can substitute scripted fakes.
pub fn build_app_state(
    pool: SqlitePool,
    llm: Arc<dyn ChatModel>,
    embedder: Arc<dyn Embedder>,
    registry: Arc<ProviderRegistry>,
) -> AppState {
    let records = Arc::new(RecordStore::new(pool.clone()));
    let instructions = Arc::new(InstructionStore::new(pool.clone()));
    let tasks = Arc::new(TaskStore::new(pool.clone()));
    let chat_log = Arc::new(ChatLogStore::new(pool.clone()));

    let retrieval = Arc::new(RetrievalEngine::new(records.clone(), embedder.clone()));
    let dispatcher = Arc::new(ToolDispatcher::new(
        registry.clone(),
        retrieval.clone(),
        instructions.clone(),
        tasks.clone(),
        llm.clone(),
    ));
    let agent = Arc::new(AdvisorAgent::new(
        llm,
        dispatcher,
        instructions.clone(),
        registry.clone(),
    ));
    let trigger = Arc::new(TriggerEvaluator::new(instructions.clone(), agent.clone()));

    let tracker = Arc::new(SyncTracker::new());
    let sync = Arc::new(SyncEngine::new(
        records.clone(),
        registry.clone(),
        embedder,
        trigger.clone(),
        tracker.clone(),
    ));

    AppState {
        pool,
        records,
        instructions,
        tasks,
        chat_log,
        registry,
        retrieval,
        agent,
        trigger,
        sync,
        tracker,
    }
}
