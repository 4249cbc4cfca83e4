// src/sync/mod.rs

pub mod engine;
pub mod scheduler;
pub mod state;

pub use engine::{SyncEngine, SyncReport};
pub use scheduler::spawn_poll_scheduler;
pub use state::{SyncError, SyncSource, SyncStatus, SyncTracker};
