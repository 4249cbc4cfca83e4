// src/sync/state.rs

//! Per-(user, source) sync bookkeeping. The tracker is the mutual-exclusion
//! point: a sync for a key may only start through `try_begin`, which refuses
//! while another run for the same key is in flight.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use crate::store::instructions::TriggerType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncSource {
    Email,
    Crm,
}

impl SyncSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncSource::Email => "email",
            SyncSource::Crm => "crm",
        }
    }

    /// Event category that records from this source raise.
    pub fn trigger_type(&self) -> TriggerType {
        match self {
            SyncSource::Email => TriggerType::Communication,
            SyncSource::Crm => TriggerType::Crm,
        }
    }
}

impl std::fmt::Display for SyncSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync already running for user {user_id} source {sync_source}")]
    AlreadyRunning { user_id: i64, sync_source: SyncSource },
    #[error("{0} provider not connected")]
    NotConnected(&'static str),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStatus {
    pub syncing: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub imported_count: u64,
    pub error: Option<String>,
}

/// Process-local sync state. Lost on restart, which is acceptable: the
/// dedup key on the record tables makes a re-run harmless.
#[derive(Default)]
pub struct SyncTracker {
    entries: Mutex<HashMap<(i64, SyncSource), SyncStatus>>,
}

impl SyncTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the (user, source) slot. Returns false without touching the
    /// entry when a run is already in flight.
    pub fn try_begin(&self, user_id: i64, source: SyncSource) -> bool {
        let mut entries = self.entries.lock().expect("sync tracker lock");
        let status = entries.entry((user_id, source)).or_default();
        if status.syncing {
            return false;
        }
        *status = SyncStatus {
            syncing: true,
            started_at: Some(Utc::now()),
            completed_at: None,
            imported_count: 0,
            error: None,
        };
        true
    }

    pub fn finish_success(&self, user_id: i64, source: SyncSource, imported: u64) {
        let mut entries = self.entries.lock().expect("sync tracker lock");
        if let Some(status) = entries.get_mut(&(user_id, source)) {
            status.syncing = false;
            status.completed_at = Some(Utc::now());
            status.imported_count = imported;
            status.error = None;
        }
    }

    pub fn finish_error(&self, user_id: i64, source: SyncSource, imported: u64, error: &str) {
        let mut entries = self.entries.lock().expect("sync tracker lock");
        if let Some(status) = entries.get_mut(&(user_id, source)) {
            status.syncing = false;
            status.completed_at = Some(Utc::now());
            status.imported_count = imported;
            status.error = Some(error.to_string());
        }
    }

    pub fn is_syncing(&self, user_id: i64, source: SyncSource) -> bool {
        let entries = self.entries.lock().expect("sync tracker lock");
        entries
            .get(&(user_id, source))
            .map(|s| s.syncing)
            .unwrap_or(false)
    }

    pub fn snapshot(&self, user_id: i64, source: SyncSource) -> SyncStatus {
        let entries = self.entries.lock().expect("sync tracker lock");
        entries
            .get(&(user_id, source))
            .cloned()
            .unwrap_or_default()
    }
}
