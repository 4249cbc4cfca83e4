// src/providers/registry.rs

//! Per-user capability lookup. The OAuth/token layer (outside the core)
//! registers providers here once a user connects an integration.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::providers::traits::{CalendarProvider, CrmProvider, EmailProvider};

/// The capability providers currently connected for one user. Cloning is
/// cheap (Arc handles), so callers take a snapshot per operation.
#[derive(Clone, Default)]
pub struct Capabilities {
    pub email: Option<Arc<dyn EmailProvider>>,
    pub calendar: Option<Arc<dyn CalendarProvider>>,
    pub crm: Option<Arc<dyn CrmProvider>>,
}

#[derive(Default)]
pub struct ProviderRegistry {
    inner: RwLock<HashMap<i64, Capabilities>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_email(&self, user_id: i64, provider: Arc<dyn EmailProvider>) {
        let mut map = self.inner.write().expect("provider registry poisoned");
        map.entry(user_id).or_default().email = Some(provider);
    }

    pub fn register_calendar(&self, user_id: i64, provider: Arc<dyn CalendarProvider>) {
        let mut map = self.inner.write().expect("provider registry poisoned");
        map.entry(user_id).or_default().calendar = Some(provider);
    }

    pub fn register_crm(&self, user_id: i64, provider: Arc<dyn CrmProvider>) {
        let mut map = self.inner.write().expect("provider registry poisoned");
        map.entry(user_id).or_default().crm = Some(provider);
    }

    /// Snapshot of a user's connected capabilities (empty when unknown user).
    pub fn capabilities(&self, user_id: i64) -> Capabilities {
        let map = self.inner.read().expect("provider registry poisoned");
        map.get(&user_id).cloned().unwrap_or_default()
    }

    /// Users eligible for the incremental poll pass.
    pub fn users_with_email(&self) -> Vec<i64> {
        let map = self.inner.read().expect("provider registry poisoned");
        let mut users: Vec<i64> = map
            .iter()
            .filter(|(_, caps)| caps.email.is_some())
            .map(|(id, _)| *id)
            .collect();
        users.sort_unstable();
        users
    }
}
