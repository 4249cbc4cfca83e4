// src/sync/scheduler.rs

//! Background poll loop. Runs a sweep, then sleeps, so a slow sweep never
//! stacks on top of the next one.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::CONFIG;
use crate::sync::engine::SyncEngine;

pub fn spawn_poll_scheduler(engine: Arc<SyncEngine>) -> JoinHandle<()> {
    let interval = Duration::from_secs(CONFIG.poll_interval_secs);
    info!(interval_secs = CONFIG.poll_interval_secs, "starting email poll scheduler");

    tokio::spawn(async move {
        loop {
            engine.poll_connected_users().await;
            tokio::time::sleep(interval).await;
        }
    })
}
