//! Content expiry.
//!
//! Reads and writes already ignore expired rows; the sweeper only reclaims
//! their storage.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::{
    error::AppError,
    models::thread::thread_ttl,
    store::{PurgeReport, Store},
};

/// Deadline of a thread created at `created_at`. Computed once per comment,
/// at creation, and never recomputed.
pub fn expires_at(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + thread_ttl()
}

pub async fn sweep_once(store: &dyn Store) -> Result<PurgeReport, AppError> {
    let report = store.purge_expired().await?;
    if report.threads > 0 || report.comments > 0 {
        tracing::info!(
            threads = report.threads,
            comments = report.comments,
            "purged expired content"
        );
    }
    Ok(report)
}

/// Runs [`sweep_once`] every `every`, logging and skipping failed sweeps.
pub fn spawn_sweeper(store: Arc<dyn Store>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = sweep_once(store.as_ref()).await {
                tracing::warn!("Expiry sweep failed: {}", e);
            }
        }
    })
}
