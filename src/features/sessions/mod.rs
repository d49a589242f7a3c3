//! # Sessions Feature
//!
//! In-memory, per-user conversation sessions.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod store;

pub use store::{Session, SessionEvent, SessionGuard, SessionStore};

use log::{debug, info};
use std::time::Duration;

/// How often the idle sweep runs
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Periodically evict sessions idle longer than `ttl`. Runs forever.
pub async fn session_sweep_loop(store: SessionStore, ttl: Duration) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let removed = store.prune_idle(ttl);
        if removed > 0 {
            info!("🧹 Evicted {removed} idle session(s), {} remaining", store.len());
        } else {
            debug!("🧹 Session sweep found nothing idle ({} active)", store.len());
        }
    }
}
