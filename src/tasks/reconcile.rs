//! Reconcile Task
//!
//! Background task that periodically sweeps the persistent user data index.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::users::UserDataService;

/// Spawns a background task that reconciles the user data cache every
/// `interval_secs` seconds.
///
/// The first sweep runs one interval after spawning; startup already
/// reconciles once. Abort the returned handle during graceful shutdown.
pub fn spawn_reconcile_task(user_data: Arc<UserDataService>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting reconcile task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match user_data.reconcile() {
                Ok(report) if report.removed > 0 => {
                    info!(
                        kept = report.kept,
                        removed = report.removed,
                        "Reconcile: removed expired entries"
                    );
                }
                Ok(_) => debug!("Reconcile: no expired entries found"),
                Err(e) => warn!(error = %e, "Reconcile failed"),
            }
        }
    })
}
