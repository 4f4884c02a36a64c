use std::time::Duration;

use tokio::task::JoinHandle;

use crate::services::InvoiceService;

/// Periodically moves sent and partially paid invoices past their due date to
/// `overdue`. Returns `None` when `interval_secs` is 0.
pub fn spawn_overdue_sweep(interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("Overdue invoice sweep disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sweep().await {
                Ok(0) => tracing::debug!("Overdue sweep found nothing to flag"),
                Ok(n) => tracing::info!(count = n, "Flagged overdue invoices"),
                Err(e) => tracing::warn!(error = %e, "Overdue sweep failed"),
            }
        }
    }))
}

async fn sweep() -> Result<u64, crate::services::ServiceError> {
    InvoiceService::new()?.mark_overdue().await
}
