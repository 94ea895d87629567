//! Background overdue sweeper

use std::time::Duration;

use tokio::task::JoinHandle;

use super::loans::LoansService;

/// Run [`LoansService::sweep_overdue`] every `interval_secs` seconds.
/// Returns `None` when the interval is 0 (sweeper disabled).
pub fn spawn_overdue_sweeper(loans: LoansService, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        tracing::info!("Overdue sweeper disabled");
        return None;
    }

    tracing::info!("Overdue sweeper running every {}s", interval_secs);
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            match loans.sweep_overdue().await {
                Ok(0) => tracing::debug!("Overdue sweep: nothing to do"),
                Ok(n) => tracing::info!("Overdue sweep marked {} loans", n),
                Err(e) => tracing::warn!("Overdue sweep failed: {}", e),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::{clock::SystemClock, repository::MemoryStore};

    #[tokio::test]
    async fn test_zero_interval_disables_sweeper() {
        let loans = LoansService::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock));
        assert!(spawn_overdue_sweeper(loans, 0).is_none());
    }

    #[tokio::test]
    async fn test_sweeper_runs_on_empty_store() {
        let loans = LoansService::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock));
        let handle = spawn_overdue_sweeper(loans, 3600).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }
}
