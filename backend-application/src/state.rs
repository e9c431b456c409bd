use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use backend_domain::ports::{AlertRepository, Clock, DispatchQueue, DonorRegistry, InventoryLedger};
use backend_domain::{AlertId, RuntimeConfig};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{AppError, Metrics};

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub donors: Arc<dyn DonorRegistry>,
    pub alerts: Arc<dyn AlertRepository>,
    pub inventory: Arc<dyn InventoryLedger>,
    pub dispatch: Arc<dyn DispatchQueue>,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<Metrics>,
    pub alert_locks: Arc<AlertLocks>,
}

/// Single-writer-at-a-time discipline per alert: every state transition on
/// an alert and its match collection happens under this guard, so
/// concurrent donor responses cannot race past the fulfillment threshold.
/// Operations on different alerts proceed in parallel.
pub struct AlertLocks {
    wait: Duration,
    inner: Mutex<HashMap<AlertId, Arc<Mutex<()>>>>,
}

impl AlertLocks {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, id: AlertId) -> Result<OwnedMutexGuard<()>, AppError> {
        let handle = {
            let mut map = self.inner.lock().await;
            map.entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        tokio::time::timeout(self.wait, handle.lock_owned())
            .await
            .map_err(|_| AppError::ConcurrencyConflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn contended_alert_times_out_with_conflict() {
        let locks = AlertLocks::new(Duration::from_millis(50));
        let id = AlertId::generate();
        let guard = locks.acquire(id).await.expect("first acquire");
        let err = locks.acquire(id).await.expect_err("contended");
        assert!(matches!(err, AppError::ConcurrencyConflict));
        drop(guard);
        locks.acquire(id).await.expect("free again");
    }

    #[tokio::test]
    async fn different_alerts_do_not_contend() {
        let locks = AlertLocks::new(Duration::from_millis(50));
        let _a = locks.acquire(AlertId::generate()).await.expect("a");
        let _b = locks.acquire(AlertId::generate()).await.expect("b");
    }
}
