use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use backend_application::{AlertLocks, AppState, Metrics};
use backend_domain::ports::InventoryLedger;
use backend_infrastructure::{
    load_donors, load_inventory, AppConfig, InMemoryAlertRepository, InMemoryDispatchQueue,
    InMemoryDonorRegistry, InMemoryInventoryLedger, SystemClock,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();

        let donors = match load_donors(&runtime_config.donors_path).await {
            Ok(donors) => {
                info!(count = donors.len(), "donor registry seeded");
                donors
            }
            Err(err) => {
                warn!("donor seed load failed: {err:#}");
                Vec::new()
            }
        };
        let registry = Arc::new(InMemoryDonorRegistry::with_donors(donors));

        let inventory = Arc::new(InMemoryInventoryLedger::new());
        match load_inventory(&runtime_config.inventory_path).await {
            Ok(seeds) => {
                let now = Utc::now();
                for seed in seeds.iter() {
                    inventory
                        .set_threshold(seed.blood_type, seed.component, seed.threshold)
                        .await?;
                    if seed.units > 0 {
                        inventory
                            .receive(
                                seed.blood_type,
                                seed.component,
                                seed.units,
                                now + chrono::Duration::days(seed.expires_in_days as i64),
                            )
                            .await?;
                    }
                }
                info!(keys = seeds.len(), "inventory ledger seeded");
            }
            Err(err) => warn!("inventory seed load failed: {err:#}"),
        }

        let lock_wait = Duration::from_millis(runtime_config.lock_wait_ms);
        let state = AppState {
            config: runtime_config,
            donors: registry,
            alerts: Arc::new(InMemoryAlertRepository::new()),
            inventory,
            dispatch: Arc::new(InMemoryDispatchQueue::new()),
            clock: Arc::new(SystemClock),
            metrics: Arc::new(Metrics::default()),
            alert_locks: Arc::new(AlertLocks::new(lock_wait)),
        };

        Ok(Self { state })
    }
}
