// In-memory inventory ledger
// Every (blood type, component) key owns one async mutex; a reservation
// checks and moves stock while holding it, so concurrent callers can never
// jointly oversubscribe the available count. Entry and reservation locks
// are never held at the same time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use backend_domain::ports::InventoryLedger;
use backend_domain::{
    BloodType, Component, InventoryEntry, LedgerError, ReservationToken, ShrinkageEvent, UnitLot,
};

#[derive(Debug)]
struct ReservedLot {
    blood_type: BloodType,
    component: Component,
    lots: Vec<UnitLot>,
}

#[derive(Default)]
pub struct InMemoryInventoryLedger {
    entries: RwLock<HashMap<(BloodType, Component), Arc<Mutex<InventoryEntry>>>>,
    reservations: Mutex<HashMap<ReservationToken, ReservedLot>>,
}

impl InMemoryInventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry_handle(
        &self,
        blood_type: BloodType,
        component: Component,
    ) -> Arc<Mutex<InventoryEntry>> {
        let mut entries = self.entries.write().await;
        entries
            .entry((blood_type, component))
            .or_insert_with(|| {
                Arc::new(Mutex::new(InventoryEntry::new(blood_type, component, 0)))
            })
            .clone()
    }

    async fn existing_handle(
        &self,
        blood_type: BloodType,
        component: Component,
    ) -> Option<Arc<Mutex<InventoryEntry>>> {
        self.entries
            .read()
            .await
            .get(&(blood_type, component))
            .cloned()
    }
}

#[async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    async fn receive(
        &self,
        blood_type: BloodType,
        component: Component,
        units: u32,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let handle = self.entry_handle(blood_type, component).await;
        let mut entry = handle.lock().await;
        entry.receive(units, expires_at, Utc::now());
        Ok(())
    }

    async fn set_threshold(
        &self,
        blood_type: BloodType,
        component: Component,
        threshold: u32,
    ) -> anyhow::Result<()> {
        let handle = self.entry_handle(blood_type, component).await;
        handle.lock().await.threshold = threshold;
        Ok(())
    }

    async fn reserve(
        &self,
        blood_type: BloodType,
        component: Component,
        units: u32,
    ) -> Result<ReservationToken, LedgerError> {
        let handle = self
            .existing_handle(blood_type, component)
            .await
            .ok_or(LedgerError::UnknownEntry {
                blood_type,
                component,
            })?;

        let lots = {
            let mut entry = handle.lock().await;
            entry.take_lots(units)?
        };

        let token = ReservationToken::generate();
        self.reservations.lock().await.insert(
            token,
            ReservedLot {
                blood_type,
                component,
                lots,
            },
        );
        Ok(token)
    }

    async fn release(&self, token: ReservationToken) -> Result<(), LedgerError> {
        let reserved = self
            .reservations
            .lock()
            .await
            .remove(&token)
            .ok_or(LedgerError::UnknownReservation)?;

        let handle = self
            .existing_handle(reserved.blood_type, reserved.component)
            .await
            .ok_or(LedgerError::UnknownEntry {
                blood_type: reserved.blood_type,
                component: reserved.component,
            })?;
        handle.lock().await.return_lots(reserved.lots);
        Ok(())
    }

    async fn confirm(&self, token: ReservationToken) -> Result<(), LedgerError> {
        let reserved = self
            .reservations
            .lock()
            .await
            .remove(&token)
            .ok_or(LedgerError::UnknownReservation)?;

        let handle = self
            .existing_handle(reserved.blood_type, reserved.component)
            .await
            .ok_or(LedgerError::UnknownEntry {
                blood_type: reserved.blood_type,
                component: reserved.component,
            })?;
        let units: u32 = reserved.lots.iter().map(|lot| lot.units).sum();
        handle.lock().await.consume(units);
        Ok(())
    }

    async fn entry(
        &self,
        blood_type: BloodType,
        component: Component,
    ) -> anyhow::Result<Option<InventoryEntry>> {
        match self.existing_handle(blood_type, component).await {
            Some(handle) => Ok(Some(handle.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn entries(&self) -> anyhow::Result<Vec<InventoryEntry>> {
        let handles: Vec<Arc<Mutex<InventoryEntry>>> =
            self.entries.read().await.values().cloned().collect();
        let mut snapshot = Vec::with_capacity(handles.len());
        for handle in handles {
            snapshot.push(handle.lock().await.clone());
        }
        Ok(snapshot)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ShrinkageEvent>> {
        let handles: Vec<Arc<Mutex<InventoryEntry>>> =
            self.entries.read().await.values().cloned().collect();
        let mut events = Vec::new();
        for handle in handles {
            let mut entry = handle.lock().await;
            let expired = entry.sweep_expired(now);
            if expired > 0 {
                events.push(ShrinkageEvent {
                    blood_type: entry.blood_type,
                    component: entry.component,
                    units_expired: expired,
                    at: now,
                });
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    async fn stocked_ledger(units: u32) -> InMemoryInventoryLedger {
        let ledger = InMemoryInventoryLedger::new();
        ledger
            .receive(
                BloodType::ONeg,
                Component::RedCells,
                units,
                Utc::now() + Duration::days(14),
            )
            .await
            .expect("receive");
        ledger
    }

    #[tokio::test]
    async fn concurrent_reservations_never_oversubscribe() {
        let ledger = Arc::new(stocked_ledger(5).await);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .reserve(BloodType::ONeg, Component::RedCells, 1)
                    .await
            }));
        }

        let mut successes = 0;
        let mut refusals = 0;
        for handle in handles {
            match handle.await.expect("join") {
                Ok(_) => successes += 1,
                Err(LedgerError::InsufficientStock { .. }) => refusals += 1,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }

        // Exactly the number fitting within available stock succeeds.
        assert_eq!(successes, 5);
        assert_eq!(refusals, 5);

        let entry = ledger
            .entry(BloodType::ONeg, Component::RedCells)
            .await
            .expect("entry")
            .expect("present");
        assert_eq!(entry.available(), 0);
        assert_eq!(entry.reserved, 5);
    }

    #[tokio::test]
    async fn release_returns_stock_and_confirm_consumes_it() {
        let ledger = stocked_ledger(5).await;

        let released = ledger
            .reserve(BloodType::ONeg, Component::RedCells, 2)
            .await
            .expect("reserve");
        ledger.release(released).await.expect("release");

        let confirmed = ledger
            .reserve(BloodType::ONeg, Component::RedCells, 3)
            .await
            .expect("reserve again");
        ledger.confirm(confirmed).await.expect("confirm");

        let entry = ledger
            .entry(BloodType::ONeg, Component::RedCells)
            .await
            .expect("entry")
            .expect("present");
        assert_eq!(entry.available(), 2);
        assert_eq!(entry.reserved, 0);
    }

    #[tokio::test]
    async fn tokens_are_single_use() {
        let ledger = stocked_ledger(5).await;
        let token = ledger
            .reserve(BloodType::ONeg, Component::RedCells, 1)
            .await
            .expect("reserve");
        ledger.confirm(token).await.expect("confirm");
        assert_eq!(
            ledger.confirm(token).await.expect_err("spent"),
            LedgerError::UnknownReservation
        );
        assert_eq!(
            ledger.release(token).await.expect_err("spent"),
            LedgerError::UnknownReservation
        );
    }

    #[tokio::test]
    async fn reserving_an_unknown_key_is_refused() {
        let ledger = InMemoryInventoryLedger::new();
        let err = ledger
            .reserve(BloodType::AbNeg, Component::Plasma, 1)
            .await
            .expect_err("unknown key");
        assert!(matches!(err, LedgerError::UnknownEntry { .. }));
    }

    #[tokio::test]
    async fn expiry_sweep_reports_shrinkage_per_key() {
        let ledger = InMemoryInventoryLedger::new();
        let now = Utc::now();
        ledger
            .receive(BloodType::ONeg, Component::RedCells, 2, now - Duration::days(1))
            .await
            .expect("expired lot");
        ledger
            .receive(BloodType::ONeg, Component::RedCells, 3, now + Duration::days(5))
            .await
            .expect("fresh lot");
        ledger
            .receive(BloodType::APos, Component::Plasma, 4, now + Duration::days(5))
            .await
            .expect("other key");

        let events = ledger.sweep_expired(now).await.expect("sweep");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].blood_type, BloodType::ONeg);
        assert_eq!(events[0].units_expired, 2);

        // A second sweep finds nothing new.
        assert!(ledger.sweep_expired(now).await.expect("sweep").is_empty());
    }
}
