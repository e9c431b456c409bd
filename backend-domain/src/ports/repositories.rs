use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Alert, Donor, InventoryEntry, LedgerError, ShrinkageEvent};
use crate::value_objects::{AlertId, BloodType, Component, DonorId, GeoPoint, ReservationToken};

/// Read side of the donor registry. Returns blood-compatible donors within
/// the radius; final eligibility and scoring are re-derived by the matcher.
#[async_trait]
pub trait DonorRegistry: Send + Sync {
    async fn eligible_donors(
        &self,
        blood_type: BloodType,
        center: GeoPoint,
        radius_km: f64,
    ) -> anyhow::Result<Vec<Donor>>;

    async fn get_donor(&self, id: DonorId) -> anyhow::Result<Option<Donor>>;

    async fn upsert_donor(&self, donor: Donor) -> anyhow::Result<()>;

    /// History-driven reliability adjustment, clamped to 0-100.
    async fn apply_reliability_delta(&self, id: DonorId, delta: i16) -> anyhow::Result<()>;
}

/// Alert persistence. Alerts are archived, never deleted; `list_all` keeps
/// resolved history available for reliability scoring.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn insert(&self, alert: Alert) -> anyhow::Result<()>;
    async fn get(&self, id: AlertId) -> anyhow::Result<Option<Alert>>;
    async fn update(&self, alert: Alert) -> anyhow::Result<()>;
    async fn list_active(&self) -> anyhow::Result<Vec<Alert>>;
    async fn list_all(&self) -> anyhow::Result<Vec<Alert>>;
}

/// Stock ledger serialized per (blood type, component) key: two concurrent
/// reservations never both succeed when their combined units exceed the
/// available count.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    async fn receive(
        &self,
        blood_type: BloodType,
        component: Component,
        units: u32,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    async fn set_threshold(
        &self,
        blood_type: BloodType,
        component: Component,
        threshold: u32,
    ) -> anyhow::Result<()>;

    /// Atomically move units from available to reserved.
    async fn reserve(
        &self,
        blood_type: BloodType,
        component: Component,
        units: u32,
    ) -> Result<ReservationToken, LedgerError>;

    /// Return a reservation's units to available stock.
    async fn release(&self, token: ReservationToken) -> Result<(), LedgerError>;

    /// Consume a reservation permanently.
    async fn confirm(&self, token: ReservationToken) -> Result<(), LedgerError>;

    async fn entry(
        &self,
        blood_type: BloodType,
        component: Component,
    ) -> anyhow::Result<Option<InventoryEntry>>;

    async fn entries(&self) -> anyhow::Result<Vec<InventoryEntry>>;

    /// Drop expired units from available stock and report the shrinkage.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<ShrinkageEvent>>;
}
