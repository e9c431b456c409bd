// Inventory entity
// Stock for one (blood type, component) key. Available count is derived
// from the unit lots so it can never go negative; reserved units move out
// of the lots and back only through release.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_objects::{BloodType, Component, StockStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    #[error("unknown reservation token")]
    UnknownReservation,
    #[error("no inventory entry for {blood_type} {component}")]
    UnknownEntry {
        blood_type: BloodType,
        component: Component,
    },
}

/// A batch of units received together, sharing one expiry date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitLot {
    pub units: u32,
    pub expires_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub blood_type: BloodType,
    pub component: Component,
    pub threshold: u32,
    pub reserved: u32,
    /// Available stock, kept sorted by expiry (first expiring first).
    pub lots: Vec<UnitLot>,
}

impl InventoryEntry {
    pub fn new(blood_type: BloodType, component: Component, threshold: u32) -> Self {
        Self {
            blood_type,
            component,
            threshold,
            reserved: 0,
            lots: Vec::new(),
        }
    }

    pub fn available(&self) -> u32 {
        self.lots.iter().map(|lot| lot.units).sum()
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::from_levels(self.available(), self.threshold)
    }

    /// Available units whose expiry falls within the warning window.
    pub fn expiring_soon(&self, now: DateTime<Utc>, within_days: u32) -> u32 {
        let horizon = now + chrono::Duration::days(within_days as i64);
        self.lots
            .iter()
            .filter(|lot| lot.expires_at <= horizon)
            .map(|lot| lot.units)
            .sum()
    }

    pub fn receive(&mut self, units: u32, expires_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.lots.push(UnitLot {
            units,
            expires_at,
            received_at: now,
        });
        self.lots.sort_by_key(|lot| lot.expires_at);
    }

    /// Move units out of the available lots for a reservation, first
    /// expiring first. Fails whole, never partially.
    pub fn take_lots(&mut self, units: u32) -> Result<Vec<UnitLot>, LedgerError> {
        let available = self.available();
        if units > available {
            return Err(LedgerError::InsufficientStock {
                requested: units,
                available,
            });
        }
        let mut taken = Vec::new();
        let mut remaining = units;
        while remaining > 0 {
            let mut lot = self.lots.remove(0);
            if lot.units > remaining {
                let mut split = lot.clone();
                split.units = remaining;
                lot.units -= remaining;
                self.lots.insert(0, lot);
                taken.push(split);
                remaining = 0;
            } else {
                remaining -= lot.units;
                taken.push(lot);
            }
        }
        self.reserved += units;
        Ok(taken)
    }

    /// Return a released reservation's lots to available stock.
    pub fn return_lots(&mut self, lots: Vec<UnitLot>) {
        let units: u32 = lots.iter().map(|lot| lot.units).sum();
        self.reserved = self.reserved.saturating_sub(units);
        self.lots.extend(lots);
        self.lots.sort_by_key(|lot| lot.expires_at);
    }

    /// Consume a confirmed reservation permanently.
    pub fn consume(&mut self, units: u32) {
        self.reserved = self.reserved.saturating_sub(units);
    }

    /// Drop expired lots from available stock, returning how many units
    /// were lost.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> u32 {
        let mut expired = 0;
        self.lots.retain(|lot| {
            if lot.expires_at <= now {
                expired += lot.units;
                false
            } else {
                true
            }
        });
        expired
    }
}

/// Stock lost to expiry, reported so the lifecycle manager can treat it as
/// a lowered-stock signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShrinkageEvent {
    pub blood_type: BloodType,
    pub component: Component,
    pub units_expired: u32,
    pub at: DateTime<Utc>,
}
