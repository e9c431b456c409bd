// Request payloads and read-side views

use std::str::FromStr;

use backend_domain::scorer::CcsBreakdown;
use backend_domain::{
    Alert, AlertId, AlertStatus, BloodType, Component, DispatchOutcome, DonorId, GeoPoint,
    InventoryEntry, Match, MatchEvent, MatchStatus, ReservationToken, Urgency,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlertRequest {
    pub blood_type: String,
    pub units_needed: u32,
    pub urgency: String,
    pub origin: GeoPoint,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchResponseRequest {
    /// One of contact, yes, no, en_route, arrived, confirmed, withdraw.
    pub response: String,
    /// Units the donor pledges or delivers; defaults to the match's current
    /// value (1 unless previously pledged).
    pub units: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveUnitsRequest {
    pub blood_type: String,
    pub component: String,
    pub units: u32,
    pub expires_in_days: u32,
    pub threshold: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReserveUnitsRequest {
    pub blood_type: String,
    pub component: String,
    pub units: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationRequest {
    pub token: ReservationToken,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcknowledgeRequest {
    /// One of delivered, failed, skipped.
    pub outcome: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFilter {
    pub status: Option<String>,
    pub blood_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub donor_id: DonorId,
    pub ccs: u8,
    pub breakdown: CcsBreakdown,
    pub distance_km: f64,
    pub units: u32,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub last_transition_at: DateTime<Utc>,
}

impl MatchView {
    pub fn from_match(record: &Match) -> Self {
        Self {
            donor_id: record.donor_id,
            ccs: record.ccs.total,
            breakdown: record.ccs.breakdown,
            distance_km: record.distance_km,
            units: record.units,
            status: record.status,
            created_at: record.created_at,
            last_transition_at: record.last_transition_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertView {
    pub id: AlertId,
    pub blood_type: BloodType,
    pub units_needed: u32,
    pub urgency: Urgency,
    pub status: AlertStatus,
    pub units_confirmed: u32,
    pub needs_manual_review: bool,
    pub radius_km: f64,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Size of the ranked match list; nothing beyond it is counted.
    pub matched_donors: usize,
    /// Donors who said yes and are still moving toward a donation.
    pub responding_donors: usize,
    pub matches: Vec<MatchView>,
}

impl AlertView {
    pub fn from_alert(alert: &Alert) -> Self {
        let matches: Vec<MatchView> = alert
            .ranked_matches()
            .into_iter()
            .map(MatchView::from_match)
            .collect();
        let responding = alert
            .matches
            .values()
            .filter(|m| {
                matches!(
                    m.status,
                    MatchStatus::RespondedYes
                        | MatchStatus::EnRoute
                        | MatchStatus::Arrived
                        | MatchStatus::Confirmed
                )
            })
            .count();
        Self {
            id: alert.id,
            blood_type: alert.blood_type,
            units_needed: alert.units_needed,
            urgency: alert.urgency,
            status: alert.status,
            units_confirmed: alert.units_confirmed,
            needs_manual_review: alert.needs_manual_review,
            radius_km: alert.radius_km,
            created_at: alert.created_at,
            resolved_at: alert.resolved_at,
            matched_donors: matches.len(),
            responding_donors: responding,
            matches,
        }
    }
}

/// Outcome of a donor-response call. `applied` is false when the event was
/// a duplicate or late delivery absorbed as a no-op.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResponseOutcome {
    pub applied: bool,
    pub alert_status: AlertStatus,
    pub record: MatchView,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryStatusView {
    pub blood_type: BloodType,
    pub component: Component,
    pub available: u32,
    pub reserved: u32,
    pub threshold: u32,
    pub status: String,
    pub expiring_soon: u32,
}

impl InventoryStatusView {
    pub fn from_entry(entry: &InventoryEntry, now: DateTime<Utc>, expiring_days: u32) -> Self {
        Self {
            blood_type: entry.blood_type,
            component: entry.component,
            available: entry.available(),
            reserved: entry.reserved,
            threshold: entry.threshold,
            status: entry.stock_status().to_string(),
            expiring_soon: entry.expiring_soon(now, expiring_days),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    pub token: ReservationToken,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub alerts_expired: usize,
    pub alerts_rematched: usize,
}

pub(crate) fn parse_blood_type(value: &str) -> Result<BloodType, AppError> {
    BloodType::from_str(value).map_err(AppError::Validation)
}

pub(crate) fn parse_component(value: &str) -> Result<Component, AppError> {
    Component::from_str(value).map_err(AppError::Validation)
}

pub(crate) fn parse_urgency(value: &str) -> Result<Urgency, AppError> {
    Urgency::from_str(value).map_err(AppError::Validation)
}

pub(crate) fn parse_response(value: &str) -> Result<MatchEvent, AppError> {
    match value.trim().to_lowercase().as_str() {
        "contact" => Ok(MatchEvent::Contact),
        "yes" | "responded_yes" => Ok(MatchEvent::RespondYes),
        "no" | "responded_no" => Ok(MatchEvent::RespondNo),
        "en_route" => Ok(MatchEvent::Depart),
        "arrived" => Ok(MatchEvent::Arrive),
        "confirmed" => Ok(MatchEvent::Confirm),
        "withdraw" => Ok(MatchEvent::Withdraw),
        other => Err(AppError::Validation(format!(
            "unknown donor response '{}'",
            other
        ))),
    }
}

pub(crate) fn parse_outcome(value: &str) -> Result<DispatchOutcome, AppError> {
    match value.trim().to_lowercase().as_str() {
        "delivered" => Ok(DispatchOutcome::Delivered),
        "failed" => Ok(DispatchOutcome::Failed),
        "skipped" => Ok(DispatchOutcome::Skipped),
        other => Err(AppError::Validation(format!(
            "unknown dispatch outcome '{}'",
            other
        ))),
    }
}
