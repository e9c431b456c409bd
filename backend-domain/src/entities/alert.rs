// Alert entity
// Owns the shortage lifecycle state machine and the per-donor match
// collection; fulfillment arithmetic lives here.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entities::match_record::{Match, MatchEvent, MatchStatus};
use crate::services::matcher::RankedCandidate;
use crate::value_objects::{AlertId, BloodType, DonorId, GeoPoint, Urgency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    PartiallyFulfilled,
    Resolved,
    Expired,
    Cancelled,
}

impl AlertStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AlertStatus::Open | AlertStatus::PartiallyFulfilled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::PartiallyFulfilled => "partially_fulfilled",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Expired => "expired",
            AlertStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("alert in state {status} cannot {action}")]
pub struct AlertTransitionError {
    pub status: AlertStatus,
    pub action: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub blood_type: BloodType,
    pub units_needed: u32,
    pub urgency: Urgency,
    pub origin: GeoPoint,
    /// Current search radius; the re-matching policy may widen it.
    pub radius_km: f64,
    pub created_at: DateTime<Utc>,
    pub status: AlertStatus,
    pub units_confirmed: u32,
    /// Set when matching could not produce candidates at creation time.
    pub needs_manual_review: bool,
    /// One match per donor; re-matching upserts into this map.
    pub matches: BTreeMap<DonorId, Match>,
    pub last_matched_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn new(
        id: AlertId,
        blood_type: BloodType,
        units_needed: u32,
        urgency: Urgency,
        origin: GeoPoint,
        radius_km: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            blood_type,
            units_needed,
            urgency,
            origin,
            radius_km,
            created_at: now,
            status: AlertStatus::Open,
            units_confirmed: 0,
            needs_manual_review: false,
            matches: BTreeMap::new(),
            last_matched_at: now,
            resolved_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn sla_deadline(&self) -> DateTime<Utc> {
        self.created_at + self.urgency.sla()
    }

    pub fn is_past_sla(&self, now: DateTime<Utc>) -> bool {
        now > self.sla_deadline()
    }

    /// Count confirmed units from one donation and advance the lifecycle:
    /// resolved the moment the threshold is crossed, partially fulfilled
    /// for anything above zero short of it.
    pub fn record_contribution(
        &mut self,
        units: u32,
        now: DateTime<Utc>,
    ) -> Result<AlertStatus, AlertTransitionError> {
        if !self.is_active() {
            return Err(AlertTransitionError {
                status: self.status,
                action: "accept a contribution",
            });
        }
        self.units_confirmed += units;
        if self.units_confirmed >= self.units_needed {
            self.status = AlertStatus::Resolved;
            self.resolved_at = Some(now);
        } else if self.units_confirmed > 0 {
            self.status = AlertStatus::PartiallyFulfilled;
        }
        Ok(self.status)
    }

    /// SLA expiry: the alert and every outstanding match transition in one
    /// step; callers persist the whole aggregate so no partial state is
    /// observable. Returns each timed-out donor with its prior sub-state.
    pub fn expire(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(DonorId, MatchStatus)>, AlertTransitionError> {
        self.close("expire", AlertStatus::Expired, now)
    }

    /// Manual cancellation, same atomic propagation as expiry.
    pub fn cancel(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(DonorId, MatchStatus)>, AlertTransitionError> {
        self.close("cancel", AlertStatus::Cancelled, now)
    }

    fn close(
        &mut self,
        action: &'static str,
        target: AlertStatus,
        now: DateTime<Utc>,
    ) -> Result<Vec<(DonorId, MatchStatus)>, AlertTransitionError> {
        if !self.is_active() {
            return Err(AlertTransitionError {
                status: self.status,
                action,
            });
        }
        self.status = target;
        let mut timed_out = Vec::new();
        for record in self.matches.values_mut() {
            if record.status.is_terminal() {
                continue;
            }
            let prior = record.status;
            record
                .apply(MatchEvent::TimeOut, now)
                .expect("timeout is legal from any active sub-state");
            timed_out.push((record.donor_id, prior));
        }
        Ok(timed_out)
    }

    /// Explicit reopen event, the only path out of a resolved or expired
    /// alert.
    pub fn reopen(&mut self) -> Result<AlertStatus, AlertTransitionError> {
        if !matches!(self.status, AlertStatus::Resolved | AlertStatus::Expired) {
            return Err(AlertTransitionError {
                status: self.status,
                action: "reopen",
            });
        }
        self.status = if self.units_confirmed > 0 && self.units_confirmed < self.units_needed {
            AlertStatus::PartiallyFulfilled
        } else {
            AlertStatus::Open
        };
        self.resolved_at = None;
        Ok(self.status)
    }

    /// Merge a fresh ranking into the match map. New donors are inserted as
    /// `available`; donors already matched keep their response state and only
    /// have score and distance refreshed. Returns the newly added donor ids.
    pub fn upsert_candidates(
        &mut self,
        candidates: Vec<RankedCandidate>,
        now: DateTime<Utc>,
    ) -> Vec<DonorId> {
        let mut added = Vec::new();
        for candidate in candidates {
            match self.matches.entry(candidate.donor_id) {
                Entry::Occupied(mut existing) => existing
                    .get_mut()
                    .refresh_ranking(candidate.ccs, candidate.distance_km),
                Entry::Vacant(slot) => {
                    slot.insert(Match::new(
                        self.id,
                        candidate.donor_id,
                        candidate.ccs,
                        candidate.distance_km,
                        now,
                    ));
                    added.push(candidate.donor_id);
                }
            }
        }
        self.last_matched_at = now;
        added
    }

    /// Matches ranked by stored score, ties broken by ascending distance
    /// then donor id for determinism.
    pub fn ranked_matches(&self) -> Vec<&Match> {
        let mut ranked: Vec<&Match> = self.matches.values().collect();
        ranked.sort_by(|a, b| {
            b.ccs
                .total
                .cmp(&a.ccs.total)
                .then_with(|| {
                    a.distance_km
                        .partial_cmp(&b.distance_km)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.donor_id.cmp(&b.donor_id))
        });
        ranked
    }

    /// Candidates contacted or later that are still working toward a
    /// donation; drives the re-matching policy.
    pub fn active_candidate_count(&self) -> usize {
        self.matches
            .values()
            .filter(|m| m.status.is_engaged() && !m.status.is_terminal())
            .count()
    }

    pub fn match_mut(&mut self, donor_id: DonorId) -> Option<&mut Match> {
        self.matches.get_mut(&donor_id)
    }
}
