// Match entity
// One donor paired to one alert, with its own response sub-state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::scorer::CcsScore;
use crate::value_objects::{AlertId, DonorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Available,
    Contacted,
    RespondedYes,
    EnRoute,
    Arrived,
    Confirmed,
    RespondedNo,
    TimedOut,
}

impl MatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MatchStatus::Confirmed | MatchStatus::RespondedNo | MatchStatus::TimedOut
        )
    }

    /// Contacted or later and still moving toward a donation. Used by the
    /// re-matching policy to count candidates actively in play.
    pub fn is_engaged(&self) -> bool {
        matches!(
            self,
            MatchStatus::Contacted
                | MatchStatus::RespondedYes
                | MatchStatus::EnRoute
                | MatchStatus::Arrived
                | MatchStatus::Confirmed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Available => "available",
            MatchStatus::Contacted => "contacted",
            MatchStatus::RespondedYes => "responded_yes",
            MatchStatus::EnRoute => "en_route",
            MatchStatus::Arrived => "arrived",
            MatchStatus::Confirmed => "confirmed",
            MatchStatus::RespondedNo => "responded_no",
            MatchStatus::TimedOut => "timed_out",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally driven transition on a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEvent {
    Contact,
    RespondYes,
    RespondNo,
    Depart,
    Arrive,
    Confirm,
    Withdraw,
    TimeOut,
}

impl MatchEvent {
    pub fn target(&self) -> MatchStatus {
        match self {
            MatchEvent::Contact => MatchStatus::Contacted,
            MatchEvent::RespondYes => MatchStatus::RespondedYes,
            MatchEvent::RespondNo | MatchEvent::Withdraw => MatchStatus::RespondedNo,
            MatchEvent::Depart => MatchStatus::EnRoute,
            MatchEvent::Arrive => MatchStatus::Arrived,
            MatchEvent::Confirm => MatchStatus::Confirmed,
            MatchEvent::TimeOut => MatchStatus::TimedOut,
        }
    }

    fn allowed_from(&self, from: MatchStatus) -> bool {
        match self {
            MatchEvent::Contact => from == MatchStatus::Available,
            MatchEvent::RespondYes | MatchEvent::RespondNo => from == MatchStatus::Contacted,
            MatchEvent::Depart => from == MatchStatus::RespondedYes,
            MatchEvent::Arrive => from == MatchStatus::EnRoute,
            MatchEvent::Confirm => from == MatchStatus::Arrived,
            // The one legal backward move: a donor already on the way can
            // still pull out.
            MatchEvent::Withdraw => from == MatchStatus::EnRoute,
            MatchEvent::TimeOut => !from.is_terminal(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchEvent::Contact => "contact",
            MatchEvent::RespondYes => "respond_yes",
            MatchEvent::RespondNo => "respond_no",
            MatchEvent::Depart => "depart",
            MatchEvent::Arrive => "arrive",
            MatchEvent::Confirm => "confirm",
            MatchEvent::Withdraw => "withdraw",
            MatchEvent::TimeOut => "time_out",
        }
    }
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The match already reached the event's target state. Duplicate webhook
    /// deliveries land here and must be treated as idempotent no-ops.
    #[error("match already in state {current}")]
    AlreadyApplied { current: MatchStatus },
    /// The match is terminal; late events land here and are no-ops.
    #[error("match is terminal in state {current}")]
    AlreadyTerminal { current: MatchStatus },
    /// Out-of-order transition that skips workflow stages.
    #[error("cannot apply {event} from state {from}")]
    IllegalJump { from: MatchStatus, event: MatchEvent },
}

impl TransitionError {
    /// Duplicate or late events are absorbed, not failed.
    pub fn is_noop(&self) -> bool {
        matches!(
            self,
            TransitionError::AlreadyApplied { .. } | TransitionError::AlreadyTerminal { .. }
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub alert_id: AlertId,
    pub donor_id: DonorId,
    /// Scored once by the CCS scorer when the match is created and stored
    /// here; views never recompute it.
    pub ccs: CcsScore,
    pub distance_km: f64,
    /// Units this donor contributes when the donation is confirmed.
    pub units: u32,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub last_transition_at: DateTime<Utc>,
}

impl Match {
    pub fn new(
        alert_id: AlertId,
        donor_id: DonorId,
        ccs: CcsScore,
        distance_km: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            alert_id,
            donor_id,
            ccs,
            distance_km,
            units: 1,
            status: MatchStatus::Available,
            created_at: now,
            last_transition_at: now,
        }
    }

    /// Apply one transition. Every successful transition is timestamped.
    pub fn apply(
        &mut self,
        event: MatchEvent,
        now: DateTime<Utc>,
    ) -> Result<MatchStatus, TransitionError> {
        let target = event.target();
        if self.status == target {
            return Err(TransitionError::AlreadyApplied {
                current: self.status,
            });
        }
        if self.status.is_terminal() {
            return Err(TransitionError::AlreadyTerminal {
                current: self.status,
            });
        }
        if !event.allowed_from(self.status) {
            return Err(TransitionError::IllegalJump {
                from: self.status,
                event,
            });
        }
        self.status = target;
        self.last_transition_at = now;
        Ok(target)
    }

    /// A fresh ranking run updates score and distance on an existing match
    /// without touching its response state.
    pub fn refresh_ranking(&mut self, ccs: CcsScore, distance_km: f64) {
        self.ccs = ccs;
        self.distance_km = distance_km;
    }
}
