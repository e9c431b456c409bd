// Dispatch intent entity
// The engine emits intents; an external notifier delivers them and
// acknowledges the outcome. Delivery is at-least-once, so acknowledgments
// must be idempotent.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AlertId, Channel, DonorId, IntentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Pending,
    Acknowledged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Delivered,
    Failed,
    Skipped,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Delivered => "delivered",
            DispatchOutcome::Failed => "failed",
            DispatchOutcome::Skipped => "skipped",
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchIntent {
    pub id: IntentId,
    pub alert_id: AlertId,
    pub donor_id: DonorId,
    pub channels: BTreeSet<Channel>,
    pub created_at: DateTime<Utc>,
    pub status: DispatchStatus,
    pub outcome: Option<DispatchOutcome>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl DispatchIntent {
    pub fn new(
        alert_id: AlertId,
        donor_id: DonorId,
        channels: BTreeSet<Channel>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: IntentId::generate(),
            alert_id,
            donor_id,
            channels,
            created_at: now,
            status: DispatchStatus::Pending,
            outcome: None,
            acknowledged_at: None,
        }
    }
}

/// Result of an acknowledgment; `duplicate` marks an at-least-once redelivery
/// that changed nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResult {
    pub intent: DispatchIntent,
    pub duplicate: bool,
}
