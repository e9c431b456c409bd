use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{AckResult, DispatchIntent, DispatchOutcome};
use crate::value_objects::{AlertId, Channel, DonorId, IntentId};

/// Outbound notification intents. The engine only emits; an external
/// notifier consumes pending intents and acknowledges each one. Delivery is
/// at-least-once, so duplicate acknowledgments must be absorbed.
#[async_trait]
pub trait DispatchQueue: Send + Sync {
    async fn enqueue(
        &self,
        alert_id: AlertId,
        donor_id: DonorId,
        channels: BTreeSet<Channel>,
    ) -> anyhow::Result<DispatchIntent>;

    async fn acknowledge(
        &self,
        intent_id: IntentId,
        outcome: DispatchOutcome,
    ) -> anyhow::Result<Option<AckResult>>;

    async fn pending(&self) -> anyhow::Result<Vec<DispatchIntent>>;

    async fn get(&self, intent_id: IntentId) -> anyhow::Result<Option<DispatchIntent>>;
}

/// Clock abstraction so SLA arithmetic is testable without waiting.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
