// In-memory dispatch queue
// Intents are produced by the lifecycle manager and drained by the
// notifier. Acknowledgments are idempotent: the first one wins, redeliveries
// report back as duplicates without touching the recorded outcome.

use std::collections::BTreeSet;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use backend_domain::ports::DispatchQueue;
use backend_domain::{
    AckResult, AlertId, Channel, DispatchIntent, DispatchOutcome, DispatchStatus, DonorId, IntentId,
};

#[derive(Default)]
pub struct InMemoryDispatchQueue {
    intents: RwLock<HashMap<IntentId, DispatchIntent>>,
}

impl InMemoryDispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DispatchQueue for InMemoryDispatchQueue {
    async fn enqueue(
        &self,
        alert_id: AlertId,
        donor_id: DonorId,
        channels: BTreeSet<Channel>,
    ) -> anyhow::Result<DispatchIntent> {
        let intent = DispatchIntent::new(alert_id, donor_id, channels, Utc::now());
        self.intents.write().await.insert(intent.id, intent.clone());
        Ok(intent)
    }

    async fn acknowledge(
        &self,
        intent_id: IntentId,
        outcome: DispatchOutcome,
    ) -> anyhow::Result<Option<AckResult>> {
        let mut intents = self.intents.write().await;
        let Some(intent) = intents.get_mut(&intent_id) else {
            return Ok(None);
        };
        if intent.status == DispatchStatus::Acknowledged {
            return Ok(Some(AckResult {
                intent: intent.clone(),
                duplicate: true,
            }));
        }
        intent.status = DispatchStatus::Acknowledged;
        intent.outcome = Some(outcome);
        intent.acknowledged_at = Some(Utc::now());
        Ok(Some(AckResult {
            intent: intent.clone(),
            duplicate: false,
        }))
    }

    async fn pending(&self) -> anyhow::Result<Vec<DispatchIntent>> {
        Ok(self
            .intents
            .read()
            .await
            .values()
            .filter(|intent| intent.status == DispatchStatus::Pending)
            .cloned()
            .collect())
    }

    async fn get(&self, intent_id: IntentId) -> anyhow::Result<Option<DispatchIntent>> {
        Ok(self.intents.read().await.get(&intent_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acknowledgments_are_idempotent() {
        let queue = InMemoryDispatchQueue::new();
        let intent = queue
            .enqueue(AlertId::generate(), DonorId::generate(), BTreeSet::new())
            .await
            .expect("enqueue");

        let first = queue
            .acknowledge(intent.id, DispatchOutcome::Delivered)
            .await
            .expect("ack")
            .expect("known intent");
        assert!(!first.duplicate);
        assert_eq!(first.intent.outcome, Some(DispatchOutcome::Delivered));

        // Redelivery reports duplicate and keeps the first outcome.
        let second = queue
            .acknowledge(intent.id, DispatchOutcome::Failed)
            .await
            .expect("ack")
            .expect("known intent");
        assert!(second.duplicate);
        assert_eq!(second.intent.outcome, Some(DispatchOutcome::Delivered));
    }

    #[tokio::test]
    async fn acknowledged_intents_leave_the_pending_set() {
        let queue = InMemoryDispatchQueue::new();
        let a = queue
            .enqueue(AlertId::generate(), DonorId::generate(), BTreeSet::new())
            .await
            .expect("enqueue");
        let _b = queue
            .enqueue(AlertId::generate(), DonorId::generate(), BTreeSet::new())
            .await
            .expect("enqueue");

        queue
            .acknowledge(a.id, DispatchOutcome::Delivered)
            .await
            .expect("ack");
        let pending = queue.pending().await.expect("pending");
        assert_eq!(pending.len(), 1);
        assert_ne!(pending[0].id, a.id);
    }

    #[tokio::test]
    async fn unknown_intent_acknowledges_to_none() {
        let queue = InMemoryDispatchQueue::new();
        assert!(queue
            .acknowledge(IntentId::generate(), DispatchOutcome::Delivered)
            .await
            .expect("ack")
            .is_none());
    }
}
