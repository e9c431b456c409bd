use tracing::{info, warn};

use backend_domain::ports::DispatchQueue;
use backend_domain::{AckResult, CallerIdentity, IntentId};

use crate::dtos::{parse_outcome, AcknowledgeRequest};
use crate::{AppError, AppState};

/// Record a delivery acknowledgment from the external notifier. Delivery is
/// at-least-once, so a duplicate acknowledgment changes nothing and is
/// reported back as such.
pub async fn acknowledge_intent(
    state: &AppState,
    caller: &CallerIdentity,
    intent_id: IntentId,
    request: AcknowledgeRequest,
) -> Result<AckResult, AppError> {
    let outcome = parse_outcome(&request.outcome)?;
    let ack = state
        .dispatch
        .acknowledge(intent_id, outcome)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("dispatch intent {}", intent_id)))?;

    if ack.duplicate {
        warn!(
            caller = %caller,
            intent_id = %intent_id,
            "duplicate acknowledgment absorbed"
        );
    } else {
        state.metrics.record_dispatch_ack();
        info!(
            caller = %caller,
            intent_id = %intent_id,
            outcome = %outcome,
            "dispatch intent acknowledged"
        );
    }
    Ok(ack)
}
