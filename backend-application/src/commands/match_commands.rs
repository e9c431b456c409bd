use tracing::{info, warn};

use backend_domain::ports::{AlertRepository, Clock, DispatchQueue, DonorRegistry};
use backend_domain::{AlertId, AlertStatus, CallerIdentity, DonorId, MatchEvent};

use crate::dtos::{parse_response, MatchResponseOutcome, MatchResponseRequest, MatchView};
use crate::{AppError, AppState};

/// Apply a donor response to its match under the alert guard. Duplicate and
/// late deliveries (webhook retries, responses after resolution) are
/// absorbed as idempotent no-ops with `applied = false`; out-of-order jumps
/// are surfaced as `InvalidTransition`.
pub async fn respond_to_match(
    state: &AppState,
    caller: &CallerIdentity,
    alert_id: AlertId,
    donor_id: DonorId,
    request: MatchResponseRequest,
) -> Result<MatchResponseOutcome, AppError> {
    let event = parse_response(&request.response)?;
    if let Some(0) = request.units {
        return Err(AppError::Validation("units must be positive".to_string()));
    }

    let _guard = state.alert_locks.acquire(alert_id).await?;
    let mut alert = super::alert_commands::require_alert(state, alert_id).await?;
    let now = state.clock.now();

    if !alert.is_active() {
        let record = alert
            .matches
            .get(&donor_id)
            .ok_or_else(|| AppError::NotFound(format!("match {} on alert {}", donor_id, alert_id)))?;
        warn!(
            caller = %caller,
            alert_id = %alert_id,
            donor_id = %donor_id,
            alert_status = %alert.status,
            "late donor response on closed alert absorbed as no-op"
        );
        state.metrics.record_invalid_transition();
        return Ok(MatchResponseOutcome {
            applied: false,
            alert_status: alert.status,
            record: MatchView::from_match(record),
        });
    }

    let applied = {
        let record = alert.match_mut(donor_id).ok_or_else(|| {
            AppError::NotFound(format!("match {} on alert {}", donor_id, alert_id))
        })?;
        if matches!(event, MatchEvent::RespondYes | MatchEvent::Confirm) {
            if let Some(units) = request.units {
                record.units = units;
            }
        }
        record.apply(event, now).map(|status| (status, record.units))
    };

    match applied {
        Ok((new_status, units)) => {
            if new_status == backend_domain::MatchStatus::Confirmed {
                let alert_status = alert
                    .record_contribution(units, now)
                    .map_err(|err| AppError::InvalidTransition(err.to_string()))?;
                if alert_status == AlertStatus::Resolved {
                    state.metrics.record_alert_resolved();
                    info!(alert_id = %alert_id, units_confirmed = alert.units_confirmed, "alert resolved");
                }
                adjust_reliability(state, donor_id, 2).await;
            }
            if event == MatchEvent::Withdraw {
                adjust_reliability(state, donor_id, -4).await;
            }
            if event == MatchEvent::Contact {
                enqueue_contact_intent(state, alert_id, donor_id).await;
            }
            state.alerts.update(alert.clone()).await?;
            info!(
                caller = %caller,
                alert_id = %alert_id,
                donor_id = %donor_id,
                event = %event,
                status = %new_status,
                "match transition applied"
            );
            let record = &alert.matches[&donor_id];
            Ok(MatchResponseOutcome {
                applied: true,
                alert_status: alert.status,
                record: MatchView::from_match(record),
            })
        }
        Err(err) if err.is_noop() => {
            warn!(
                caller = %caller,
                alert_id = %alert_id,
                donor_id = %donor_id,
                event = %event,
                "{err}; absorbed as idempotent no-op"
            );
            state.metrics.record_invalid_transition();
            let record = &alert.matches[&donor_id];
            Ok(MatchResponseOutcome {
                applied: false,
                alert_status: alert.status,
                record: MatchView::from_match(record),
            })
        }
        Err(err) => {
            state.metrics.record_invalid_transition();
            Err(AppError::InvalidTransition(err.to_string()))
        }
    }
}

/// Manual contact through the response endpoint still flows through the
/// dispatch queue.
async fn enqueue_contact_intent(state: &AppState, alert_id: AlertId, donor_id: DonorId) {
    let channels = match state.donors.get_donor(donor_id).await {
        Ok(Some(donor)) => donor.channels,
        _ => Default::default(),
    };
    match state.dispatch.enqueue(alert_id, donor_id, channels).await {
        Ok(_) => state.metrics.record_dispatch_intent(),
        Err(err) => warn!(alert_id = %alert_id, donor_id = %donor_id, "dispatch enqueue failed: {err:#}"),
    }
}

/// History-driven reliability update; registry failures only log.
pub(crate) async fn adjust_reliability(state: &AppState, donor_id: DonorId, delta: i16) {
    if let Err(err) = state.donors.apply_reliability_delta(donor_id, delta).await {
        warn!(donor_id = %donor_id, delta, "reliability update failed: {err:#}");
    }
}
