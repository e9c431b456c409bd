use std::collections::BTreeSet;

use tracing::{info, warn};

use backend_domain::ports::{AlertRepository, Clock, InventoryLedger};
use backend_domain::{Alert, BloodType, CallerIdentity, MatchStatus, ShrinkageEvent};
use chrono::{DateTime, Utc};

use crate::dtos::SweepReport;
use crate::{AppError, AppState};

use super::alert_commands::{contact_top_candidates, rank_pool};
use super::match_commands::adjust_reliability;

/// Timer-driven SLA evaluation. Each alert is handled under its own guard;
/// a contended alert is simply skipped until the next tick.
pub async fn run_sla_sweep(
    state: &AppState,
    caller: &CallerIdentity,
) -> Result<SweepReport, AppError> {
    let now = state.clock.now();
    let mut report = SweepReport::default();

    for stale in state.alerts.list_active().await? {
        let alert_id = stale.id;
        let _guard = match state.alert_locks.acquire(alert_id).await {
            Ok(guard) => guard,
            Err(AppError::ConcurrencyConflict) => continue,
            Err(err) => return Err(err),
        };
        let Some(mut alert) = state.alerts.get(alert_id).await? else {
            continue;
        };
        if !alert.is_active() {
            continue;
        }

        if alert.is_past_sla(now) {
            let timed_out = alert
                .expire(now)
                .map_err(|err| AppError::InvalidTransition(err.to_string()))?;
            for (donor_id, prior) in &timed_out {
                if matches!(
                    prior,
                    MatchStatus::RespondedYes | MatchStatus::EnRoute | MatchStatus::Arrived
                ) {
                    adjust_reliability(state, *donor_id, -3).await;
                }
            }
            state.alerts.update(alert.clone()).await?;
            state.metrics.record_alert_expired();
            info!(
                caller = %caller,
                alert_id = %alert_id,
                urgency = %alert.urgency,
                timed_out = timed_out.len(),
                "alert expired past SLA"
            );
            report.alerts_expired += 1;
        } else if should_rematch(&alert, now, state) {
            let widened =
                (alert.radius_km * state.config.radius_growth_factor).min(state.config.max_search_radius_km);
            alert.radius_km = widened;
            if rematch_alert(state, &mut alert, now).await {
                state.alerts.update(alert.clone()).await?;
                report.alerts_rematched += 1;
                info!(
                    caller = %caller,
                    alert_id = %alert_id,
                    radius_km = alert.radius_km,
                    "fulfillment stalled, re-matched with widened radius"
                );
            }
        }
    }
    Ok(report)
}

/// Expiry sweep over the inventory ledger. Shrinkage lowers stock, so open
/// alerts on the affected blood types get a fresh matching pass.
pub async fn run_expiry_sweep(
    state: &AppState,
    caller: &CallerIdentity,
) -> Result<Vec<ShrinkageEvent>, AppError> {
    let now = state.clock.now();
    let events = state.inventory.sweep_expired(now).await?;
    if events.is_empty() {
        return Ok(events);
    }

    let mut affected: BTreeSet<BloodType> = BTreeSet::new();
    for event in &events {
        state.metrics.record_units_expired(event.units_expired);
        warn!(
            caller = %caller,
            blood_type = %event.blood_type,
            component = %event.component,
            units = event.units_expired,
            "stock lost to expiry"
        );
        affected.insert(event.blood_type);
    }

    for stale in state.alerts.list_active().await? {
        if !affected.contains(&stale.blood_type) {
            continue;
        }
        let alert_id = stale.id;
        let Ok(_guard) = state.alert_locks.acquire(alert_id).await else {
            continue;
        };
        let Some(mut alert) = state.alerts.get(alert_id).await? else {
            continue;
        };
        if !alert.is_active() {
            continue;
        }
        if rematch_alert(state, &mut alert, now).await {
            state.alerts.update(alert.clone()).await?;
            info!(alert_id = %alert_id, "re-matched after inventory shrinkage");
        }
    }
    Ok(events)
}

fn should_rematch(alert: &Alert, now: DateTime<Utc>, state: &AppState) -> bool {
    alert.active_candidate_count() < state.config.rematch_min_active
        && (now - alert.last_matched_at).num_seconds()
            >= state.config.rematch_grace_seconds as i64
}

/// Merge a fresh ranking and contact newly surfaced candidates. Existing
/// match states are never disturbed. Returns false when matching failed.
async fn rematch_alert(state: &AppState, alert: &mut Alert, now: DateTime<Utc>) -> bool {
    match rank_pool(state, alert, now).await {
        Ok(ranked) => {
            let added = alert.upsert_candidates(ranked, now);
            state.metrics.record_matches_created(added.len());
            contact_top_candidates(state, alert, now).await;
            true
        }
        Err(err) => {
            warn!(alert_id = %alert.id, "re-matching failed: {err:#}");
            false
        }
    }
}
