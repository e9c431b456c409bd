use std::collections::BTreeSet;

use tracing::{info, warn};

use backend_domain::ports::{AlertRepository, Clock, DispatchQueue, DonorRegistry};
use backend_domain::{
    matcher, Alert, AlertId, CallerIdentity, DonorId, MatchEvent, MatchStatus, RankedCandidate,
};
use chrono::{DateTime, Utc};

use crate::dtos::{parse_blood_type, parse_urgency, AlertView, CreateAlertRequest};
use crate::{AppError, AppState};

/// Create a shortage alert and run the first matching pass. Matching
/// failures and empty candidate pools never fail creation; the alert is
/// stored open with zero matches and flagged for manual review.
pub async fn create_alert(
    state: &AppState,
    caller: &CallerIdentity,
    request: CreateAlertRequest,
) -> Result<AlertView, AppError> {
    let blood_type = parse_blood_type(&request.blood_type)?;
    let urgency = parse_urgency(&request.urgency)?;
    if request.units_needed == 0 {
        return Err(AppError::Validation(
            "units_needed must be positive".to_string(),
        ));
    }
    let radius_km = request
        .radius_km
        .unwrap_or(state.config.default_search_radius_km);
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(AppError::Validation(
            "radius_km must be a positive number".to_string(),
        ));
    }
    let radius_km = radius_km.min(state.config.max_search_radius_km);

    let now = state.clock.now();
    let mut alert = Alert::new(
        AlertId::generate(),
        blood_type,
        request.units_needed,
        urgency,
        request.origin,
        radius_km,
        now,
    );

    match rank_pool(state, &alert, now).await {
        Ok(ranked) if ranked.is_empty() => {
            alert.needs_manual_review = true;
            warn!(alert_id = %alert.id, blood_type = %blood_type, "no eligible donors in radius, flagged for manual review");
        }
        Ok(ranked) => {
            alert.upsert_candidates(ranked, now);
        }
        Err(err) => {
            alert.needs_manual_review = true;
            warn!(alert_id = %alert.id, "matching failed at creation: {err:#}");
        }
    }

    let contacted = contact_top_candidates(state, &mut alert, now).await;
    state.alerts.insert(alert.clone()).await?;
    state.metrics.record_alert_created(alert.matches.len());
    info!(
        caller = %caller,
        alert_id = %alert.id,
        blood_type = %alert.blood_type,
        urgency = %alert.urgency,
        matches = alert.matches.len(),
        contacted,
        "alert created"
    );
    Ok(AlertView::from_alert(&alert))
}

/// Manual cancellation: the alert and all its outstanding matches close in
/// one guarded step.
pub async fn cancel_alert(
    state: &AppState,
    caller: &CallerIdentity,
    alert_id: AlertId,
) -> Result<AlertView, AppError> {
    let _guard = state.alert_locks.acquire(alert_id).await?;
    let mut alert = require_alert(state, alert_id).await?;
    let timed_out = alert
        .cancel(state.clock.now())
        .map_err(|err| AppError::InvalidTransition(err.to_string()))?;
    state.alerts.update(alert.clone()).await?;
    state.metrics.record_alert_cancelled();
    info!(caller = %caller, alert_id = %alert_id, timed_out = timed_out.len(), "alert cancelled");
    Ok(AlertView::from_alert(&alert))
}

/// Explicit reopen event for a resolved or expired alert; runs a fresh
/// matching pass since the original candidate set has gone stale.
pub async fn reopen_alert(
    state: &AppState,
    caller: &CallerIdentity,
    alert_id: AlertId,
) -> Result<AlertView, AppError> {
    let _guard = state.alert_locks.acquire(alert_id).await?;
    let mut alert = require_alert(state, alert_id).await?;
    alert
        .reopen()
        .map_err(|err| AppError::InvalidTransition(err.to_string()))?;

    let now = state.clock.now();
    match rank_pool(state, &alert, now).await {
        Ok(ranked) => {
            let added = alert.upsert_candidates(ranked, now);
            state.metrics.record_matches_created(added.len());
        }
        Err(err) => warn!(alert_id = %alert_id, "re-matching on reopen failed: {err:#}"),
    }
    let contacted = contact_top_candidates(state, &mut alert, now).await;
    state.alerts.update(alert.clone()).await?;
    info!(caller = %caller, alert_id = %alert_id, contacted, "alert reopened");
    Ok(AlertView::from_alert(&alert))
}

pub(crate) async fn require_alert(state: &AppState, id: AlertId) -> Result<Alert, AppError> {
    state
        .alerts
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("alert {}", id)))
}

/// Snapshot the registry and rank it against the alert.
pub(crate) async fn rank_pool(
    state: &AppState,
    alert: &Alert,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<RankedCandidate>> {
    let pool = state
        .donors
        .eligible_donors(alert.blood_type, alert.origin, alert.radius_km)
        .await?;
    Ok(matcher::rank(
        alert,
        &pool,
        now,
        state.config.donation_interval_days,
        state.config.match_top_k,
    ))
}

/// Enqueue dispatch intents for the best still-uncontacted candidates and
/// move them to contacted. Enqueue failures are logged, never fatal.
pub(crate) async fn contact_top_candidates(
    state: &AppState,
    alert: &mut Alert,
    now: DateTime<Utc>,
) -> usize {
    let top: Vec<DonorId> = alert
        .ranked_matches()
        .into_iter()
        .filter(|m| m.status == MatchStatus::Available)
        .take(state.config.dispatch_top_n)
        .map(|m| m.donor_id)
        .collect();

    let mut contacted = 0;
    for donor_id in top {
        let channels = match state.donors.get_donor(donor_id).await {
            Ok(Some(donor)) => donor.channels,
            Ok(None) => BTreeSet::new(),
            Err(err) => {
                warn!(donor_id = %donor_id, "registry lookup failed before dispatch: {err:#}");
                continue;
            }
        };
        match state.dispatch.enqueue(alert.id, donor_id, channels).await {
            Ok(intent) => {
                if let Some(record) = alert.match_mut(donor_id) {
                    if record.apply(MatchEvent::Contact, now).is_ok() {
                        contacted += 1;
                        state.metrics.record_dispatch_intent();
                        info!(alert_id = %alert.id, donor_id = %donor_id, intent_id = %intent.id, "dispatch intent enqueued");
                    }
                }
            }
            Err(err) => {
                warn!(alert_id = %alert.id, donor_id = %donor_id, "dispatch enqueue failed: {err:#}");
            }
        }
    }
    contacted
}
