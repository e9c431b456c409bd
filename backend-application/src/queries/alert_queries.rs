use backend_domain::ports::AlertRepository;
use backend_domain::AlertId;

use crate::dtos::{parse_blood_type, AlertFilter, AlertView, MatchView};
use crate::{AppError, AppState};

pub async fn get_alert(state: &AppState, alert_id: AlertId) -> Result<AlertView, AppError> {
    let alert = state
        .alerts
        .get(alert_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("alert {}", alert_id)))?;
    Ok(AlertView::from_alert(&alert))
}

/// All alerts, newest first, optionally narrowed by status and blood type.
/// Archived (terminal) alerts stay listed; history is never deleted.
pub async fn list_alerts(
    state: &AppState,
    filter: AlertFilter,
) -> Result<Vec<AlertView>, AppError> {
    let blood_type = filter
        .blood_type
        .as_deref()
        .map(parse_blood_type)
        .transpose()?;
    let status = filter.status.as_deref().map(str::to_lowercase);

    let mut alerts = state.alerts.list_all().await?;
    alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(alerts
        .into_iter()
        .filter(|alert| blood_type.map_or(true, |bt| alert.blood_type == bt))
        .filter(|alert| {
            status
                .as_deref()
                .map_or(true, |s| alert.status.as_str() == s)
        })
        .map(|alert| AlertView::from_alert(&alert))
        .collect())
}

/// Ranked match list for one alert, best candidate first.
pub async fn list_matches(
    state: &AppState,
    alert_id: AlertId,
) -> Result<Vec<MatchView>, AppError> {
    let alert = state
        .alerts
        .get(alert_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("alert {}", alert_id)))?;
    Ok(alert
        .ranked_matches()
        .into_iter()
        .map(MatchView::from_match)
        .collect())
}
