use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use backend_application::commands::match_commands;
use backend_application::{AppState, MatchResponseOutcome, MatchResponseRequest};
use backend_domain::{AlertId, DonorId};

use crate::error::HttpError;
use crate::middleware::{authorize, caller_identity};

/// Donor response webhook. Duplicate deliveries come back with
/// `applied = false` and must not be retried.
pub async fn respond_to_match(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((alert_id, donor_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<MatchResponseRequest>,
) -> Result<Json<MatchResponseOutcome>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let caller = caller_identity(&headers);
    let outcome = match_commands::respond_to_match(
        &state,
        &caller,
        AlertId(alert_id),
        DonorId(donor_id),
        payload,
    )
    .await?;
    Ok(Json(outcome))
}
