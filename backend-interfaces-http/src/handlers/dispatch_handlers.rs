use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use backend_application::commands::dispatch_commands;
use backend_application::queries::dispatch_queries;
use backend_application::{AcknowledgeRequest, AppState};
use backend_domain::{AckResult, DispatchIntent, IntentId};

use crate::error::HttpError;
use crate::middleware::{authorize, caller_identity};

/// Pull feed for the external notifier.
pub async fn pending_intents(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<DispatchIntent>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let intents = dispatch_queries::pending_intents(&state).await?;
    Ok(Json(intents))
}

pub async fn acknowledge_intent(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(intent_id): Path<Uuid>,
    Json(payload): Json<AcknowledgeRequest>,
) -> Result<Json<AckResult>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let caller = caller_identity(&headers);
    let ack =
        dispatch_commands::acknowledge_intent(&state, &caller, IntentId(intent_id), payload)
            .await?;
    Ok(Json(ack))
}
