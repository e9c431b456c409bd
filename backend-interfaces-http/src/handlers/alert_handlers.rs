use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use backend_application::commands::alert_commands;
use backend_application::queries::alert_queries;
use backend_application::{AlertFilter, AlertView, AppState, CreateAlertRequest, MatchView};
use backend_domain::AlertId;

use crate::error::HttpError;
use crate::middleware::{authorize, caller_identity};

pub async fn create_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateAlertRequest>,
) -> Result<Json<AlertView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let caller = caller_identity(&headers);
    let view = alert_commands::create_alert(&state, &caller, payload).await?;
    Ok(Json(view))
}

pub async fn get_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<AlertView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let view = alert_queries::get_alert(&state, AlertId(id)).await?;
    Ok(Json(view))
}

pub async fn list_alerts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<AlertFilter>,
) -> Result<Json<Vec<AlertView>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let views = alert_queries::list_alerts(&state, filter).await?;
    Ok(Json(views))
}

pub async fn list_matches(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MatchView>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let views = alert_queries::list_matches(&state, AlertId(id)).await?;
    Ok(Json(views))
}

pub async fn cancel_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<AlertView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let caller = caller_identity(&headers);
    let view = alert_commands::cancel_alert(&state, &caller, AlertId(id)).await?;
    Ok(Json(view))
}

pub async fn reopen_alert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<AlertView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let caller = caller_identity(&headers);
    let view = alert_commands::reopen_alert(&state, &caller, AlertId(id)).await?;
    Ok(Json(view))
}
