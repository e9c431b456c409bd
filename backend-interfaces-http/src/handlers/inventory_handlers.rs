use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use backend_application::commands::inventory_commands;
use backend_application::queries::inventory_queries;
use backend_application::{
    AppState, InventoryStatusView, ReceiveUnitsRequest, ReservationRequest, ReservationView,
    ReserveUnitsRequest,
};

use crate::error::HttpError;
use crate::middleware::{authorize, caller_identity};

pub async fn inventory_overview(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<InventoryStatusView>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let views = inventory_queries::inventory_overview(&state).await?;
    Ok(Json(views))
}

pub async fn inventory_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(blood_type): Path<String>,
) -> Result<Json<Vec<InventoryStatusView>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let views = inventory_queries::inventory_status(&state, &blood_type).await?;
    Ok(Json(views))
}

pub async fn receive_units(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ReceiveUnitsRequest>,
) -> Result<Json<InventoryStatusView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let caller = caller_identity(&headers);
    let view = inventory_commands::receive_units(&state, &caller, payload).await?;
    Ok(Json(view))
}

pub async fn reserve_units(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ReserveUnitsRequest>,
) -> Result<Json<ReservationView>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let caller = caller_identity(&headers);
    let view = inventory_commands::reserve_units(&state, &caller, payload).await?;
    Ok(Json(view))
}

pub async fn release_reservation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ReservationRequest>,
) -> Result<StatusCode, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let caller = caller_identity(&headers);
    inventory_commands::release_reservation(&state, &caller, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn confirm_reservation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ReservationRequest>,
) -> Result<StatusCode, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let caller = caller_identity(&headers);
    inventory_commands::confirm_reservation(&state, &caller, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
