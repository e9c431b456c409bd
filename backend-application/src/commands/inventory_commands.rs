use tracing::{info, warn};

use backend_domain::ports::{Clock, InventoryLedger};
use backend_domain::{CallerIdentity, LedgerError};
use chrono::Duration;

use crate::dtos::{
    parse_blood_type, parse_component, InventoryStatusView, ReceiveUnitsRequest,
    ReservationRequest, ReservationView, ReserveUnitsRequest,
};
use crate::{AppError, AppState};

/// External intake: record delivered units with their expiry date.
pub async fn receive_units(
    state: &AppState,
    caller: &CallerIdentity,
    request: ReceiveUnitsRequest,
) -> Result<InventoryStatusView, AppError> {
    let blood_type = parse_blood_type(&request.blood_type)?;
    let component = parse_component(&request.component)?;
    if request.units == 0 {
        return Err(AppError::Validation("units must be positive".to_string()));
    }
    if request.expires_in_days == 0 {
        return Err(AppError::Validation(
            "expires_in_days must be positive".to_string(),
        ));
    }

    let now = state.clock.now();
    if let Some(threshold) = request.threshold {
        state
            .inventory
            .set_threshold(blood_type, component, threshold)
            .await?;
    }
    let expires_at = now + Duration::days(request.expires_in_days as i64);
    state
        .inventory
        .receive(blood_type, component, request.units, expires_at)
        .await?;
    info!(
        caller = %caller,
        blood_type = %blood_type,
        component = %component,
        units = request.units,
        "units received into inventory"
    );

    let entry = state
        .inventory
        .entry(blood_type, component)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("inventory entry {} {}", blood_type, component)))?;
    Ok(InventoryStatusView::from_entry(
        &entry,
        now,
        state.config.expiring_soon_days,
    ))
}

/// Atomic reservation against one (blood type, component) key.
/// `InsufficientStock` is non-fatal; the caller may retry after intake.
pub async fn reserve_units(
    state: &AppState,
    caller: &CallerIdentity,
    request: ReserveUnitsRequest,
) -> Result<ReservationView, AppError> {
    let blood_type = parse_blood_type(&request.blood_type)?;
    let component = parse_component(&request.component)?;
    if request.units == 0 {
        return Err(AppError::Validation("units must be positive".to_string()));
    }

    match state
        .inventory
        .reserve(blood_type, component, request.units)
        .await
    {
        Ok(token) => {
            state.metrics.record_reservation();
            info!(
                caller = %caller,
                blood_type = %blood_type,
                component = %component,
                units = request.units,
                token = %token,
                "units reserved"
            );
            Ok(ReservationView { token })
        }
        Err(err @ LedgerError::InsufficientStock { .. }) => {
            state.metrics.record_reservation_conflict();
            warn!(
                caller = %caller,
                blood_type = %blood_type,
                component = %component,
                units = request.units,
                "reservation refused: {err}"
            );
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn release_reservation(
    state: &AppState,
    caller: &CallerIdentity,
    request: ReservationRequest,
) -> Result<(), AppError> {
    state.inventory.release(request.token).await?;
    info!(caller = %caller, token = %request.token, "reservation released");
    Ok(())
}

/// Consume a reservation permanently (units handed over).
pub async fn confirm_reservation(
    state: &AppState,
    caller: &CallerIdentity,
    request: ReservationRequest,
) -> Result<(), AppError> {
    state.inventory.confirm(request.token).await?;
    info!(caller = %caller, token = %request.token, "reservation confirmed");
    Ok(())
}
