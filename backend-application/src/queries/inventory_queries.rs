use backend_domain::ports::{Clock, InventoryLedger};

use crate::dtos::{parse_blood_type, InventoryStatusView};
use crate::{AppError, AppState};

/// Per-component stock for one blood type, with derived status and the
/// expiring-soon count.
pub async fn inventory_status(
    state: &AppState,
    blood_type: &str,
) -> Result<Vec<InventoryStatusView>, AppError> {
    let blood_type = parse_blood_type(blood_type)?;
    let now = state.clock.now();
    let mut views: Vec<InventoryStatusView> = state
        .inventory
        .entries()
        .await?
        .iter()
        .filter(|entry| entry.blood_type == blood_type)
        .map(|entry| InventoryStatusView::from_entry(entry, now, state.config.expiring_soon_days))
        .collect();
    views.sort_by_key(|view| view.component);
    Ok(views)
}

/// Stock overview across every tracked (blood type, component) key.
pub async fn inventory_overview(state: &AppState) -> Result<Vec<InventoryStatusView>, AppError> {
    let now = state.clock.now();
    let mut views: Vec<InventoryStatusView> = state
        .inventory
        .entries()
        .await?
        .iter()
        .map(|entry| InventoryStatusView::from_entry(entry, now, state.config.expiring_soon_days))
        .collect();
    views.sort_by_key(|view| (view.blood_type, view.component));
    Ok(views)
}
