use axum::Router;

use backend_application::AppState;

use crate::handlers::{
    alert_handlers, dispatch_handlers, inventory_handlers, match_handlers, ops_handlers,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/alerts",
            axum::routing::post(alert_handlers::create_alert).get(alert_handlers::list_alerts),
        )
        .route("/v1/alerts/:id", axum::routing::get(alert_handlers::get_alert))
        .route(
            "/v1/alerts/:id/cancel",
            axum::routing::post(alert_handlers::cancel_alert),
        )
        .route(
            "/v1/alerts/:id/reopen",
            axum::routing::post(alert_handlers::reopen_alert),
        )
        .route(
            "/v1/alerts/:id/matches",
            axum::routing::get(alert_handlers::list_matches),
        )
        .route(
            "/v1/alerts/:id/matches/:donor_id/response",
            axum::routing::post(match_handlers::respond_to_match),
        )
        .route(
            "/v1/inventory",
            axum::routing::get(inventory_handlers::inventory_overview),
        )
        .route(
            "/v1/inventory/receive",
            axum::routing::post(inventory_handlers::receive_units),
        )
        .route(
            "/v1/inventory/reserve",
            axum::routing::post(inventory_handlers::reserve_units),
        )
        .route(
            "/v1/inventory/release",
            axum::routing::post(inventory_handlers::release_reservation),
        )
        .route(
            "/v1/inventory/confirm",
            axum::routing::post(inventory_handlers::confirm_reservation),
        )
        .route(
            "/v1/inventory/:blood_type",
            axum::routing::get(inventory_handlers::inventory_status),
        )
        .route(
            "/v1/dispatch/pending",
            axum::routing::get(dispatch_handlers::pending_intents),
        )
        .route(
            "/v1/dispatch/:intent_id/ack",
            axum::routing::post(dispatch_handlers::acknowledge_intent),
        )
        .route(
            "/v1/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/v1/ops/health/ready",
            axum::routing::get(ops_handlers::health_ready),
        )
        .route(
            "/v1/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
