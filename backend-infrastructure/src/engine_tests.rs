// End-to-end engine scenarios over the real in-memory adapters.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};

use backend_application::commands::{alert_commands, match_commands, sweep_commands};
use backend_application::dtos::{CreateAlertRequest, MatchResponseRequest, MatchResponseOutcome};
use backend_application::{AlertLocks, AppState, Metrics};
use backend_domain::ports::{Clock, DonorRegistry, InventoryLedger};
use backend_domain::{
    AlertId, AlertStatus, BloodType, CallerIdentity, Component, Donor, DonorId, GeoPoint,
    MatchStatus, RuntimeConfig,
};

use crate::clock::ManualClock;
use crate::repositories::in_memory::{InMemoryAlertRepository, InMemoryDonorRegistry};
use crate::services::dispatch_service::InMemoryDispatchQueue;
use crate::services::inventory_service::InMemoryInventoryLedger;

const ORIGIN: GeoPoint = GeoPoint {
    lat: 28.6139,
    lng: 77.2090,
};

fn donor(blood_type: BloodType, km_north: f64, reliability: u8) -> Donor {
    Donor {
        id: DonorId::generate(),
        name: "Scenario Donor".to_string(),
        blood_type,
        location: GeoPoint::new(ORIGIN.lat + km_north / 111.2, ORIGIN.lng),
        last_donation_date: Utc::now() - Duration::days(120),
        reliability_score: reliability,
        health_flags: BTreeSet::new(),
        channels: BTreeSet::new(),
        on_call_now: true,
        total_donations: 8,
    }
}

fn test_state(config: RuntimeConfig, donors: Vec<Donor>, clock: Arc<ManualClock>) -> AppState {
    let lock_wait = std::time::Duration::from_millis(config.lock_wait_ms);
    AppState {
        config,
        donors: Arc::new(InMemoryDonorRegistry::with_donors(donors)),
        alerts: Arc::new(InMemoryAlertRepository::new()),
        inventory: Arc::new(InMemoryInventoryLedger::new()),
        dispatch: Arc::new(InMemoryDispatchQueue::new()),
        clock,
        metrics: Arc::new(Metrics::default()),
        alert_locks: Arc::new(AlertLocks::new(lock_wait)),
    }
}

fn caller() -> CallerIdentity {
    CallerIdentity::new("test:operator")
}

fn o_neg_request(units_needed: u32, urgency: &str) -> CreateAlertRequest {
    CreateAlertRequest {
        blood_type: "O-".to_string(),
        units_needed,
        urgency: urgency.to_string(),
        origin: ORIGIN,
        radius_km: Some(5.0),
    }
}

async fn respond(
    state: &AppState,
    alert_id: AlertId,
    donor_id: DonorId,
    response: &str,
    units: Option<u32>,
) -> MatchResponseOutcome {
    match_commands::respond_to_match(
        state,
        &caller(),
        alert_id,
        donor_id,
        MatchResponseRequest {
            response: response.to_string(),
            units,
        },
    )
    .await
    .expect("response accepted")
}

async fn walk_to_confirmed(state: &AppState, alert_id: AlertId, donor_id: DonorId, units: u32) {
    respond(state, alert_id, donor_id, "yes", Some(units)).await;
    respond(state, alert_id, donor_id, "en_route", None).await;
    respond(state, alert_id, donor_id, "arrived", None).await;
    respond(state, alert_id, donor_id, "confirmed", None).await;
}

#[tokio::test]
async fn alert_resolves_exactly_on_the_crossing_confirmation() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let pool = vec![
        donor(BloodType::ONeg, 1.2, 92),
        donor(BloodType::ONeg, 2.8, 85),
        donor(BloodType::ONeg, 4.1, 78),
    ];
    let state = test_state(RuntimeConfig::default(), pool, clock);

    let view = alert_commands::create_alert(&state, &caller(), o_neg_request(5, "critical"))
        .await
        .expect("created");
    assert_eq!(view.status, AlertStatus::Open);
    assert_eq!(view.matched_donors, 3);
    // Top candidates were contacted through the dispatch queue.
    assert!(view
        .matches
        .iter()
        .all(|m| m.status == MatchStatus::Contacted));

    let first = view.matches[0].donor_id;
    let second = view.matches[1].donor_id;

    walk_to_confirmed(&state, view.id, first, 3).await;
    let mid = backend_application::queries::alert_queries::get_alert(&state, view.id)
        .await
        .expect("view");
    assert_eq!(mid.status, AlertStatus::PartiallyFulfilled);
    assert_eq!(mid.units_confirmed, 3);
    assert!(mid.units_confirmed <= mid.units_needed);

    walk_to_confirmed(&state, view.id, second, 3).await;
    let done = backend_application::queries::alert_queries::get_alert(&state, view.id)
        .await
        .expect("view");
    assert_eq!(done.status, AlertStatus::Resolved);
    assert_eq!(done.units_confirmed, 6);
    assert!(done.resolved_at.is_some());
}

#[tokio::test]
async fn critical_alert_expires_after_two_hours_with_matches_timed_out() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let pool = vec![
        donor(BloodType::ONeg, 1.0, 90),
        donor(BloodType::ONeg, 2.0, 80),
    ];
    let state = test_state(RuntimeConfig::default(), pool, clock.clone());

    let view = alert_commands::create_alert(&state, &caller(), o_neg_request(5, "critical"))
        .await
        .expect("created");

    // Just inside the SLA nothing happens.
    clock.advance(Duration::minutes(119));
    let report = sweep_commands::run_sla_sweep(&state, &CallerIdentity::system())
        .await
        .expect("sweep");
    assert_eq!(report.alerts_expired, 0);

    clock.advance(Duration::minutes(2));
    let report = sweep_commands::run_sla_sweep(&state, &CallerIdentity::system())
        .await
        .expect("sweep");
    assert_eq!(report.alerts_expired, 1);

    let expired = backend_application::queries::alert_queries::get_alert(&state, view.id)
        .await
        .expect("view");
    assert_eq!(expired.status, AlertStatus::Expired);
    assert!(expired
        .matches
        .iter()
        .all(|m| m.status == MatchStatus::TimedOut));

    // A late donor webhook on the closed alert is absorbed, not failed.
    let donor_id = expired.matches[0].donor_id;
    let outcome = respond(&state, view.id, donor_id, "yes", None).await;
    assert!(!outcome.applied);
}

#[tokio::test]
async fn empty_candidate_pool_still_creates_the_alert_flagged_for_review() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let state = test_state(RuntimeConfig::default(), Vec::new(), clock);

    let view = alert_commands::create_alert(&state, &caller(), o_neg_request(2, "high"))
        .await
        .expect("created despite empty pool");
    assert_eq!(view.status, AlertStatus::Open);
    assert!(view.needs_manual_review);
    assert_eq!(view.matched_donors, 0);
}

#[tokio::test]
async fn duplicate_confirmation_never_double_counts() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let pool = vec![
        donor(BloodType::ONeg, 1.0, 90),
        donor(BloodType::ONeg, 2.0, 80),
    ];
    let state = test_state(RuntimeConfig::default(), pool, clock);

    let view = alert_commands::create_alert(&state, &caller(), o_neg_request(5, "high"))
        .await
        .expect("created");
    let donor_id = view.matches[0].donor_id;
    walk_to_confirmed(&state, view.id, donor_id, 2).await;

    // Webhook retry redelivers the confirmation.
    let retry = respond(&state, view.id, donor_id, "confirmed", None).await;
    assert!(!retry.applied);

    let after = backend_application::queries::alert_queries::get_alert(&state, view.id)
        .await
        .expect("view");
    assert_eq!(after.units_confirmed, 2);
    assert_eq!(after.status, AlertStatus::PartiallyFulfilled);
}

#[tokio::test]
async fn concurrent_confirmations_cannot_race_past_the_threshold() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let pool = vec![
        donor(BloodType::ONeg, 1.0, 90),
        donor(BloodType::ONeg, 2.0, 80),
    ];
    let state = test_state(RuntimeConfig::default(), pool, clock);

    let view = alert_commands::create_alert(&state, &caller(), o_neg_request(1, "critical"))
        .await
        .expect("created");
    let first = view.matches[0].donor_id;
    let second = view.matches[1].donor_id;

    for donor_id in [first, second] {
        respond(&state, view.id, donor_id, "yes", Some(1)).await;
        respond(&state, view.id, donor_id, "en_route", None).await;
        respond(&state, view.id, donor_id, "arrived", None).await;
    }

    let mut tasks = Vec::new();
    for donor_id in [first, second] {
        let state = state.clone();
        let alert_id = view.id;
        tasks.push(tokio::spawn(async move {
            match_commands::respond_to_match(
                &state,
                &CallerIdentity::new("test:webhook"),
                alert_id,
                donor_id,
                MatchResponseRequest {
                    response: "confirmed".to_string(),
                    units: None,
                },
            )
            .await
            .expect("serialized response")
        }));
    }

    let mut applied = 0;
    for task in tasks {
        if task.await.expect("join").applied {
            applied += 1;
        }
    }

    // The per-alert guard serializes the two confirmations; the second one
    // lands on a resolved alert and is absorbed.
    assert_eq!(applied, 1);
    let after = backend_application::queries::alert_queries::get_alert(&state, view.id)
        .await
        .expect("view");
    assert_eq!(after.status, AlertStatus::Resolved);
    assert_eq!(after.units_confirmed, 1);
}

#[tokio::test]
async fn stalled_alert_rematches_with_a_widened_capped_radius() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let near = donor(BloodType::ONeg, 1.0, 90);
    let outside = donor(BloodType::ONeg, 6.0, 85);
    let near_id = near.id;
    let outside_id = outside.id;
    let config = RuntimeConfig {
        rematch_min_active: 2,
        rematch_grace_seconds: 0,
        ..RuntimeConfig::default()
    };
    let state = test_state(config, vec![near, outside], clock.clone());

    let view = alert_commands::create_alert(&state, &caller(), o_neg_request(4, "normal"))
        .await
        .expect("created");
    assert_eq!(view.matched_donors, 1);
    assert_eq!(view.radius_km, 5.0);

    clock.advance(Duration::minutes(1));
    let report = sweep_commands::run_sla_sweep(&state, &CallerIdentity::system())
        .await
        .expect("sweep");
    assert_eq!(report.alerts_rematched, 1);

    let widened = backend_application::queries::alert_queries::get_alert(&state, view.id)
        .await
        .expect("view");
    assert_eq!(widened.radius_km, 7.5);
    assert_eq!(widened.matched_donors, 2);
    // The donor already in play kept its state; the new one was contacted
    // by the re-match dispatch pass.
    let near_match = widened
        .matches
        .iter()
        .find(|m| m.donor_id == near_id)
        .expect("near match");
    assert_eq!(near_match.status, MatchStatus::Contacted);
    assert!(widened.matches.iter().any(|m| m.donor_id == outside_id));
}

#[tokio::test]
async fn radius_expansion_respects_the_configured_cap() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let config = RuntimeConfig {
        rematch_min_active: 1,
        rematch_grace_seconds: 0,
        max_search_radius_km: 6.0,
        ..RuntimeConfig::default()
    };
    let state = test_state(config, Vec::new(), clock.clone());

    let view = alert_commands::create_alert(&state, &caller(), o_neg_request(2, "normal"))
        .await
        .expect("created");

    clock.advance(Duration::minutes(1));
    sweep_commands::run_sla_sweep(&state, &CallerIdentity::system())
        .await
        .expect("sweep");

    let after = backend_application::queries::alert_queries::get_alert(&state, view.id)
        .await
        .expect("view");
    assert_eq!(after.radius_km, 6.0);
}

#[tokio::test]
async fn inventory_shrinkage_triggers_a_rematch_for_open_alerts() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let state = test_state(RuntimeConfig::default(), Vec::new(), clock.clone());

    let view = alert_commands::create_alert(&state, &caller(), o_neg_request(3, "high"))
        .await
        .expect("created");
    assert_eq!(view.matched_donors, 0);

    // A donor registers after creation, and a stocked lot expires.
    state
        .donors
        .upsert_donor(donor(BloodType::ONeg, 1.5, 88))
        .await
        .expect("register donor");
    state
        .inventory
        .receive(
            BloodType::ONeg,
            Component::RedCells,
            2,
            state.clock.now() - Duration::hours(1),
        )
        .await
        .expect("expired lot");

    let events = sweep_commands::run_expiry_sweep(&state, &CallerIdentity::system())
        .await
        .expect("sweep");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].units_expired, 2);

    let after = backend_application::queries::alert_queries::get_alert(&state, view.id)
        .await
        .expect("view");
    assert_eq!(after.matched_donors, 1);
    assert_eq!(after.matches[0].status, MatchStatus::Contacted);
}

#[tokio::test]
async fn declining_keeps_the_alert_open_and_the_match_terminal() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let pool = vec![donor(BloodType::ONeg, 1.0, 90)];
    let state = test_state(RuntimeConfig::default(), pool, clock);

    let view = alert_commands::create_alert(&state, &caller(), o_neg_request(2, "high"))
        .await
        .expect("created");
    let donor_id = view.matches[0].donor_id;

    let outcome = respond(&state, view.id, donor_id, "no", None).await;
    assert!(outcome.applied);
    assert_eq!(outcome.record.status, MatchStatus::RespondedNo);
    assert_eq!(outcome.alert_status, AlertStatus::Open);

    // Any further event on the declined match is absorbed.
    let retry = respond(&state, view.id, donor_id, "yes", None).await;
    assert!(!retry.applied);
}
