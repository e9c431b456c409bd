use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    alerts_created: AtomicU64,
    alerts_resolved: AtomicU64,
    alerts_expired: AtomicU64,
    alerts_cancelled: AtomicU64,
    matches_created: AtomicU64,
    dispatch_intents: AtomicU64,
    dispatch_acks: AtomicU64,
    invalid_transitions: AtomicU64,
    reservations: AtomicU64,
    reservation_conflicts: AtomicU64,
    units_expired: AtomicU64,
}

impl Metrics {
    pub fn record_alert_created(&self, match_count: usize) {
        self.alerts_created.fetch_add(1, Ordering::Relaxed);
        self.matches_created
            .fetch_add(match_count as u64, Ordering::Relaxed);
    }

    pub fn record_matches_created(&self, count: usize) {
        self.matches_created.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_alert_resolved(&self) {
        self.alerts_resolved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert_expired(&self) {
        self.alerts_expired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert_cancelled(&self) {
        self.alerts_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch_intent(&self) {
        self.dispatch_intents.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dispatch_ack(&self) {
        self.dispatch_acks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_transition(&self) {
        self.invalid_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reservation(&self) {
        self.reservations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reservation_conflict(&self) {
        self.reservation_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_units_expired(&self, units: u32) {
        self.units_expired.fetch_add(units as u64, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let pairs = [
            ("hemolink_alerts_created_total", &self.alerts_created),
            ("hemolink_alerts_resolved_total", &self.alerts_resolved),
            ("hemolink_alerts_expired_total", &self.alerts_expired),
            ("hemolink_alerts_cancelled_total", &self.alerts_cancelled),
            ("hemolink_matches_created_total", &self.matches_created),
            ("hemolink_dispatch_intents_total", &self.dispatch_intents),
            ("hemolink_dispatch_acks_total", &self.dispatch_acks),
            (
                "hemolink_invalid_transitions_total",
                &self.invalid_transitions,
            ),
            ("hemolink_reservations_total", &self.reservations),
            (
                "hemolink_reservation_conflicts_total",
                &self.reservation_conflicts,
            ),
            ("hemolink_units_expired_total", &self.units_expired),
        ];
        let mut out = String::new();
        for (name, counter) in pairs {
            out.push_str(&format!(
                "# TYPE {name} counter\n{name} {}\n",
                counter.load(Ordering::Relaxed)
            ));
        }
        out
    }
}
