// Donor ranking for one alert
// Filters a registry snapshot to qualified candidates and orders them by
// CCS. Safe to run repeatedly against a changing pool: output is keyed by
// donor id and upserted into the alert's match map.

use chrono::{DateTime, Utc};

use crate::entities::alert::Alert;
use crate::entities::donor::Donor;
use crate::services::scorer::{self, CcsScore};
use crate::value_objects::DonorId;

#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub donor_id: DonorId,
    pub ccs: CcsScore,
    pub distance_km: f64,
}

/// Rank a donor pool against an alert: blood-compatible, eligible donors
/// within the search radius, ordered by score descending with ties broken
/// by ascending distance then donor id. `top_k` of zero keeps everyone.
pub fn rank(
    alert: &Alert,
    pool: &[Donor],
    now: DateTime<Utc>,
    interval_days: u32,
    top_k: usize,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = pool
        .iter()
        .filter_map(|donor| {
            let distance_km = alert.origin.haversine_km(&donor.location);
            if distance_km > alert.radius_km {
                return None;
            }
            let ccs = scorer::score(
                donor,
                alert.blood_type,
                distance_km,
                alert.radius_km,
                now,
                interval_days,
            )?;
            Some(RankedCandidate {
                donor_id: donor.id,
                ccs,
                distance_km,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.ccs
            .total
            .cmp(&a.ccs.total)
            .then_with(|| {
                a.distance_km
                    .partial_cmp(&b.distance_km)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.donor_id.cmp(&b.donor_id))
    });

    if top_k > 0 {
        ranked.truncate(top_k);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Duration;

    use crate::value_objects::{AlertId, BloodType, GeoPoint, HealthFlag, Urgency};

    use super::*;

    fn alert() -> Alert {
        Alert::new(
            AlertId::generate(),
            BloodType::ONeg,
            5,
            Urgency::Critical,
            GeoPoint::new(28.6139, 77.2090),
            5.0,
            Utc::now(),
        )
    }

    fn donor(blood_type: BloodType, km_north: f64, days_ago: i64) -> Donor {
        // ~111 km per degree of latitude.
        Donor {
            id: DonorId::generate(),
            name: "Pool Donor".to_string(),
            blood_type,
            location: GeoPoint::new(28.6139 + km_north / 111.2, 77.2090),
            last_donation_date: Utc::now() - Duration::days(days_ago),
            reliability_score: 85,
            health_flags: BTreeSet::new(),
            channels: BTreeSet::new(),
            on_call_now: true,
            total_donations: 5,
        }
    }

    #[test]
    fn excludes_incompatible_ineligible_and_out_of_radius() {
        let a = alert();
        let incompatible = donor(BloodType::APos, 1.0, 120);
        let ineligible = donor(BloodType::ONeg, 1.0, 30);
        let far_away = donor(BloodType::ONeg, 12.0, 120);
        let mut excluded = donor(BloodType::ONeg, 1.0, 120);
        excluded.health_flags.insert(HealthFlag::ChronicCondition);
        let qualified = donor(BloodType::ONeg, 2.0, 120);
        let qualified_id = qualified.id;

        let pool = vec![incompatible, ineligible, far_away, excluded, qualified];
        let ranked = rank(&a, &pool, Utc::now(), 90, 0);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].donor_id, qualified_id);
    }

    #[test]
    fn orders_by_score_then_distance() {
        let a = alert();
        let near = donor(BloodType::ONeg, 0.5, 120);
        let far = donor(BloodType::ONeg, 4.0, 120);
        let near_id = near.id;
        let far_id = far.id;

        let ranked = rank(&a, &[far.clone(), near.clone()], Utc::now(), 90, 0);
        assert_eq!(ranked[0].donor_id, near_id);
        assert_eq!(ranked[1].donor_id, far_id);
        assert!(ranked[0].ccs.total >= ranked[1].ccs.total);
    }

    #[test]
    fn top_k_truncates_and_zero_keeps_everyone() {
        let a = alert();
        let pool: Vec<Donor> = (0..6)
            .map(|i| donor(BloodType::ONeg, 0.5 + i as f64 * 0.5, 120))
            .collect();
        assert_eq!(rank(&a, &pool, Utc::now(), 90, 0).len(), 6);
        assert_eq!(rank(&a, &pool, Utc::now(), 90, 3).len(), 3);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let a = alert();
        let pool: Vec<Donor> = (0..4)
            .map(|i| donor(BloodType::ONeg, 1.0 + i as f64, 120))
            .collect();
        let now = Utc::now();
        let first: Vec<DonorId> = rank(&a, &pool, now, 90, 0)
            .into_iter()
            .map(|c| c.donor_id)
            .collect();
        let second: Vec<DonorId> = rank(&a, &pool, now, 90, 0)
            .into_iter()
            .map(|c| c.donor_id)
            .collect();
        assert_eq!(first, second);
    }
}
