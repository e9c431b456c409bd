// Crossmatch Confidence Score
// Pure and deterministic: identical inputs always yield the identical score
// and factor breakdown. Scored once when a match is created and stored with
// it; views never recompute the arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::donor::Donor;
use crate::value_objects::{BloodType, CompatibilityTier};

/// The five weighted factors. Factor maxima sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcsBreakdown {
    /// 0-30, by compatibility tier.
    pub blood: u8,
    /// 0 or 20; ineligible donors are disqualified outright.
    pub eligibility: u8,
    /// 0-20, linear falloff from the alert origin to the radius boundary.
    pub distance: u8,
    /// 0-20, one point per five points of reliability score.
    pub reliability: u8,
    /// 0-10, minus two per active advisory health flag.
    pub health: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcsScore {
    pub total: u8,
    pub breakdown: CcsBreakdown,
}

/// Score one donor against a shortage. Returns `None` when the donor is
/// disqualified (blood-incompatible or ineligible); the matcher excludes
/// those upstream, this is the authoritative check.
pub fn score(
    donor: &Donor,
    recipient_type: BloodType,
    distance_km: f64,
    radius_km: f64,
    now: DateTime<Utc>,
    interval_days: u32,
) -> Option<CcsScore> {
    let tier = donor.blood_type.compatibility_tier(recipient_type)?;
    if !donor.is_eligible(now, interval_days) {
        return None;
    }

    let breakdown = CcsBreakdown {
        blood: blood_points(tier),
        eligibility: 20,
        distance: distance_points(distance_km, radius_km),
        reliability: donor.reliability_score.min(100) / 5,
        health: 10u8.saturating_sub(2 * donor.advisory_flag_count().min(5) as u8),
    };
    let total = breakdown.blood
        + breakdown.eligibility
        + breakdown.distance
        + breakdown.reliability
        + breakdown.health;
    Some(CcsScore { total, breakdown })
}

fn blood_points(tier: CompatibilityTier) -> u8 {
    match tier {
        CompatibilityTier::Exact => 30,
        CompatibilityTier::RhVariant => 25,
        CompatibilityTier::CrossGroup => 20,
        CompatibilityTier::Distant => 15,
    }
}

/// 20 points at the origin falling linearly to 0 at the radius boundary,
/// clamped on both ends.
fn distance_points(distance_km: f64, radius_km: f64) -> u8 {
    if radius_km <= 0.0 {
        return 0;
    }
    let clamped = distance_km.clamp(0.0, radius_km);
    (20.0 * (radius_km - clamped) / radius_km).floor() as u8
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::Duration;

    use crate::value_objects::{DonorId, GeoPoint, HealthFlag};

    use super::*;

    fn donor(blood_type: BloodType, reliability: u8, days_ago: i64) -> Donor {
        Donor {
            id: DonorId::generate(),
            name: "Scored Donor".to_string(),
            blood_type,
            location: GeoPoint::new(28.6139, 77.2090),
            last_donation_date: Utc::now() - Duration::days(days_ago),
            reliability_score: reliability,
            health_flags: BTreeSet::new(),
            channels: BTreeSet::new(),
            on_call_now: true,
            total_donations: 24,
        }
    }

    #[test]
    fn reference_vector_scores_ninety_three() {
        // Reliability 92, exact match, 1.2 km of a 5 km radius, no flags.
        let now = Utc::now();
        let d = donor(BloodType::ONeg, 92, 95);
        let ccs = score(&d, BloodType::ONeg, 1.2, 5.0, now, 90).expect("qualified");
        assert_eq!(ccs.breakdown.blood, 30);
        assert_eq!(ccs.breakdown.eligibility, 20);
        assert_eq!(ccs.breakdown.distance, 15);
        assert_eq!(ccs.breakdown.reliability, 18);
        assert_eq!(ccs.breakdown.health, 10);
        assert_eq!(ccs.total, 93);
    }

    #[test]
    fn identical_inputs_yield_identical_scores() {
        let now = Utc::now();
        let d = donor(BloodType::APos, 77, 120);
        let first = score(&d, BloodType::AbPos, 3.3, 10.0, now, 90).expect("qualified");
        let second = score(&d, BloodType::AbPos, 3.3, 10.0, now, 90).expect("qualified");
        assert_eq!(first, second);
    }

    #[test]
    fn incompatible_blood_disqualifies() {
        let now = Utc::now();
        let d = donor(BloodType::APos, 90, 120);
        assert!(score(&d, BloodType::ONeg, 1.0, 5.0, now, 90).is_none());
    }

    #[test]
    fn ineligible_donor_disqualifies() {
        let now = Utc::now();
        let recent = donor(BloodType::ONeg, 90, 30);
        assert!(score(&recent, BloodType::ONeg, 1.0, 5.0, now, 90).is_none());

        let mut excluded = donor(BloodType::ONeg, 90, 120);
        excluded.health_flags.insert(HealthFlag::LowHemoglobin);
        assert!(score(&excluded, BloodType::ONeg, 1.0, 5.0, now, 90).is_none());
    }

    #[test]
    fn compatibility_tiers_scale_the_blood_factor() {
        let now = Utc::now();
        let exact = score(&donor(BloodType::OPos, 100, 120), BloodType::OPos, 0.0, 5.0, now, 90)
            .expect("exact");
        let rh = score(&donor(BloodType::ONeg, 100, 120), BloodType::OPos, 0.0, 5.0, now, 90)
            .expect("rh variant");
        let cross = score(&donor(BloodType::OPos, 100, 120), BloodType::APos, 0.0, 5.0, now, 90)
            .expect("cross group");
        let distant = score(&donor(BloodType::ONeg, 100, 120), BloodType::AbPos, 0.0, 5.0, now, 90)
            .expect("distant");
        assert_eq!(exact.breakdown.blood, 30);
        assert_eq!(rh.breakdown.blood, 25);
        assert_eq!(cross.breakdown.blood, 20);
        assert_eq!(distant.breakdown.blood, 15);
    }

    #[test]
    fn distance_factor_clamps_at_both_ends() {
        let now = Utc::now();
        let d = donor(BloodType::ONeg, 100, 120);
        let at_origin = score(&d, BloodType::ONeg, 0.0, 5.0, now, 90).expect("origin");
        assert_eq!(at_origin.breakdown.distance, 20);
        let at_boundary = score(&d, BloodType::ONeg, 5.0, 5.0, now, 90).expect("boundary");
        assert_eq!(at_boundary.breakdown.distance, 0);
        let beyond = score(&d, BloodType::ONeg, 9.0, 5.0, now, 90).expect("beyond");
        assert_eq!(beyond.breakdown.distance, 0);
    }

    #[test]
    fn advisory_flags_erode_the_health_factor_to_zero() {
        let now = Utc::now();
        let mut d = donor(BloodType::ONeg, 100, 120);
        d.health_flags.insert(HealthFlag::Medications);
        let one = score(&d, BloodType::ONeg, 0.0, 5.0, now, 90).expect("one flag");
        assert_eq!(one.breakdown.health, 8);
        d.health_flags.insert(HealthFlag::RecentTravel);
        let two = score(&d, BloodType::ONeg, 0.0, 5.0, now, 90).expect("two flags");
        assert_eq!(two.breakdown.health, 6);
    }
}
