// Donor entity
// Long-lived registry reference data; eligibility is derived, never stored.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{BloodType, Channel, DonorId, GeoPoint, HealthFlag};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donor {
    pub id: DonorId,
    pub name: String,
    pub blood_type: BloodType,
    pub location: GeoPoint,
    pub last_donation_date: DateTime<Utc>,
    /// 0-100, maintained from donation history.
    pub reliability_score: u8,
    #[serde(default)]
    pub health_flags: BTreeSet<HealthFlag>,
    #[serde(default)]
    pub channels: BTreeSet<Channel>,
    #[serde(default)]
    pub on_call_now: bool,
    #[serde(default)]
    pub total_donations: u32,
}

impl Donor {
    pub fn days_since_last_donation(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_donation_date).num_days()
    }

    pub fn has_disqualifying_flag(&self) -> bool {
        self.health_flags.iter().any(HealthFlag::is_disqualifying)
    }

    /// Active flags that reduce the CCS health factor without blocking
    /// eligibility.
    pub fn advisory_flag_count(&self) -> usize {
        self.health_flags
            .iter()
            .filter(|flag| !flag.is_disqualifying())
            .count()
    }

    /// A donor is eligible when the minimum donation interval has elapsed
    /// and no disqualifying health flag is active.
    pub fn is_eligible(&self, now: DateTime<Utc>, interval_days: u32) -> bool {
        self.days_since_last_donation(now) >= interval_days as i64 && !self.has_disqualifying_flag()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn donor(now: DateTime<Utc>, days_ago: i64) -> Donor {
        Donor {
            id: DonorId::generate(),
            name: "Test Donor".to_string(),
            blood_type: BloodType::ONeg,
            location: GeoPoint::new(28.6139, 77.2090),
            last_donation_date: now - Duration::days(days_ago),
            reliability_score: 90,
            health_flags: BTreeSet::new(),
            channels: BTreeSet::new(),
            on_call_now: false,
            total_donations: 10,
        }
    }

    #[test]
    fn eligible_at_exactly_ninety_days() {
        let now = Utc::now();
        assert!(donor(now, 90).is_eligible(now, 90));
        assert!(!donor(now, 89).is_eligible(now, 90));
    }

    #[test]
    fn disqualifying_flag_blocks_eligibility() {
        let now = Utc::now();
        let mut d = donor(now, 120);
        d.health_flags.insert(HealthFlag::RecentIllness);
        assert!(!d.is_eligible(now, 90));
    }

    #[test]
    fn advisory_flags_do_not_block_eligibility() {
        let now = Utc::now();
        let mut d = donor(now, 120);
        d.health_flags.insert(HealthFlag::Medications);
        d.health_flags.insert(HealthFlag::RecentTravel);
        assert!(d.is_eligible(now, 90));
        assert_eq!(d.advisory_flag_count(), 2);
    }
}
