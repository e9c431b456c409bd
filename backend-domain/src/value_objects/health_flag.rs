// Donor health flags

use serde::{Deserialize, Serialize};

/// Active health condition recorded against a donor. Disqualifying flags
/// block eligibility outright; advisory flags only lower the CCS health
/// factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthFlag {
    RecentIllness,
    Medications,
    RecentTravel,
    ChronicCondition,
    LowHemoglobin,
}

impl HealthFlag {
    pub fn is_disqualifying(&self) -> bool {
        matches!(
            self,
            HealthFlag::RecentIllness | HealthFlag::ChronicCondition | HealthFlag::LowHemoglobin
        )
    }
}
