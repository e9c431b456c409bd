// Blood type value object and red-cell compatibility rules

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the eight ABO/Rh blood types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "O-")]
    ONeg,
    #[serde(rename = "O+")]
    OPos,
    #[serde(rename = "A-")]
    ANeg,
    #[serde(rename = "A+")]
    APos,
    #[serde(rename = "B-")]
    BNeg,
    #[serde(rename = "B+")]
    BPos,
    #[serde(rename = "AB-")]
    AbNeg,
    #[serde(rename = "AB+")]
    AbPos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AboGroup {
    O,
    A,
    B,
    Ab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RhFactor {
    Negative,
    Positive,
}

/// How close a compatible donor type is to the requested type.
/// Incompatible pairings have no tier and are excluded upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CompatibilityTier {
    /// Same ABO group and Rh factor.
    Exact,
    /// Same ABO group, compatible Rh mismatch (e.g. O- donating to O+).
    RhVariant,
    /// Different ABO group, same Rh factor (e.g. O+ donating to A+).
    CrossGroup,
    /// Different ABO group and Rh factor (e.g. O- donating to AB+).
    Distant,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::ONeg,
        BloodType::OPos,
        BloodType::ANeg,
        BloodType::APos,
        BloodType::BNeg,
        BloodType::BPos,
        BloodType::AbNeg,
        BloodType::AbPos,
    ];

    pub fn abo(&self) -> AboGroup {
        match self {
            BloodType::ONeg | BloodType::OPos => AboGroup::O,
            BloodType::ANeg | BloodType::APos => AboGroup::A,
            BloodType::BNeg | BloodType::BPos => AboGroup::B,
            BloodType::AbNeg | BloodType::AbPos => AboGroup::Ab,
        }
    }

    pub fn rh(&self) -> RhFactor {
        match self {
            BloodType::ONeg | BloodType::ANeg | BloodType::BNeg | BloodType::AbNeg => {
                RhFactor::Negative
            }
            BloodType::OPos | BloodType::APos | BloodType::BPos | BloodType::AbPos => {
                RhFactor::Positive
            }
        }
    }

    /// Standard red-cell compatibility: O donates to every group, A and B to
    /// themselves and AB, AB only to AB; Rh-negative donates to either Rh,
    /// Rh-positive only to Rh-positive.
    pub fn can_donate_to(&self, recipient: BloodType) -> bool {
        let abo_ok = match self.abo() {
            AboGroup::O => true,
            AboGroup::A => matches!(recipient.abo(), AboGroup::A | AboGroup::Ab),
            AboGroup::B => matches!(recipient.abo(), AboGroup::B | AboGroup::Ab),
            AboGroup::Ab => recipient.abo() == AboGroup::Ab,
        };
        let rh_ok = match self.rh() {
            RhFactor::Negative => true,
            RhFactor::Positive => recipient.rh() == RhFactor::Positive,
        };
        abo_ok && rh_ok
    }

    /// Tier of a compatible donation, `None` when incompatible.
    pub fn compatibility_tier(&self, recipient: BloodType) -> Option<CompatibilityTier> {
        if !self.can_donate_to(recipient) {
            return None;
        }
        let same_abo = self.abo() == recipient.abo();
        let same_rh = self.rh() == recipient.rh();
        Some(match (same_abo, same_rh) {
            (true, true) => CompatibilityTier::Exact,
            (true, false) => CompatibilityTier::RhVariant,
            (false, true) => CompatibilityTier::CrossGroup,
            (false, false) => CompatibilityTier::Distant,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::ONeg => "O-",
            BloodType::OPos => "O+",
            BloodType::ANeg => "A-",
            BloodType::APos => "A+",
            BloodType::BNeg => "B-",
            BloodType::BPos => "B+",
            BloodType::AbNeg => "AB-",
            BloodType::AbPos => "AB+",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "O-" => Ok(BloodType::ONeg),
            "O+" => Ok(BloodType::OPos),
            "A-" => Ok(BloodType::ANeg),
            "A+" => Ok(BloodType::APos),
            "B-" => Ok(BloodType::BNeg),
            "B+" => Ok(BloodType::BPos),
            "AB-" => Ok(BloodType::AbNeg),
            "AB+" => Ok(BloodType::AbPos),
            other => Err(format!("unknown blood type '{}'", other)),
        }
    }
}

/// Blood component held in inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    WholeBlood,
    RedCells,
    Plasma,
    Platelets,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::WholeBlood => "whole_blood",
            Component::RedCells => "red_cells",
            Component::Plasma => "plasma",
            Component::Platelets => "platelets",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "whole_blood" => Ok(Component::WholeBlood),
            "red_cells" => Ok(Component::RedCells),
            "plasma" => Ok(Component::Plasma),
            "platelets" => Ok(Component::Platelets),
            other => Err(format!("unknown blood component '{}'", other)),
        }
    }
}
