// Alert urgency value object

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    High,
    Normal,
}

impl Urgency {
    /// Time an alert may stay unresolved before the SLA sweep expires it.
    pub fn sla(&self) -> Duration {
        match self {
            Urgency::Critical => Duration::hours(2),
            Urgency::High => Duration::hours(6),
            Urgency::Normal => Duration::hours(24),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Critical => "critical",
            Urgency::High => "high",
            Urgency::Normal => "normal",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Urgency::Critical),
            "high" => Ok(Urgency::High),
            "normal" => Ok(Urgency::Normal),
            other => Err(format!("unknown urgency '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sla_windows_follow_urgency() {
        assert_eq!(Urgency::Critical.sla(), Duration::hours(2));
        assert_eq!(Urgency::High.sla(), Duration::hours(6));
        assert_eq!(Urgency::Normal.sla(), Duration::hours(24));
    }
}
