// Derived stock status, never stored

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stock health relative to the configured threshold:
/// critical when available/threshold <= 25%, low <= 50%, medium <= 75%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Critical,
    Low,
    Medium,
    Good,
}

impl StockStatus {
    pub fn from_levels(available: u32, threshold: u32) -> Self {
        if threshold == 0 {
            return StockStatus::Good;
        }
        let available = available as u64;
        let threshold = threshold as u64;
        if available * 4 <= threshold {
            StockStatus::Critical
        } else if available * 2 <= threshold {
            StockStatus::Low
        } else if available * 4 <= threshold * 3 {
            StockStatus::Medium
        } else {
            StockStatus::Good
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Critical => "critical",
            StockStatus::Low => "low",
            StockStatus::Medium => "medium",
            StockStatus::Good => "good",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
