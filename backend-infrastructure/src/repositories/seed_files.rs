// Seed-file loading for the in-memory adapters
// Both files are optional; a missing file seeds nothing.

use std::path::Path;

use serde::Deserialize;
use tokio::fs;

use backend_domain::{BloodType, Component, Donor};

pub async fn load_donors(path: &str) -> anyhow::Result<Vec<Donor>> {
    if !Path::new(path).exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).await?;
    let donors: Vec<Donor> = serde_json::from_str(&content)?;
    Ok(donors)
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventorySeed {
    pub blood_type: BloodType,
    pub component: Component,
    pub units: u32,
    pub threshold: u32,
    pub expires_in_days: u32,
}

pub async fn load_inventory(path: &str) -> anyhow::Result<Vec<InventorySeed>> {
    if !Path::new(path).exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path).await?;
    let seeds: Vec<InventorySeed> = serde_json::from_str(&content)?;
    Ok(seeds)
}
