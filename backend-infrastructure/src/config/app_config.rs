use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::RuntimeConfig;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub default_search_radius_km: f64,
    pub max_search_radius_km: f64,
    pub radius_growth_factor: f64,
    pub dispatch_top_n: usize,
    pub match_top_k: usize,
    pub rematch_min_active: usize,
    pub rematch_grace_seconds: u64,
    pub sweep_interval_seconds: u64,
    pub donation_interval_days: u32,
    pub expiring_soon_days: u32,
    pub lock_wait_ms: u64,
    pub notifier_webhook_url: Option<String>,
    pub notifier_webhook_template: Option<String>,
    pub donors_path: String,
    pub inventory_path: String,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            default_search_radius_km: 10.0,
            max_search_radius_km: 30.0,
            radius_growth_factor: 1.5,
            dispatch_top_n: 5,
            match_top_k: 0,
            rematch_min_active: 3,
            rematch_grace_seconds: 600,
            sweep_interval_seconds: 60,
            donation_interval_days: 90,
            expiring_soon_days: 3,
            lock_wait_ms: 2_000,
            notifier_webhook_url: None,
            notifier_webhook_template: None,
            donors_path: "./donors.json".to_string(),
            inventory_path: "./inventory.json".to_string(),
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("HEMOLINK_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        if !file_path.exists() {
            warn!("config.toml not found, using defaults");
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.resolve_paths(base_dir);
            config.normalize();
            config.validate()?;
            return Ok(config);
        }
        let content = fs::read_to_string(file_path).await?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        if let Some(api_token) = &self.api_token {
            if api_token.trim().is_empty() {
                self.api_token = None;
            }
        }
        if let Some(url) = &self.notifier_webhook_url {
            if url.trim().is_empty() {
                self.notifier_webhook_url = None;
            }
        }
        if let Some(template) = &self.notifier_webhook_template {
            if template.trim().is_empty() {
                self.notifier_webhook_template = None;
            }
        }
        if let Some(log_dir) = &self.log_dir {
            if log_dir.trim().is_empty() {
                self.log_dir = None;
            }
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.donors_path = resolve_path(base, &self.donors_path);
        self.inventory_path = resolve_path(base, &self.inventory_path);
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if !(self.default_search_radius_km > 0.0) {
            return Err(anyhow!("default_search_radius_km must be positive"));
        }
        if self.max_search_radius_km < self.default_search_radius_km {
            return Err(anyhow!(
                "max_search_radius_km must be at least default_search_radius_km"
            ));
        }
        if self.radius_growth_factor < 1.0 {
            return Err(anyhow!("radius_growth_factor must be at least 1.0"));
        }
        if self.donation_interval_days == 0 {
            return Err(anyhow!("donation_interval_days must be positive"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.lock_wait_ms == 0 {
            return Err(anyhow!("lock_wait_ms must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            default_search_radius_km: self.default_search_radius_km,
            max_search_radius_km: self.max_search_radius_km,
            radius_growth_factor: self.radius_growth_factor,
            dispatch_top_n: self.dispatch_top_n,
            match_top_k: self.match_top_k,
            rematch_min_active: self.rematch_min_active,
            rematch_grace_seconds: self.rematch_grace_seconds,
            sweep_interval_seconds: self.sweep_interval_seconds,
            donation_interval_days: self.donation_interval_days,
            expiring_soon_days: self.expiring_soon_days,
            lock_wait_ms: self.lock_wait_ms,
            notifier_webhook_url: self.notifier_webhook_url.clone(),
            notifier_webhook_template: self.notifier_webhook_template.clone(),
            donors_path: self.donors_path.clone(),
            inventory_path: self.inventory_path.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            log_dir: self.log_dir.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("HEMOLINK_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("HEMOLINK_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("HEMOLINK_DEFAULT_SEARCH_RADIUS_KM") {
            self.default_search_radius_km = value.parse().unwrap_or(self.default_search_radius_km);
        }
        if let Ok(value) = env::var("HEMOLINK_MAX_SEARCH_RADIUS_KM") {
            self.max_search_radius_km = value.parse().unwrap_or(self.max_search_radius_km);
        }
        if let Ok(value) = env::var("HEMOLINK_RADIUS_GROWTH_FACTOR") {
            self.radius_growth_factor = value.parse().unwrap_or(self.radius_growth_factor);
        }
        if let Ok(value) = env::var("HEMOLINK_DISPATCH_TOP_N") {
            self.dispatch_top_n = value.parse().unwrap_or(self.dispatch_top_n);
        }
        if let Ok(value) = env::var("HEMOLINK_MATCH_TOP_K") {
            self.match_top_k = value.parse().unwrap_or(self.match_top_k);
        }
        if let Ok(value) = env::var("HEMOLINK_REMATCH_MIN_ACTIVE") {
            self.rematch_min_active = value.parse().unwrap_or(self.rematch_min_active);
        }
        if let Ok(value) = env::var("HEMOLINK_REMATCH_GRACE_SECONDS") {
            self.rematch_grace_seconds = value.parse().unwrap_or(self.rematch_grace_seconds);
        }
        if let Ok(value) = env::var("HEMOLINK_SWEEP_INTERVAL_SECONDS") {
            self.sweep_interval_seconds = value.parse().unwrap_or(self.sweep_interval_seconds);
        }
        if let Ok(value) = env::var("HEMOLINK_DONATION_INTERVAL_DAYS") {
            self.donation_interval_days = value.parse().unwrap_or(self.donation_interval_days);
        }
        if let Ok(value) = env::var("HEMOLINK_EXPIRING_SOON_DAYS") {
            self.expiring_soon_days = value.parse().unwrap_or(self.expiring_soon_days);
        }
        if let Ok(value) = env::var("HEMOLINK_LOCK_WAIT_MS") {
            self.lock_wait_ms = value.parse().unwrap_or(self.lock_wait_ms);
        }
        if let Ok(value) = env::var("HEMOLINK_NOTIFIER_WEBHOOK_URL") {
            self.notifier_webhook_url = Some(value);
        }
        if let Ok(value) = env::var("HEMOLINK_NOTIFIER_WEBHOOK_TEMPLATE") {
            self.notifier_webhook_template = Some(value);
        }
        if let Ok(value) = env::var("HEMOLINK_DONORS_PATH") {
            self.donors_path = value;
        }
        if let Ok(value) = env::var("HEMOLINK_INVENTORY_PATH") {
            self.inventory_path = value;
        }
        if let Ok(value) = env::var("HEMOLINK_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("HEMOLINK_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("HEMOLINK_LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
