// Runtime configuration carried in application state

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    /// Search radius applied when an alert does not specify one.
    pub default_search_radius_km: f64,
    /// Hard cap for the re-matching radius expansion.
    pub max_search_radius_km: f64,
    /// Multiplier applied to the radius when re-matching kicks in.
    pub radius_growth_factor: f64,
    /// Ranked candidates contacted immediately when an alert is created.
    pub dispatch_top_n: usize,
    /// Matcher output cap; 0 keeps every candidate inside the radius.
    pub match_top_k: usize,
    /// Re-match when fewer candidates than this are actively in play.
    pub rematch_min_active: usize,
    /// Seconds after the last ranking before re-matching may fire.
    pub rematch_grace_seconds: u64,
    pub sweep_interval_seconds: u64,
    /// Minimum days between donations for eligibility.
    pub donation_interval_days: u32,
    /// Warning window for units close to expiry.
    pub expiring_soon_days: u32,
    /// How long a caller waits on the per-alert guard before getting a
    /// concurrency conflict.
    pub lock_wait_ms: u64,
    pub notifier_webhook_url: Option<String>,
    pub notifier_webhook_template: Option<String>,
    pub donors_path: String,
    pub inventory_path: String,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub log_dir: Option<String>,
}

impl Default for RuntimeConfig {
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
