use axum::http::HeaderMap;

use backend_domain::{CallerIdentity, RuntimeConfig};

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// Opaque caller identity for audit attribution: the X-Caller-Id header when
/// present, anonymous otherwise. The engine never interprets it.
pub fn caller_identity(headers: &HeaderMap) -> CallerIdentity {
    headers
        .get("X-Caller-Id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(CallerIdentity::new)
        .unwrap_or_else(CallerIdentity::anonymous)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let prefix = "Bearer ";
    if !value.starts_with(prefix) {
        return None;
    }
    let token = value[prefix.len()..].trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
