//! Bearer-token authentication for the HTTP layer.
//!
//! Trading routes are guarded by a static set of API keys loaded once from
//! the `API_KEYS` environment variable (comma-separated). Missing or weak
//! keys abort startup rather than exposing an unauthenticated trading API.

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Global store for valid API keys
static VALID_API_KEYS: OnceLock<HashSet<String>> = OnceLock::new();

/// Minimum accepted key length (256 bits of entropy as hex/base64 text).
const MIN_KEY_LENGTH: usize = 32;

/// Load the API key set from the `API_KEYS` environment variable.
///
/// Fails when the variable is unset, empty, or contains a key shorter than
/// [`MIN_KEY_LENGTH`]; the caller is expected to abort startup.
pub fn init_api_keys() -> Result<usize, String> {
    let keys_env = std::env::var("API_KEYS").map_err(|_| {
        "API_KEYS environment variable is not set. \
         Set API_KEYS to a comma-separated list of keys \
         (generate one with: openssl rand -base64 32)"
            .to_string()
    })?;

    let mut keys = HashSet::new();
    for key in keys_env.split(',') {
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        if key.len() < MIN_KEY_LENGTH {
            return Err(format!(
                "API key is too weak: {} characters (minimum: {})",
                key.len(),
                MIN_KEY_LENGTH
            ));
        }
        keys.insert(key.to_string());
    }

    if keys.is_empty() {
        return Err("No valid API keys found in API_KEYS".to_string());
    }

    let count = keys.len();
    VALID_API_KEYS
        .set(keys)
        .map_err(|_| "API keys already initialized".to_string())?;
    tracing::info!("API authentication initialized with {} valid key(s)", count);
    Ok(count)
}

fn is_valid_api_key(key: &str) -> bool {
    VALID_API_KEYS
        .get()
        .map(|keys| keys.contains(key))
        .unwrap_or(false)
}

/// Middleware requiring a `Bearer` token on protected endpoints.
pub async fn require_auth(request: Request, next: Next) -> Result<Response, StatusCode> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(auth) if auth.starts_with("Bearer ") => {
            let key = &auth[7..];
            if is_valid_api_key(key) {
                Ok(next.run(request).await)
            } else {
                tracing::warn!("Invalid API key attempted");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
        Some(_) => {
            tracing::warn!("Invalid Authorization header format (expected Bearer token)");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
