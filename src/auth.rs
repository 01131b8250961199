//! Admin authorization capability. A constant-shape check against the
//! configured token; everything else about auth lives outside this service.

use axum::http::HeaderMap;

use crate::config::Config;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// True when the request carries the configured admin token. An empty
/// configured token disables admin access rather than allowing everyone.
pub fn is_admin(config: &Config, headers: &HeaderMap) -> bool {
    if config.admin_token.is_empty() {
        return false;
    }

    headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| token == config.admin_token)
}
