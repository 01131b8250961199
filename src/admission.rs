//! # Admission Limiter
//!
//! Per-identity fixed-window request counter, checked before any other
//! processing. Window of 60 seconds, 100 requests per identity; the 101st
//! request inside a window is rejected with 429.
//!
//! Known limitations, stated rather than fixed:
//! - Clients without a resolvable identity all share the `"unknown"` bucket.
//! - Buckets are never evicted, so the map grows over process lifetime.
//! - State is per process instance; concurrent instances count separately.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::state::AppState;

pub const WINDOW: Duration = Duration::from_millis(60_000);
pub const LIMIT: u32 = 100;

/// Shared bucket for clients whose identity cannot be resolved.
pub const FALLBACK_IDENTITY: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny,
}

/// Keyed request counter. The in-memory implementation below is the only
/// one today; the seam exists so a shared external store can replace
/// process memory without touching the middleware.
pub trait AdmissionStore: Send + Sync {
    /// Counts one request for `key` and reports whether it is admitted.
    /// Increment-and-compare is atomic per key.
    fn increment_and_check(&self, key: &str, now: Instant) -> Admission;
}

#[derive(Debug)]
struct Bucket {
    count: u32,
    window_start: Instant,
}

/// Fixed-window counter over a mutex-guarded bucket map.
pub struct MemoryAdmissionStore {
    buckets: Mutex<HashMap<String, Bucket>>,
    window: Duration,
    limit: u32,
}

impl MemoryAdmissionStore {
    pub fn new() -> Self {
        Self::with_limits(WINDOW, LIMIT)
    }

    pub fn with_limits(window: Duration, limit: u32) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            window,
            limit,
        }
    }
}

impl Default for MemoryAdmissionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissionStore for MemoryAdmissionStore {
    fn increment_and_check(&self, key: &str, now: Instant) -> Admission {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());

        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            count: 0,
            window_start: now,
        });

        if now.duration_since(bucket.window_start) > self.window {
            bucket.count = 0;
            bucket.window_start = now;
        }

        bucket.count += 1;

        if bucket.count > self.limit {
            Admission::Deny
        } else {
            Admission::Allow
        }
    }
}

/// Client identity for bucketing: first hop of `x-forwarded-for`, or the
/// shared fallback key when the header is missing or unreadable.
pub fn client_identity(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(FALLBACK_IDENTITY)
        .to_string()
}

/// Router-wide gate. Static-asset prefixes from the config bypass the
/// counter entirely; everything else is counted per identity.
pub async fn admission_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if state
        .config
        .static_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
    {
        return next.run(request).await;
    }

    let identity = client_identity(request.headers());
    match state
        .admission
        .increment_and_check(&identity, Instant::now())
    {
        Admission::Allow => next.run(request).await,
        Admission::Deny => {
            (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response()
        }
    }
}
