use std::fmt;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use eduzas_config::RateLimitConfig;
use eduzas_core::AppError;
use governor::{DefaultKeyedRateLimiter, RateLimiter};
use tracing::warn;

use crate::state::AppState;

/// Per-client token buckets for the auth endpoints and for the rest of the API.
pub struct RateLimiters {
    general: DefaultKeyedRateLimiter<String>,
    auth: DefaultKeyedRateLimiter<String>,
}

impl fmt::Debug for RateLimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiters")
            .field("general_keys", &self.general.len())
            .field("auth_keys", &self.auth.len())
            .finish()
    }
}

impl RateLimiters {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            general: RateLimiter::keyed(config.general_quota()),
            auth: RateLimiter::keyed(config.auth_quota()),
        }
    }

    /// Drops buckets that are full again so idle clients do not pile up.
    pub fn retain_recent(&self) {
        self.general.retain_recent();
        self.auth.retain_recent();
    }

    fn check(&self, path: &str, key: &str) -> bool {
        let limiter = if path.starts_with("/api/auth") {
            &self.auth
        } else {
            &self.general
        };
        limiter.check_key(&key.to_string()).is_ok()
    }
}

/// First `x-forwarded-for` entry, then `x-real-ip`, then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api/") {
        return next.run(req).await;
    }

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer);

    if !state.rate_limiters.check(path, &key) {
        warn!(client = %key, path, "Rate limit exceeded");
        return AppError::too_many_requests().into_response();
    }

    next.run(req).await
}
