//! Per-client rate limiting for `/api/*`

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Requests per minute allowed from one client address
pub const API_REQUESTS_PER_MINUTE: u32 = 100;

pub type ApiRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

pub fn api_rate_limiter() -> ApiRateLimiter {
    let per_minute = NonZeroU32::new(API_REQUESTS_PER_MINUTE).unwrap_or(NonZeroU32::MIN);
    RateLimiter::keyed(Quota::per_minute(per_minute))
}

/// Rejects a client once its per-minute budget is spent
///
/// Requests without connection info (in-process callers) share one bucket.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = connect_info
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if state.rate_limiter.check_key(&client).is_err() {
        warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        return Err(ApiError::TooManyRequests(
            "too many requests, try again later".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
