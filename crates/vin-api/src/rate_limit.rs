//! Fixed-window rate limiting for `/api/*`
//!
//! Each client address gets a window that opens on its first request and
//! lasts `window`; up to `max_requests` requests are admitted per window.
//! Increment-and-check happens under one lock, so concurrent requests from
//! the same address can never push admissions past the limit.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;

use crate::error::ApiError;
use crate::state::AppState;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Only paths under this prefix are limited
pub const API_PREFIX: &str = "/api/";

const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Limits applied to every client address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

/// Quota snapshot after an admission decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub remaining: u32,
    /// Time until the client's current window closes
    pub reset_after: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed(Quota),
    Rejected(Quota),
}

#[derive(Debug)]
struct Window {
    count: u32,
    started: Instant,
}

/// Per-address fixed-window counter
#[derive(Debug)]
pub struct FixedWindowLimiter {
    policy: RateLimitPolicy,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Count one request from `client` against its current window
    pub fn admit(&self, client: IpAddr) -> Admission {
        self.admit_at(client, Instant::now())
    }

    /// [`admit`](Self::admit) with an explicit clock reading
    pub fn admit_at(&self, client: IpAddr, now: Instant) -> Admission {
        let mut windows = self.windows.lock();
        let window = windows.entry(client).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.saturating_duration_since(window.started) >= self.policy.window {
            window.count = 0;
            window.started = now;
        }

        let reset_after = self
            .policy
            .window
            .saturating_sub(now.saturating_duration_since(window.started));

        if window.count < self.policy.max_requests {
            window.count += 1;
            Admission::Allowed(Quota {
                limit: self.policy.max_requests,
                remaining: self.policy.max_requests - window.count,
                reset_after,
            })
        } else {
            Admission::Rejected(Quota {
                limit: self.policy.max_requests,
                remaining: 0,
                reset_after,
            })
        }
    }

    /// Drop windows that have already closed. Returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Instant::now())
    }

    pub fn prune_expired_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock();
        let before = windows.len();
        windows.retain(|_, w| now.saturating_duration_since(w.started) < self.policy.window);
        before - windows.len()
    }

    /// Number of client addresses with a tracked window
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().len()
    }
}

/// Source address of the request, or the unspecified address when the
/// server was not started with connect info.
pub fn client_identity(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_canonical())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Axum middleware enforcing the limiter on `/api/*`.
///
/// Other paths (health check, static files) pass straight through.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().starts_with(API_PREFIX) {
        return next.run(request).await;
    }

    let limiter = state.limiter();
    let client = client_identity(&request);

    match limiter.admit(client) {
        Admission::Allowed(quota) => {
            let mut response = next.run(request).await;
            set_quota_headers(response.headers_mut(), limiter.policy(), &quota);
            response
        }
        Admission::Rejected(quota) => {
            tracing::warn!(
                client = %client,
                path = %request.uri().path(),
                "Rate limit exceeded"
            );
            let mut response = ApiError::RateLimited.into_response();
            let headers = response.headers_mut();
            set_quota_headers(headers, limiter.policy(), &quota);
            headers.insert(RETRY_AFTER, HeaderValue::from(ceil_secs(quota.reset_after)));
            response
        }
    }
}

/// Standard `RateLimit-*` headers; legacy `X-RateLimit-*` are not sent.
fn set_quota_headers(headers: &mut HeaderMap, policy: &RateLimitPolicy, quota: &Quota) {
    let policy_value = format!("{};w={}", policy.max_requests, policy.window.as_secs());
    if let Ok(value) = HeaderValue::from_str(&policy_value) {
        headers.insert(RATELIMIT_POLICY, value);
    }
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(quota.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(quota.remaining));
    headers.insert(
        RATELIMIT_RESET,
        HeaderValue::from(ceil_secs(quota.reset_after)),
    );
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
