//! Request logging middleware
//!
//! Logs method, path and arrival time of every inbound request before it is
//! routed, including requests that end up rate limited or served statically.

use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use chrono::{SecondsFormat, Utc};

pub async fn log_request(request: Request<Body>, next: Next) -> Response {
    tracing::info!(
        at = %Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        method = %request.method(),
        uri = %request.uri(),
        "Request"
    );
    next.run(request).await
}
