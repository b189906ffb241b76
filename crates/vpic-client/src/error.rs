//! Error types for vPIC client operations

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Result type alias for client construction
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while building a client, before any request is made
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP client could not be initialized
    #[error("HTTP client initialization failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// URL parsed but cannot have path segments appended (e.g. `mailto:`)
    #[error("URL cannot be used as an API base: {0}")]
    NotABase(String),
}

/// Category of a failed upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The call did not complete before its deadline
    Timeout,
    /// The upstream answered with a status outside 2xx
    HttpError,
    /// No response at all (DNS, connection refused, TLS, broken body)
    NetworkError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::HttpError => write!(f, "http-error"),
            FailureKind::NetworkError => write!(f, "network-error"),
        }
    }
}

/// A failed upstream call.
///
/// Returned by every request method of [`crate::VpicClient`]; carries enough
/// information for the gateway to build a client-facing error without
/// looking at transport internals.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct UpstreamFailure {
    pub kind: FailureKind,
    /// Upstream status code, only for `HttpError`
    pub status: Option<u16>,
    /// Upstream response body, JSON when it parsed, a string otherwise.
    /// `None` when the upstream sent an empty body.
    pub body: Option<Value>,
    pub message: String,
}

impl UpstreamFailure {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Timeout,
            status: None,
            body: None,
            message: message.into(),
        }
    }

    pub fn http_error(status: u16, body: Option<Value>) -> Self {
        Self {
            kind: FailureKind::HttpError,
            status: Some(status),
            body,
            message: format!("Request failed with status code {}", status),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::NetworkError,
            status: None,
            body: None,
            message: message.into(),
        }
    }

    /// Classify a reqwest transport error.
    ///
    /// Connect and read timeouts both count as `Timeout`; everything else
    /// reqwest reports without a response is a `NetworkError`.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        let message = describe(err);
        if err.is_timeout() {
            Self::timeout(message)
        } else {
            Self::network(message)
        }
    }
}

/// Flatten an error and its sources into one line.
///
/// reqwest's top-level message ("error sending request for url ...") hides
/// the interesting part (connection refused, dns error) in the source chain.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::Timeout.to_string(), "timeout");
        assert_eq!(FailureKind::HttpError.to_string(), "http-error");
        assert_eq!(FailureKind::NetworkError.to_string(), "network-error");
    }

    #[test]
    fn test_http_error_carries_status_and_body() {
        let failure = UpstreamFailure::http_error(503, Some(json!({"Message": "down"})));
        assert_eq!(failure.kind, FailureKind::HttpError);
        assert_eq!(failure.status, Some(503));
        assert_eq!(failure.body, Some(json!({"Message": "down"})));
        assert_eq!(failure.message, "Request failed with status code 503");
    }

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "error sending request")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_describe_walks_sources() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(describe(&err), "error sending request: connection refused");
    }
}
