//! API error types, upstream failure classification and HTTP conversions

use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use vpic_client::{FailureKind, UpstreamFailure};

use crate::rate_limit::RATE_LIMIT_MESSAGE;

/// API error type that converts to HTTP responses
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 400 Bad Request - required input missing, empty or malformed
    BadRequest(String),
    /// 404 Not Found - upstream answered without any results
    NotFound(String),
    /// 429 Too Many Requests
    RateLimited,
    /// 504 Gateway Timeout - upstream missed its deadline
    UpstreamTimeout { api: String },
    /// Upstream answered outside 2xx; the status is mirrored to the caller
    UpstreamStatus {
        api: String,
        status: u16,
        details: Value,
    },
    /// 500 Internal Server Error - no response from upstream at all
    UpstreamUnreachable { api: String, message: String },
}

/// Standard error response format
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Fixed body for rejected admissions
#[derive(Serialize)]
struct RateLimitResponse {
    status: u16,
    message: &'static str,
}

/// Map a failed upstream call to the error the caller sees.
///
/// `api` names the upstream service in the message ("NHTSA API timeout").
pub fn classify(api: &str, failure: UpstreamFailure) -> ApiError {
    tracing::warn!(
        api,
        kind = %failure.kind,
        status = failure.status,
        error = %failure,
        "Upstream call failed"
    );

    match failure.kind {
        FailureKind::Timeout => ApiError::UpstreamTimeout {
            api: api.to_string(),
        },
        FailureKind::HttpError => ApiError::UpstreamStatus {
            api: api.to_string(),
            status: failure.status.unwrap_or(502),
            details: failure.body.unwrap_or(Value::String(failure.message)),
        },
        FailureKind::NetworkError => ApiError::UpstreamUnreachable {
            api: api.to_string(),
            message: failure.message,
        },
    }
}

impl ApiError {
    /// Not-found error for an upstream answer without results
    pub fn no_results(context: &str) -> Self {
        ApiError::NotFound(format!("No results found for {}", context))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ApiError::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::UpstreamUnreachable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn into_body(self) -> ErrorResponse {
        let (error, details) = match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => (msg, None),
            ApiError::RateLimited => (RATE_LIMIT_MESSAGE.to_string(), None),
            ApiError::UpstreamTimeout { api } => (
                format!("{} API timeout", api),
                Some(Value::String(format!(
                    "The {} API took too long to respond. Please try again later.",
                    api
                ))),
            ),
            ApiError::UpstreamStatus {
                api,
                status,
                details,
            } => (format!("{} API error: {}", api, status), Some(details)),
            ApiError::UpstreamUnreachable { api, message } => (
                format!("Error connecting to {} API", api),
                Some(Value::String(message)),
            ),
        };
        ErrorResponse { error, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let ApiError::RateLimited = self {
            let body = Json(RateLimitResponse {
                status: status.as_u16(),
                message: RATE_LIMIT_MESSAGE,
            });
            return (status, body).into_response();
        }

        let body = self.into_body();

        // Log errors at appropriate levels
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %body.error, "API error");
        } else if status.is_client_error() {
            tracing::debug!(status = status.as_u16(), error = %body.error, "API client error");
        }

        (status, Json(body)).into_response()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}
