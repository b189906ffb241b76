//! HTTP request handlers for the gateway API
//!
//! Every upstream-backed handler follows the same shape: validate inputs,
//! make one vPIC call, forward the payload verbatim when it has results, and
//! route any failure through [`crate::error::classify`].

pub mod decode;
pub mod extract;
pub mod health;
pub mod lookup;

use axum::Json;
use serde_json::Value;
use vpic_client::{is_dot_segment, UpstreamResponse};

use crate::error::ApiError;

/// True when `payload` carries a non-empty `Results` array
pub fn has_results(payload: &Value) -> bool {
    payload
        .get("Results")
        .and_then(Value::as_array)
        .is_some_and(|results| !results.is_empty())
}

/// Accept a path identifier that can be sent upstream as a single segment.
///
/// `.` and `..` would be normalized out of the upstream URL and change which
/// endpoint is called.
pub(crate) fn path_identifier(value: String, name: &str) -> Result<String, ApiError> {
    if is_dot_segment(&value) {
        return Err(ApiError::BadRequest(format!("Invalid {}: '{}'", name, value)));
    }
    Ok(value)
}

/// Forward an upstream answer unchanged, or 404 when it has no results.
///
/// The upstream status code is not consulted: an empty result set is
/// not-found even when vPIC answered 200.
pub(crate) fn forward_results(
    response: UpstreamResponse,
    context: &str,
) -> Result<Json<Value>, ApiError> {
    if has_results(&response.payload) {
        Ok(Json(response.payload))
    } else {
        tracing::debug!(
            upstream_status = response.status,
            context,
            "Upstream returned no results"
        );
        Err(ApiError::no_results(context))
    }
}
