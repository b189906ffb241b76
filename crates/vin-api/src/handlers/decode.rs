//! VIN decode handlers

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::extract::{ApiPath, ApiQuery, JsonOrForm};
use super::{forward_results, path_identifier};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DecodeQuery {
    /// Model year hint, forwarded as `modelyear`
    pub year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchDecodeRequest {
    /// `VIN[,year];VIN[,year]...`, opaque to the gateway
    #[serde(default)]
    pub data: Option<String>,
}

/// GET /api/decode/{vin}?year=<modelYear>
/// Decode a single VIN
pub async fn decode_vin(
    State(state): State<AppState>,
    ApiPath(vin): ApiPath<String>,
    ApiQuery(query): ApiQuery<DecodeQuery>,
) -> Result<Json<Value>, ApiError> {
    let vin = path_identifier(vin, "VIN")?;

    let response = state
        .client()
        .decode_vin(&vin, query.year.as_deref())
        .await
        .map_err(|failure| state.classify(failure))?;

    forward_results(response, "this VIN")
}

/// POST /api/decodeBatch
/// Decode several VINs in one upstream call
pub async fn decode_batch(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm<BatchDecodeRequest>,
) -> Result<Json<Value>, ApiError> {
    let data = body
        .data
        .filter(|data| !data.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No VIN data provided in field 'data'".to_string()))?;

    let entries = data
        .split(';')
        .filter(|entry| !entry.trim().is_empty())
        .count();
    tracing::info!(entries, "Sending batch decode request to vPIC");

    let response = state
        .client()
        .decode_batch(&data)
        .await
        .map_err(|failure| state.classify(failure))?;

    forward_results(response, "the submitted VINs")
}
