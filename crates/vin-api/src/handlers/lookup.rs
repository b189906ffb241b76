//! Vehicle metadata lookups: makes, models, manufacturers, WMI

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use super::extract::{ApiPath, ApiQuery};
use super::{forward_results, path_identifier};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ManufacturersQuery {
    pub page: Option<String>,
}

/// GET /api/makes
pub async fn list_makes(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let response = state
        .client()
        .all_makes()
        .await
        .map_err(|failure| state.classify(failure))?;

    forward_results(response, "vehicle makes")
}

/// GET /api/models/{make}
pub async fn list_models(
    State(state): State<AppState>,
    ApiPath(make): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    let make = path_identifier(make, "make")?;

    let response = state
        .client()
        .models_for_make(&make)
        .await
        .map_err(|failure| state.classify(failure))?;

    forward_results(response, "models of this make")
}

/// GET /api/manufacturers?page=<n>
///
/// `page` is forwarded as given; an absent or empty value means page 1.
pub async fn list_manufacturers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ManufacturersQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = query
        .page
        .filter(|page| !page.is_empty())
        .unwrap_or_else(|| "1".to_string());

    let response = state
        .client()
        .all_manufacturers(&page)
        .await
        .map_err(|failure| state.classify(failure))?;

    forward_results(response, "manufacturers")
}

/// GET /api/wmi/{code}
pub async fn decode_wmi(
    State(state): State<AppState>,
    ApiPath(code): ApiPath<String>,
) -> Result<Json<Value>, ApiError> {
    let code = path_identifier(code, "WMI code")?;

    let response = state
        .client()
        .decode_wmi(&code)
        .await
        .map_err(|failure| state.classify(failure))?;

    forward_results(response, "this WMI code")
}
