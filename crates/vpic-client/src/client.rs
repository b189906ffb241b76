//! vPIC HTTP client implementation

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{ClientError, Result, UpstreamFailure};
use crate::types::{Timeouts, UpstreamResponse};

/// Outcome of a single upstream call
pub type UpstreamResult = std::result::Result<UpstreamResponse, UpstreamFailure>;

/// vPIC REST API client
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct VpicClient {
    client: Client,
    base_url: Url,
    timeouts: Timeouts,
}

impl VpicClient {
    /// Create a new client with default timeouts
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the vehicles API
    ///   (e.g., "https://vpic.nhtsa.dot.gov/api/vehicles")
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeouts(base_url, Timeouts::default())
    }

    /// Create a new client with custom per-operation timeouts
    pub fn with_timeouts(base_url: &str, timeouts: Timeouts) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .build()?;

        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::NotABase(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url,
            timeouts,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the configured timeouts
    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    // =========================================================================
    // URL construction
    // =========================================================================

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so caller-supplied identifiers cannot introduce extra segments or a query.
    /// Dot segments are dropped by URL normalization; callers must screen
    /// identifiers with [`is_dot_segment`] first.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in the constructor
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn json_endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint(segments);
        url.query_pairs_mut().append_pair("format", "json");
        url
    }

    /// `GET DecodeVinValuesExtended/{vin}?format=json[&modelyear={year}]`
    pub fn decode_vin_url(&self, vin: &str, model_year: Option<&str>) -> Url {
        let mut url = self.json_endpoint(&["DecodeVinValuesExtended", vin]);
        if let Some(year) = model_year.filter(|y| !y.is_empty()) {
            url.query_pairs_mut().append_pair("modelyear", year);
        }
        url
    }

    /// `POST DecodeVINValuesBatch/` (the trailing slash is part of the route)
    pub fn decode_batch_url(&self) -> Url {
        self.endpoint(&["DecodeVINValuesBatch", ""])
    }

    pub fn all_makes_url(&self) -> Url {
        self.json_endpoint(&["GetAllMakes"])
    }

    pub fn models_for_make_url(&self, make: &str) -> Url {
        self.json_endpoint(&["GetModelsForMake", make])
    }

    pub fn all_manufacturers_url(&self, page: &str) -> Url {
        let mut url = self.json_endpoint(&["GetAllManufacturers"]);
        url.query_pairs_mut().append_pair("page", page);
        url
    }

    pub fn decode_wmi_url(&self, code: &str) -> Url {
        self.json_endpoint(&["DecodeWMI", code])
    }

    // =========================================================================
    // Decode operations
    // =========================================================================

    /// Decode a single VIN, optionally qualified by model year
    #[instrument(skip(self))]
    pub async fn decode_vin(&self, vin: &str, model_year: Option<&str>) -> UpstreamResult {
        let url = self.decode_vin_url(vin, model_year);
        info!("Fetching data from vPIC: {}", url);

        self.execute(self.client.get(url), self.timeouts.decode).await
    }

    /// Decode several VINs in one call.
    ///
    /// `data` is forwarded untouched as the `data` form field; its
    /// `VIN,year;VIN,year` encoding is defined by vPIC.
    #[instrument(skip(self, data))]
    pub async fn decode_batch(&self, data: &str) -> UpstreamResult {
        let url = self.decode_batch_url();
        debug!("Posting batch decode to {}", url);

        let request = self
            .client
            .post(url)
            .form(&[("data", data), ("format", "json")]);
        self.execute(request, self.timeouts.batch).await
    }

    // =========================================================================
    // Metadata lookups
    // =========================================================================

    #[instrument(skip(self))]
    pub async fn all_makes(&self) -> UpstreamResult {
        let url = self.all_makes_url();
        self.execute(self.client.get(url), self.timeouts.lookup).await
    }

    #[instrument(skip(self))]
    pub async fn models_for_make(&self, make: &str) -> UpstreamResult {
        let url = self.models_for_make_url(make);
        self.execute(self.client.get(url), self.timeouts.lookup).await
    }

    #[instrument(skip(self))]
    pub async fn all_manufacturers(&self, page: &str) -> UpstreamResult {
        let url = self.all_manufacturers_url(page);
        self.execute(self.client.get(url), self.timeouts.lookup).await
    }

    #[instrument(skip(self))]
    pub async fn decode_wmi(&self, code: &str) -> UpstreamResult {
        let url = self.decode_wmi_url(code);
        self.execute(self.client.get(url), self.timeouts.lookup).await
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    /// Send a request with its deadline and sort the outcome into a
    /// response or an [`UpstreamFailure`]. The deadline covers the body read.
    async fn execute(&self, request: RequestBuilder, timeout: Duration) -> UpstreamResult {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| UpstreamFailure::from_transport(&e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamFailure::from_transport(&e))?;

        if status.is_success() {
            Ok(UpstreamResponse {
                status: status.as_u16(),
                payload: parse_body(&bytes),
            })
        } else {
            warn!(status = status.as_u16(), "vPIC returned an error status");
            let body = (!bytes.is_empty()).then(|| parse_body(&bytes));
            Err(UpstreamFailure::http_error(status.as_u16(), body))
        }
    }
}

/// True for `.` and `..`, which URL normalization removes instead of
/// encoding, so they can never be sent as a path identifier.
pub fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

fn parse_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
