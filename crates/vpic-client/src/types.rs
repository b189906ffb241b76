//! Request and response types for the vPIC API

use std::time::Duration;

use serde_json::Value;

/// Public vPIC endpoint
pub const DEFAULT_BASE_URL: &str = "https://vpic.nhtsa.dot.gov/api/vehicles";

/// Per-operation deadlines.
///
/// Batch decodes carry many VINs and are given longer than a single decode.
/// Metadata lookups (makes, models, manufacturers, WMI) share `lookup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub decode: Duration,
    pub batch: Duration,
    pub lookup: Duration,
    pub connect: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            decode: Duration::from_secs(10),
            batch: Duration::from_secs(20),
            lookup: Duration::from_secs(30),
            connect: Duration::from_secs(10),
        }
    }
}

/// A 2xx upstream answer.
///
/// `payload` is the decoded JSON document, or `Value::String` holding the raw
/// text when the upstream body was not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub payload: Value,
}
