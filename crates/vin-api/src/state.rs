//! Application state for the gateway API

use std::path::{Path, PathBuf};
use std::sync::Arc;

use vpic_client::{UpstreamFailure, VpicClient};

use crate::config::GatewayConfig;
use crate::error::{classify, ApiError};
use crate::rate_limit::{FixedWindowLimiter, RateLimitPolicy};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Upstream vPIC client (shares one connection pool across clones)
    client: VpicClient,
    /// Upstream name used in client-facing error strings
    api_name: Arc<str>,
    /// Per-address admission counters for `/api/*`
    limiter: Arc<FixedWindowLimiter>,
    /// Document root for the frontend
    static_dir: Arc<PathBuf>,
}

impl AppState {
    /// Create a new AppState with the default "NHTSA" API name and `public`
    /// document root
    pub fn new(client: VpicClient, policy: RateLimitPolicy) -> Self {
        Self {
            client,
            api_name: Arc::from("NHTSA"),
            limiter: Arc::new(FixedWindowLimiter::new(policy)),
            static_dir: Arc::new(PathBuf::from("public")),
        }
    }

    /// Build the state described by a loaded configuration
    pub fn from_config(config: &GatewayConfig) -> Result<Self, vpic_client::ClientError> {
        let client =
            VpicClient::with_timeouts(&config.upstream.base_url, config.upstream.timeouts())?;

        Ok(Self::new(client, config.rate_limit.policy())
            .with_api_name(&config.upstream.api_name)
            .with_static_dir(&config.server.static_dir))
    }

    pub fn with_api_name(mut self, api_name: &str) -> Self {
        self.api_name = Arc::from(api_name);
        self
    }

    pub fn with_static_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.static_dir = Arc::new(dir.as_ref().to_path_buf());
        self
    }

    pub fn client(&self) -> &VpicClient {
        &self.client
    }

    pub fn api_name(&self) -> &str {
        &self.api_name
    }

    pub fn limiter(&self) -> &FixedWindowLimiter {
        &self.limiter
    }

    /// Get the limiter Arc (for background pruning)
    pub fn limiter_arc(&self) -> Arc<FixedWindowLimiter> {
        self.limiter.clone()
    }

    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Classify an upstream failure under this gateway's API name
    pub fn classify(&self, failure: UpstreamFailure) -> ApiError {
        classify(&self.api_name, failure)
    }
}
