//! vin-api - VIN decoder gateway REST layer
//!
//! Relays decode and lookup requests from a browser frontend to the NHTSA
//! vPIC API, forwarding successful payloads verbatim and normalizing every
//! failure into `{error, details}` JSON. Requests under `/api/` are rate
//! limited per client address.
//!
//! # Usage
//!
//! ```ignore
//! use vin_api::{create_router, AppState, GatewayConfig};
//!
//! let config = GatewayConfig::default();
//! let state = AppState::from_config(&config)?;
//! let router = create_router(state);
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod request_log;
pub mod state;

pub use config::{ConfigError, GatewayConfig};
pub use error::{classify, ApiError};
pub use rate_limit::{FixedWindowLimiter, RateLimitPolicy};
pub use state::AppState;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the gateway router with the given application state.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()` so the
/// rate limiter can tell clients apart.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Decode routes
        .route("/decode/{vin}", get(handlers::decode::decode_vin))
        .route("/decodeBatch", post(handlers::decode::decode_batch))
        // Lookup routes
        .route("/makes", get(handlers::lookup::list_makes))
        .route("/models/{make}", get(handlers::lookup::list_models))
        .route("/manufacturers", get(handlers::lookup::list_manufacturers))
        .route("/wmi/{code}", get(handlers::lookup::decode_wmi));

    Router::new()
        // Health check
        .route("/health", get(handlers::health::health))
        .nest("/api", api)
        // Frontend assets for anything unmatched
        .fallback_service(ServeDir::new(state.static_dir()))
        // Middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_middleware,
        ))
        .layer(middleware::from_fn(request_log::log_request))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
