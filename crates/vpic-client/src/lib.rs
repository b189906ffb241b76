//! vPIC Client Library
//!
//! Typed HTTP client for the NHTSA vPIC vehicle data API. Every call carries
//! its own deadline and every expected failure (timeout, non-2xx status,
//! connection error) comes back as an [`UpstreamFailure`] value instead of
//! a panic or an opaque transport error.
//!
//! # Example
//!
//! ```rust,no_run
//! use vpic_client::VpicClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = VpicClient::new("https://vpic.nhtsa.dot.gov/api/vehicles")?;
//!
//!     match client.decode_vin("1FTFW1ET1EFC12345", Some("2014")).await {
//!         Ok(response) => println!("{}", response.payload),
//!         Err(failure) => eprintln!("{} ({})", failure, failure.kind),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module runs an axum router on an ephemeral port so callers
//! can point a client at a stubbed upstream:
//!
//! ```rust,ignore
//! use vpic_client::testing::StubUpstream;
//!
//! let stub = StubUpstream::start(router).await?;
//! let client = stub.client()?;
//! ```

mod client;
mod error;
pub mod testing;
mod types;

pub use client::{is_dot_segment, UpstreamResult, VpicClient};
pub use error::{ClientError, FailureKind, Result, UpstreamFailure};
pub use types::*;
