//! Test utilities for vpic-client
//!
//! Runs a stand-in for the vPIC API so gateway and client tests never touch
//! the public service.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::{Result, Timeouts, VpicClient};

/// Path prefix the stub is expected to route under, mirroring the real API
pub const STUB_PREFIX: &str = "/api/vehicles";

/// A stub upstream server that automatically shuts down when dropped
pub struct StubUpstream {
    pub addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl StubUpstream {
    /// Serve `router` on an ephemeral local port
    ///
    /// # Example
    ///
    /// ```ignore
    /// use axum::{routing::get, Json, Router};
    /// use vpic_client::testing::StubUpstream;
    ///
    /// let router = Router::new().route(
    ///     "/api/vehicles/GetAllMakes",
    ///     get(|| async { Json(serde_json::json!({"Results": [{"Make_Name": "FORD"}]})) }),
    /// );
    /// let stub = StubUpstream::start(router).await?;
    /// let makes = stub.client()?.all_makes().await;
    /// ```
    pub async fn start(router: axum::Router) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Base URL to hand to a [`VpicClient`]
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, STUB_PREFIX)
    }

    /// Client pointed at this stub with default timeouts
    pub fn client(&self) -> Result<VpicClient> {
        VpicClient::new(&self.base_url())
    }

    /// Client pointed at this stub with custom timeouts
    pub fn client_with_timeouts(&self, timeouts: Timeouts) -> Result<VpicClient> {
        VpicClient::with_timeouts(&self.base_url(), timeouts)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for StubUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// A base URL on a local port with nothing listening, for connection-refused
/// scenarios.
pub async fn unreachable_base_url() -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}{}", addr, STUB_PREFIX))
}
