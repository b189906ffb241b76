//! Log output of the gateway middleware and handlers
//!
//! Events are captured with a `tracing_subscriber` fmt layer writing into a
//! shared buffer. The subscriber is thread-local, so this binary holds a
//! single test on the current-thread runtime.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

use vin_api::{create_router, AppState, RateLimitPolicy};
use vpic_client::testing::StubUpstream;

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn request(method: &str, uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .extension(ConnectInfo(SocketAddr::from(([192, 0, 2, 44], 40000))))
        .body(body)
        .unwrap()
}

fn lines_with<'a>(logs: &'a str, needle: &str) -> Vec<&'a str> {
    logs.lines().filter(|line| line.contains(needle)).collect()
}

#[tokio::test]
async fn test_every_request_is_logged() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let docroot = tempfile::tempdir().unwrap();
    std::fs::write(docroot.path().join("index.html"), "<h1>VIN Decoder</h1>").unwrap();

    let upstream = Router::new().route(
        "/api/vehicles/DecodeVINValuesBatch/",
        post(|| async { Json(json!({ "Results": [{ "VIN": "5UXWX7C5*BA" }] })) }),
    );
    let stub = StubUpstream::start(upstream).await.unwrap();
    let router = create_router(
        AppState::new(
            stub.client().unwrap(),
            RateLimitPolicy {
                max_requests: 1,
                window: Duration::from_secs(900),
            },
        )
        .with_static_dir(docroot.path()),
    );

    let batch = json!({ "data": "5UXWX7C5*BA,2011; ;5YJSA3DS*EF" }).to_string();
    let response = router
        .clone()
        .oneshot(request("POST", "/api/decodeBatch", Body::from(batch.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(request("POST", "/api/decodeBatch", Body::from(batch)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = router
        .oneshot(request("GET", "/index.html", Body::empty()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let logs = logs.contents();

    let request_log = lines_with(&logs, "vin_api::request_log");

    // Both batch requests are logged, including the rejected one
    let batch_requests: Vec<_> = request_log
        .iter()
        .filter(|line| line.contains("uri=/api/decodeBatch"))
        .collect();
    assert_eq!(batch_requests.len(), 2, "{}", logs);
    assert!(batch_requests.iter().all(|line| line.contains("method=POST")));
    assert_eq!(lines_with(&logs, "Rate limit exceeded").len(), 1, "{}", logs);

    // Static files go through the same middleware
    assert_eq!(
        request_log
            .iter()
            .filter(|line| line.contains("uri=/index.html"))
            .count(),
        1,
        "{}",
        logs
    );

    // Blank entries between separators are not counted
    let entries = lines_with(&logs, "Sending batch decode request to vPIC");
    assert_eq!(entries.len(), 1, "{}", logs);
    assert!(entries[0].contains("entries=2"), "{}", entries[0]);
}
