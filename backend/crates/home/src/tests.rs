//! Routing tests for the home pages

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use platform::trace::{REQUEST_ID, TRACEPARENT, TraceIdentifierGenerator, assign_request_trace};
use tower::ServiceExt;

use crate::home_router;

const PREFIX: &str = "0HMVD5J3JQ1OK";

fn app() -> Router {
    let generator = Arc::new(TraceIdentifierGenerator::with_prefix(PREFIX));
    home_router().layer(axum::middleware::from_fn_with_state(
        generator,
        assign_request_trace,
    ))
}

async fn get(uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn send(request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_index_routes() {
    for uri in ["/", "/Home", "/home", "/Home/Index", "/HOME/index", "/Home/Index/42"] {
        let (status, _, body) = get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.contains("Welcome"), "{uri}");
    }
}

#[tokio::test]
async fn test_privacy_routes() {
    for uri in ["/Home/Privacy", "/home/privacy", "/Home/Privacy/7"] {
        let (status, _, body) = get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert!(body.contains("Privacy Policy"), "{uri}");
    }
}

#[tokio::test]
async fn test_unknown_routes_are_not_found() {
    for uri in ["/Home/Missing", "/Blog", "/Blog/Index", "/Other/Privacy/1"] {
        let (status, _, _) = get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_error_shows_trace_identifier() {
    let (status, headers, body) = get("/Home/Error").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-store, no-cache");
    assert_eq!(headers.get(header::PRAGMA).unwrap(), "no-cache");
    assert!(body.contains(&format!("<code>{PREFIX}:00000001</code>")));
    assert_eq!(
        headers.get(REQUEST_ID).unwrap(),
        format!("{PREFIX}:00000001").as_str()
    );
}

#[tokio::test]
async fn test_error_prefers_activity_id() {
    let request = Request::builder()
        .uri("/Home/Error")
        .header(
            TRACEPARENT,
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        )
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(request).await;

    assert_eq!(status, StatusCode::OK);
    let request_id = headers.get(REQUEST_ID).unwrap().to_str().unwrap().to_string();
    assert!(request_id.starts_with("00-4bf92f3577b34da6a3ce929d0e0e4736-"));
    assert!(body.contains(&format!("<code>{request_id}</code>")));
    assert!(!body.contains(PREFIX));
}

#[tokio::test]
async fn test_error_ignores_invalid_traceparent() {
    let request = Request::builder()
        .uri("/Home/Error")
        .header(TRACEPARENT, "not-a-trace-context")
        .body(Body::empty())
        .unwrap();
    let (_, _, body) = send(request).await;

    assert!(body.contains(&format!("<code>{PREFIX}:00000001</code>")));
}
