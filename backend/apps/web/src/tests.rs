use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use kernel::error::app_error::{AppError, AppResult};
use platform::trace::REQUEST_ID;
use tower::ServiceExt;

use crate::config::AppEnvironment;
use crate::pipeline::{HSTS_VALUE, PipelineOptions, build_app};

const PARENT: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

async fn failing() -> AppResult<&'static str> {
    let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "relay refused");
    Err(AppError::internal("Sending the confirmation email failed").with_source(cause))
}

async fn rejected() -> AppResult<&'static str> {
    Err(AppError::bad_request("The Email field is required."))
}

async fn unavailable() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn panicking() -> &'static str {
    panic!("boom")
}

fn web_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../../wwwroot")
}

fn app(environment: AppEnvironment, https_port: Option<u16>) -> Router {
    let endpoints = home::home_router()
        .route("/Test/Fail", get(failing))
        .route("/Test/Reject", get(rejected))
        .route("/Test/Unavailable", get(unavailable))
        .route("/Test/Panic", get(panicking));

    build_app(
        &PipelineOptions {
            environment,
            https_port,
            web_root: web_root(),
        },
        endpoints,
    )
}

fn production() -> Router {
    app(AppEnvironment::Production, None)
}

async fn get_response(app: Router, uri: &str) -> Response {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn request_id(response: &Response) -> String {
    response.headers()[REQUEST_ID].to_str().unwrap().to_string()
}

#[tokio::test]
async fn test_pages_render_with_request_id() {
    for uri in ["/", "/Home", "/home/privacy", "/Home/Index/42"] {
        let response = get_response(production(), uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert!(response.headers().contains_key(REQUEST_ID));
        assert_eq!(response.headers()[header::STRICT_TRANSPORT_SECURITY], HSTS_VALUE);
    }
}

#[tokio::test]
async fn test_unknown_routes_are_not_found() {
    let response = get_response(production(), "/Home/Nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_response(production(), "/Other/Index").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_production_replaces_failure_with_error_page() {
    let response = get_response(production(), "/Test/Fail").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::STRICT_TRANSPORT_SECURITY], HSTS_VALUE);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store, no-cache");
    assert_eq!(response.headers()[header::PRAGMA], "no-cache");

    let id = request_id(&response);
    let html = body_text(response).await;
    assert!(html.contains("An error occurred while processing your request."));
    assert!(html.contains(&format!("<code>{id}</code>")));
    assert!(!html.contains("relay refused"));
}

#[tokio::test]
async fn test_production_error_page_uses_activity_id() {
    let response = production()
        .oneshot(
            Request::get("/Test/Fail")
                .header("traceparent", PARENT)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let id = request_id(&response);
    assert!(id.starts_with("00-0af7651916cd43dd8448eb211c80319c-"));
    assert!(!id.contains("b7ad6b7169203331"));

    let html = body_text(response).await;
    assert!(html.contains(&id));
}

#[tokio::test]
async fn test_named_environment_behaves_like_production() {
    let staging = app(AppEnvironment::Other("Staging".to_string()), None);
    let response = get_response(staging, "/Test/Fail").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::STRICT_TRANSPORT_SECURITY], HSTS_VALUE);
    let html = body_text(response).await;
    assert!(html.contains("An error occurred while processing your request."));
    assert!(!html.contains("relay refused"));
}

#[tokio::test]
async fn test_development_shows_error_detail() {
    let response = get_response(app(AppEnvironment::Development, None), "/Test/Fail").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        !response
            .headers()
            .contains_key(header::STRICT_TRANSPORT_SECURITY)
    );
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store, no-cache");
    assert_eq!(response.headers()[header::PRAGMA], "no-cache");

    let html = body_text(response).await;
    assert!(html.contains("An unhandled exception occurred while processing the request."));
    assert!(html.contains("Sending the confirmation email failed"));
    assert!(html.contains("relay refused"));
}

#[tokio::test]
async fn test_panics_become_error_page() {
    let response = get_response(production(), "/Test/Panic").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("An error occurred while processing your request."));

    let response = get_response(app(AppEnvironment::Development, None), "/Test/Panic").await;
    let html = body_text(response).await;
    assert!(html.contains("boom"));
}

#[tokio::test]
async fn test_client_errors_pass_through() {
    let response = get_response(production(), "/Test/Reject").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_text(response).await;
    assert!(body.contains("The Email field is required."));
}

#[tokio::test]
async fn test_bare_server_status_is_not_an_exception() {
    let response = get_response(production(), "/Test/Unavailable").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_text(response).await.is_empty());
}

#[tokio::test]
async fn test_error_action_disables_caching() {
    let response = get_response(production(), "/Home/Error").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store, no-cache");
    let id = request_id(&response);
    assert!(body_text(response).await.contains(&id));
}

#[tokio::test]
async fn test_https_redirect_when_port_configured() {
    let response = app(AppEnvironment::Production, Some(5001))
        .oneshot(
            Request::get("/Home/Privacy?lang=en")
                .header(header::HOST, "blog.example.com:5000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "https://blog.example.com:5001/Home/Privacy?lang=en"
    );
}

#[tokio::test]
async fn test_https_redirect_skips_secure_requests() {
    let response = app(AppEnvironment::Production, Some(443))
        .oneshot(
            Request::get("/")
                .header(header::HOST, "blog.example.com")
                .header("x-forwarded-proto", "https")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app(AppEnvironment::Production, Some(443))
        .oneshot(
            Request::get("/")
                .header(header::HOST, "blog.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()[header::LOCATION], "https://blog.example.com/");
}

#[tokio::test]
async fn test_no_redirect_without_port() {
    let response = production()
        .oneshot(
            Request::get("/")
                .header(header::HOST, "blog.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_static_files_are_served_before_routing() {
    let response = get_response(production(), "/css/site.css").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
    assert!(body_text(response).await.contains(".footer"));
}
