//! Request Pipeline
//!
//! Outermost first: request span, trace identifier, exception handling
//! (plus HSTS outside Development), HTTPS redirection, panic capture,
//! static files, then the routed endpoints behind authentication.

use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use home::presentation::views;
use identity::IdentityState;
use identity::application::ExternalLoginProvider;
use identity::domain::repository::IdentityRepository;
use identity::middleware::authenticate;
use kernel::error::app_error::{AppError, ErrorReport};
use mailer::EmailSender;
use platform::trace::{RequestTrace, TraceIdentifierGenerator, assign_request_trace};

use crate::config::AppEnvironment;

/// `Strict-Transport-Security` value: 30 days
pub const HSTS_VALUE: &str = "max-age=2592000";

/// Pipeline settings
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub environment: AppEnvironment,
    /// Port HTTP requests are redirected to; `None` disables the redirect
    pub https_port: Option<u16>,
    /// Directory served as static files
    pub web_root: PathBuf,
}

/// Home and identity routes behind the `authenticate` middleware
pub fn endpoints<R, M, P>(identity: IdentityState<R, M, P>) -> Router
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let authentication = identity.authentication();

    home::home_router()
        .merge(identity::identity_router_generic(identity))
        .layer(middleware::from_fn_with_state(
            authentication,
            authenticate::<R>,
        ))
}

/// Wrap `endpoints` in the request pipeline
pub fn build_app(options: &PipelineOptions, endpoints: Router) -> Router {
    // Static files first; anything not on disk falls through to routing
    let static_files = ServeDir::new(&options.web_root)
        .call_fallback_on_method_not_allowed(true)
        .fallback(endpoints);

    Router::new()
        .fallback_service(static_files)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            options.https_port,
            redirect_to_https,
        ))
        .layer(middleware::from_fn_with_state(
            options.environment.clone(),
            handle_exceptions,
        ))
        .layer(middleware::from_fn_with_state(
            Arc::new(TraceIdentifierGenerator::new()),
            assign_request_trace,
        ))
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Exception handling
// ============================================================================

/// Replace unhandled failures with the error page.
///
/// A 5xx response carrying an [`ErrorReport`] is an unhandled failure.
/// Development shows the report; otherwise the generic error page is
/// rendered in place with the original status.
pub async fn handle_exceptions(
    State(environment): State<AppEnvironment>,
    trace: RequestTrace,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;

    let status = response.status();
    let report = if status.is_server_error() {
        response.extensions().get::<ErrorReport>().cloned()
    } else {
        None
    };

    let mut response = match report {
        Some(report) => {
            tracing::error!(
                request_id = %trace.correlation_id(),
                path = %path,
                kind = %report.kind,
                error = %report.message,
                sources = ?report.sources,
                "An unhandled exception has occurred while executing the request"
            );

            if environment.is_development() {
                developer_error_response(&trace, status, &report)
            } else {
                home::render_error_page(&trace, status)
            }
        }
        None => response,
    };

    if !environment.is_development() {
        response
            .headers_mut()
            .insert(header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS_VALUE));
    }

    response
}

fn developer_error_response(trace: &RequestTrace, status: StatusCode, report: &ErrorReport) -> Response {
    let html = views::developer_error_page(
        trace.correlation_id(),
        report.kind.as_str(),
        &report.message,
        &report.sources,
    );

    let mut response = (status, Html(html)).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

/// A panicking handler becomes a 500 with an [`ErrorReport`]
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::internal(format!("Handler panicked: {detail}")).into_response()
}

// ============================================================================
// HTTPS redirection
// ============================================================================

/// 307 to the HTTPS port for requests that did not arrive over HTTPS
pub async fn redirect_to_https(
    State(https_port): State<Option<u16>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(port) = https_port else {
        return next.run(req).await;
    };
    if is_https(&req) {
        return next.run(req).await;
    }
    let Some(host) = request_host(&req) else {
        tracing::debug!("No host to redirect to HTTPS");
        return next.run(req).await;
    };

    let authority = if port == 443 {
        host
    } else {
        format!("{host}:{port}")
    };
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    match HeaderValue::from_str(&format!("https://{authority}{path_and_query}")) {
        Ok(location) => (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response(),
        Err(_) => next.run(req).await,
    }
}

fn is_https(req: &Request) -> bool {
    let forwarded = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"));

    forwarded || req.uri().scheme_str() == Some("https")
}

/// Host name without port, from `Host` or the request URI
fn request_host(req: &Request) -> Option<String> {
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().host().map(str::to_string))?;

    let host = if host.starts_with('[') {
        // IPv6 literal
        host.split_inclusive(']').next().unwrap_or(&host).to_string()
    } else {
        host.split(':').next().unwrap_or(&host).to_string()
    };

    (!host.is_empty()).then_some(host)
}
