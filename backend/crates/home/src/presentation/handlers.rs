//! Home Handlers

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use platform::trace::RequestTrace;

use super::views;
use crate::domain::error_view_model::ErrorViewModel;

/// GET /
pub async fn index() -> Html<String> {
    Html(views::index_page())
}

/// GET /Home/Privacy
pub async fn privacy() -> Html<String> {
    Html(views::privacy_page())
}

/// GET /Home/Error
pub async fn error(trace: RequestTrace) -> Response {
    render_error_page(&trace, StatusCode::OK)
}

/// Error page for `trace`, never cached.
///
/// The exception handler calls this directly with the failed request's
/// status so the original 5xx is kept.
pub fn render_error_page(trace: &RequestTrace, status: StatusCode) -> Response {
    let model = ErrorViewModel::new(Some(trace.correlation_id().to_string()));

    let mut response = (status, Html(views::error_page(&model))).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}
