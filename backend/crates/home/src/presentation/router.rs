//! Home Router
//!
//! Conventional routing: `{controller=Home}/{action=Index}/{id?}`.
//! Controller and action names match case-insensitively.

use axum::{
    Router,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use platform::trace::RequestTrace;

use crate::presentation::handlers;

const CONTROLLER: &str = "Home";
const DEFAULT_ACTION: &str = "Index";

/// Create the Home router
pub fn home_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(default_route))
        .route("/{controller}", get(controller_route))
        .route("/{controller}/{action}", get(action_route))
        .route("/{controller}/{action}/{id}", get(action_with_id_route))
}

async fn default_route(trace: RequestTrace) -> Response {
    dispatch(CONTROLLER, DEFAULT_ACTION, trace).await
}

async fn controller_route(Path(controller): Path<String>, trace: RequestTrace) -> Response {
    dispatch(&controller, DEFAULT_ACTION, trace).await
}

async fn action_route(
    Path((controller, action)): Path<(String, String)>,
    trace: RequestTrace,
) -> Response {
    dispatch(&controller, &action, trace).await
}

// The id segment is accepted but none of the actions take it.
async fn action_with_id_route(
    Path((controller, action, _id)): Path<(String, String, String)>,
    trace: RequestTrace,
) -> Response {
    dispatch(&controller, &action, trace).await
}

async fn dispatch(controller: &str, action: &str, trace: RequestTrace) -> Response {
    if !controller.eq_ignore_ascii_case(CONTROLLER) {
        return StatusCode::NOT_FOUND.into_response();
    }

    match action.to_ascii_lowercase().as_str() {
        "index" => handlers::index().await.into_response(),
        "privacy" => handlers::privacy().await.into_response(),
        "error" => handlers::error(trace).await,
        _ => {
            tracing::debug!(controller, action, "No matching action");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
