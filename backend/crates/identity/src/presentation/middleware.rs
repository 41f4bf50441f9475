//! Identity Middleware
//!
//! `authenticate` resolves the session cookie into a [`CurrentUser`];
//! `require_user` rejects anonymous requests on protected routes.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderValue;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::{CheckSessionUseCase, CurrentUser};
use crate::domain::repository::IdentityRepository;
use crate::error::IdentityError;

/// Middleware state
pub struct AuthenticationState<R> {
    pub repo: Arc<R>,
    pub config: Arc<IdentityConfig>,
}

impl<R> Clone for AuthenticationState<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }
}

/// Attach the signed-in user, if any, to the request
pub async fn authenticate<R>(
    State(state): State<AuthenticationState<R>>,
    mut req: Request,
    next: Next,
) -> Response
where
    R: IdentityRepository,
{
    let token = platform::cookie::extract_cookie(req.headers(), &state.config.session_cookie_name);

    if let Some(token) = token {
        let use_case =
            CheckSessionUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

        match use_case.execute(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(IdentityError::SessionInvalid) => {
                tracing::debug!("Ignoring invalid session cookie");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed");
            }
        }
    }

    next.run(req).await
}

/// Reject requests without a signed-in user
pub async fn require_user(req: Request, next: Next) -> Result<Response, Response> {
    if req.extensions().get::<CurrentUser>().is_none() {
        let mut response = IdentityError::SessionInvalid.into_response();
        response
            .headers_mut()
            .insert("x-auth-required", HeaderValue::from_static("true"));
        return Err(response);
    }

    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = IdentityError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(IdentityError::SessionInvalid)
    }
}
