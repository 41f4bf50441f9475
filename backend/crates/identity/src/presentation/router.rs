//! Identity Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use mailer::{EmailSender, SmtpEmailSender};

use crate::application::ExternalLoginProvider;
use crate::domain::repository::IdentityRepository;
use crate::infra::{FacebookProvider, PgIdentityRepository};
use crate::presentation::handlers::{self, IdentityState};
use crate::presentation::middleware::require_user;

/// Production state: PostgreSQL store, SMTP delivery, Facebook login
pub type PgIdentityState = IdentityState<PgIdentityRepository, SmtpEmailSender, FacebookProvider>;

/// Create the Identity router with the PostgreSQL repository
pub fn identity_router(state: PgIdentityState) -> Router {
    identity_router_generic(state)
}

/// Create a generic Identity router for any store, sender and provider
///
/// `Manage` needs the `authenticate` middleware layered around this router.
pub fn identity_router_generic<R, M, P>(state: IdentityState<R, M, P>) -> Router
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let account = Router::new()
        .route("/Register", post(handlers::register::<R, M, P>))
        .route("/ConfirmEmail", get(handlers::confirm_email::<R, M, P>))
        .route(
            "/ResendEmailConfirmation",
            post(handlers::resend_confirmation::<R, M, P>),
        )
        .route("/Login", post(handlers::login::<R, M, P>))
        .route("/Logout", post(handlers::logout::<R, M, P>))
        .route("/ForgotPassword", post(handlers::forgot_password::<R, M, P>))
        .route(
            "/ResetPassword",
            get(handlers::reset_password_form).post(handlers::reset_password::<R, M, P>),
        )
        .route(
            "/ExternalLogin/Facebook",
            get(handlers::facebook_challenge::<R, M, P>),
        )
        .route(
            "/ExternalLogin/Facebook/Callback",
            get(handlers::facebook_callback::<R, M, P>),
        )
        .route(
            "/Manage",
            get(handlers::manage).route_layer(middleware::from_fn(require_user)),
        )
        .with_state(state);

    Router::new().nest("/Identity/Account", account)
}
