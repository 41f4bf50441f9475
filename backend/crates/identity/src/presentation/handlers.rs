//! HTTP Handlers

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{AppendHeaders, IntoResponse, Response};
use std::sync::Arc;

use mailer::EmailSender;
use platform::crypto::{constant_time_eq, random_token};

use crate::application::config::IdentityConfig;
use crate::application::{
    ConfirmEmailUseCase, CurrentUser, ExternalLoginOutcome, ExternalLoginProvider,
    ExternalLoginUseCase, ForgotPasswordUseCase, RegisterInput, RegisterUseCase,
    ResendConfirmationUseCase, ResetPasswordInput, ResetPasswordUseCase, SignInInput,
    SignInOutput, SignInUseCase, SignOutUseCase,
};
use crate::domain::repository::IdentityRepository;
use crate::error::{IdentityError, IdentityResult};
use crate::presentation::dto::{
    ConfirmEmailQuery, EmailRequest, ExternalCallbackQuery, ExternalLoginResponse, LoginRequest,
    LoginResponse, ManageResponse, MessageResponse, RegisterRequest, RegisterResponse,
    ResetPasswordForm, ResetPasswordQuery, ResetPasswordRequest,
};
use crate::presentation::middleware::AuthenticationState;

/// Path the provider redirects back to
pub const FACEBOOK_CALLBACK_PATH: &str = "/Identity/Account/ExternalLogin/Facebook/Callback";

/// Shared state for identity handlers
pub struct IdentityState<R, M, P> {
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<IdentityConfig>,
    /// `None` when no Facebook app is configured
    pub facebook: Option<Arc<P>>,
}

impl<R, M, P> IdentityState<R, M, P>
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    pub fn new(repo: R, mailer: Arc<M>, config: IdentityConfig, facebook: Option<P>) -> Self {
        Self {
            repo: Arc::new(repo),
            mailer,
            config: Arc::new(config),
            facebook: facebook.map(Arc::new),
        }
    }

    /// State for the `authenticate` middleware sharing this store
    pub fn authentication(&self) -> AuthenticationState<R> {
        AuthenticationState {
            repo: self.repo.clone(),
            config: self.config.clone(),
        }
    }

    fn facebook(&self) -> IdentityResult<&P> {
        self.facebook
            .as_deref()
            .ok_or_else(|| IdentityError::ExternalLoginUnavailable("Facebook".to_string()))
    }
}

impl<R, M, P> Clone for IdentityState<R, M, P> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            mailer: self.mailer.clone(),
            config: self.config.clone(),
            facebook: self.facebook.clone(),
        }
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /Identity/Account/Register
pub async fn register<R, M, P>(
    State(state): State<IdentityState<R, M, P>>,
    Json(req): Json<RegisterRequest>,
) -> IdentityResult<Json<RegisterResponse>>
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            email: req.email,
            password: req.password,
            confirm_password: req.confirm_password,
        })
        .await?;

    Ok(Json(RegisterResponse {
        user_id: output.user_id,
        requires_confirmation: output.requires_confirmation,
    }))
}

// ============================================================================
// Email Confirmation
// ============================================================================

/// GET /Identity/Account/ConfirmEmail?userId=..&code=..
pub async fn confirm_email<R, M, P>(
    State(state): State<IdentityState<R, M, P>>,
    Query(query): Query<ConfirmEmailQuery>,
) -> IdentityResult<Json<MessageResponse>>
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let use_case = ConfirmEmailUseCase::new(state.repo.clone(), state.repo.clone());
    use_case.execute(&query.user_id, &query.code).await?;

    Ok(Json(MessageResponse::new("Thank you for confirming your email.")))
}

/// POST /Identity/Account/ResendEmailConfirmation
pub async fn resend_confirmation<R, M, P>(
    State(state): State<IdentityState<R, M, P>>,
    Json(req): Json<EmailRequest>,
) -> IdentityResult<Json<MessageResponse>>
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let use_case = ResendConfirmationUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(&req.email).await?;

    Ok(Json(MessageResponse::new(
        "Verification email sent. Please check your email.",
    )))
}

// ============================================================================
// Login / Logout
// ============================================================================

/// POST /Identity/Account/Login
pub async fn login<R, M, P>(
    State(state): State<IdentityState<R, M, P>>,
    Json(req): Json<LoginRequest>,
) -> IdentityResult<impl IntoResponse>
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(SignInInput {
            email: req.email,
            password: req.password,
            remember_me: req.remember_me,
        })
        .await?;

    let cookie = session_cookie(&state.config, &output);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user_id: output.user_id,
            email: output.email,
        }),
    ))
}

/// POST /Identity/Account/Logout
pub async fn logout<R, M, P>(
    State(state): State<IdentityState<R, M, P>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let cookie = state.config.session_cookie();

    if let Some(token) = cookie.extract(&headers) {
        let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());
        // Ignore errors - just clear the cookie
        if let Err(e) = use_case.execute(&token).await {
            tracing::debug!(error = %e, "Sign-out with an unknown session");
        }
    }

    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cookie.delete_cookie_header())],
    )
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /Identity/Account/ForgotPassword
pub async fn forgot_password<R, M, P>(
    State(state): State<IdentityState<R, M, P>>,
    Json(req): Json<EmailRequest>,
) -> IdentityResult<Json<MessageResponse>>
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let use_case = ForgotPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(&req.email).await?;

    Ok(Json(MessageResponse::new(
        "Please check your email to reset your password.",
    )))
}

/// GET /Identity/Account/ResetPassword?code=...
///
/// Target of the link in the reset email. Hands the code to the form.
pub async fn reset_password_form(
    Query(query): Query<ResetPasswordQuery>,
) -> IdentityResult<Json<ResetPasswordForm>> {
    match query.code {
        Some(code) if !code.is_empty() => Ok(Json(ResetPasswordForm { code })),
        _ => Err(IdentityError::ResetCodeMissing),
    }
}

/// POST /Identity/Account/ResetPassword
pub async fn reset_password<R, M, P>(
    State(state): State<IdentityState<R, M, P>>,
    Json(req): Json<ResetPasswordRequest>,
) -> IdentityResult<Json<MessageResponse>>
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let use_case = ResetPasswordUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    use_case
        .execute(ResetPasswordInput {
            email: req.email,
            code: req.code,
            password: req.password,
            confirm_password: req.confirm_password,
        })
        .await?;

    Ok(Json(MessageResponse::new("Your password has been reset.")))
}

// ============================================================================
// External Login (Facebook)
// ============================================================================

/// GET /Identity/Account/ExternalLogin/Facebook
///
/// Redirects to Facebook with a fresh `state`, remembered in a short-lived cookie.
pub async fn facebook_challenge<R, M, P>(
    State(state): State<IdentityState<R, M, P>>,
) -> IdentityResult<Response>
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let provider = state.facebook()?;

    let oauth_state = random_token(32);
    let redirect_uri = state.config.absolute_url(FACEBOOK_CALLBACK_PATH);
    let location = provider.authorization_url(&oauth_state, &redirect_uri)?;
    let location = HeaderValue::from_str(&location)
        .map_err(|e| IdentityError::Internal(format!("Invalid redirect: {e}")))?;

    let state_cookie = state
        .config
        .external_cookie()
        .set_cookie_header(&oauth_state, Some(state.config.external_state_ttl.as_secs()));

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, location), (header::SET_COOKIE, state_cookie)],
    )
        .into_response())
}

/// GET /Identity/Account/ExternalLogin/Facebook/Callback
pub async fn facebook_callback<R, M, P>(
    State(state): State<IdentityState<R, M, P>>,
    headers: HeaderMap,
    Query(query): Query<ExternalCallbackQuery>,
) -> IdentityResult<Response>
where
    R: IdentityRepository,
    M: EmailSender + Send + Sync + 'static,
    P: ExternalLoginProvider + Send + Sync + 'static,
{
    let provider = state.facebook()?;

    if let Some(error) = query.error {
        let detail = query.error_description.unwrap_or(error);
        return Err(IdentityError::ExternalLoginFailed(detail));
    }

    let external_cookie = state.config.external_cookie();
    let expected = external_cookie.extract(&headers);
    let state_valid = match (expected.as_deref(), query.state.as_deref()) {
        (Some(expected), Some(actual)) => constant_time_eq(expected.as_bytes(), actual.as_bytes()),
        _ => false,
    };
    if !state_valid {
        return Err(IdentityError::ExternalStateMismatch);
    }

    let code = query
        .code
        .ok_or_else(|| IdentityError::ExternalLoginFailed("Missing code".to_string()))?;

    let redirect_uri = state.config.absolute_url(FACEBOOK_CALLBACK_PATH);
    let profile = provider.fetch_profile(&code, &redirect_uri).await?;

    let use_case = ExternalLoginUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let response = match use_case.execute(provider.name(), profile).await? {
        ExternalLoginOutcome::SignedIn(output) => (
            StatusCode::FOUND,
            [(header::LOCATION, HeaderValue::from_static("/"))],
            AppendHeaders([
                (header::SET_COOKIE, external_cookie.delete_cookie_header()),
                (header::SET_COOKIE, session_cookie(&state.config, &output)),
            ]),
        )
            .into_response(),
        ExternalLoginOutcome::ConfirmationRequired { email } => (
            StatusCode::OK,
            [(header::SET_COOKIE, external_cookie.delete_cookie_header())],
            Json(ExternalLoginResponse {
                requires_confirmation: true,
                email,
            }),
        )
            .into_response(),
    };

    Ok(response)
}

// ============================================================================
// Manage (requires authentication)
// ============================================================================

/// GET /Identity/Account/Manage
pub async fn manage(user: CurrentUser) -> Json<ManageResponse> {
    Json(ManageResponse {
        user_id: user.user_id.to_string(),
        email: user.email,
        email_confirmed: user.email_confirmed,
    })
}

/// Session cookie; persistent only with "Remember me?"
fn session_cookie(config: &IdentityConfig, output: &SignInOutput) -> HeaderValue {
    let max_age = output
        .remember_me
        .then_some(config.session_ttl_long.as_secs());

    config
        .session_cookie()
        .set_cookie_header(&output.session_token, max_age)
}
