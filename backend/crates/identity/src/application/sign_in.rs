//! Sign In Use Case
//!
//! Authenticates with email and password and creates a session.

use std::sync::Arc;

use platform::password::ClearTextPassword;

use crate::application::config::{IdentityConfig, to_chrono};
use crate::application::session_token;
use crate::domain::entity::{auth_session::AuthSession, user::User};
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::domain::value_object::email::Email;
use crate::error::{IdentityError, IdentityResult};

pub struct SignInInput {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

/// Result of any successful sign-in (password or external)
pub struct SignInOutput {
    /// Signed token for the session cookie
    pub session_token: String,
    pub remember_me: bool,
    pub user_id: String,
    pub email: String,
}

pub struct SignInUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<IdentityConfig>,
}

impl<U, S> SignInUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<IdentityConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(&self, input: SignInInput) -> IdentityResult<SignInOutput> {
        let email = Email::new(input.email).map_err(|_| IdentityError::InvalidCredentials)?;
        let password = ClearTextPassword::normalized(input.password);

        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        let password_valid = user
            .password_hash
            .as_ref()
            .is_some_and(|hash| hash.verify(&password));
        if !password_valid {
            return Err(IdentityError::InvalidCredentials);
        }

        ensure_can_sign_in(&user, &self.config)?;

        start_session(
            self.session_repo.as_ref(),
            &self.config,
            &user,
            input.remember_me,
        )
        .await
    }
}

/// Refuse accounts that may not sign in yet
pub(crate) fn ensure_can_sign_in(user: &User, config: &IdentityConfig) -> IdentityResult<()> {
    if config.require_confirmed_account && !user.can_sign_in() {
        tracing::info!(user_id = %user.user_id, "Sign-in refused: email not confirmed");
        return Err(IdentityError::NotAllowed);
    }
    Ok(())
}

/// Persist a new session for `user` and sign its cookie token
pub(crate) async fn start_session<S: AuthSessionRepository>(
    session_repo: &S,
    config: &IdentityConfig,
    user: &User,
    remember_me: bool,
) -> IdentityResult<SignInOutput> {
    let session = AuthSession::new(
        user.user_id,
        remember_me,
        to_chrono(config.session_ttl(remember_me))?,
    );
    session_repo.create(&session).await?;

    tracing::info!(
        user_id = %user.user_id,
        session_id = %session.session_id,
        remember_me,
        "User signed in"
    );

    Ok(SignInOutput {
        session_token: session_token::issue(&config.session_secret, &session.session_id),
        remember_me,
        user_id: user.user_id.to_string(),
        email: user.email.to_string(),
    })
}
