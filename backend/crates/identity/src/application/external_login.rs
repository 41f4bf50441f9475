//! External Login Use Case
//!
//! Signs in with a provider account. Known provider accounts sign in
//! directly; new ones get a new passwordless account. An email that already
//! belongs to a local account is refused, never linked. Unconfirmed accounts
//! get a confirmation email instead of a session.

use std::sync::Arc;

use mailer::EmailSender;

use crate::application::config::{IdentityConfig, to_chrono};
use crate::application::emails;
use crate::application::sign_in::{SignInOutput, ensure_can_sign_in, start_session};
use crate::domain::entity::{external_login::ExternalLogin, user::User, user_token::UserToken};
use crate::domain::repository::{
    AuthSessionRepository, ExternalLoginRepository, UserRepository, UserTokenRepository,
};
use crate::domain::value_object::{email::Email, token_purpose::TokenPurpose};
use crate::error::{IdentityError, IdentityResult};

/// What the provider told us about the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalProfile {
    /// User id at the provider
    pub provider_key: String,
    pub email: Option<String>,
}

/// An OAuth identity provider
#[trait_variant::make(ExternalLoginProvider: Send)]
pub trait LocalExternalLoginProvider {
    /// Provider name stored with linked logins
    fn name(&self) -> &str;

    /// Where to send the browser to start the login
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> IdentityResult<String>;

    /// Exchange the callback `code` and load the profile
    async fn fetch_profile(&self, code: &str, redirect_uri: &str) -> IdentityResult<ExternalProfile>;
}

pub enum ExternalLoginOutcome {
    SignedIn(SignInOutput),
    /// A confirmation email was sent; sign in after confirming
    ConfirmationRequired { email: String },
}

pub struct ExternalLoginUseCase<R, M>
where
    R: UserRepository + UserTokenRepository + AuthSessionRepository + ExternalLoginRepository,
    M: EmailSender,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<IdentityConfig>,
}

impl<R, M> ExternalLoginUseCase<R, M>
where
    R: UserRepository + UserTokenRepository + AuthSessionRepository + ExternalLoginRepository,
    M: EmailSender,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>, config: Arc<IdentityConfig>) -> Self {
        Self {
            repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, provider: &str, profile: ExternalProfile) -> IdentityResult<ExternalLoginOutcome> {
        let repo = self.repo.as_ref();

        let linked = ExternalLoginRepository::find(repo, provider, &profile.provider_key).await?;
        let user = match linked {
            Some(login) => UserRepository::find_by_id(repo, &login.user_id)
                .await?
                .ok_or_else(|| IdentityError::Internal("External login without user".to_string()))?,
            None => self.link(provider, &profile).await?,
        };

        if self.config.require_confirmed_account && !user.email_confirmed {
            self.send_confirmation(&user).await?;
            return Ok(ExternalLoginOutcome::ConfirmationRequired {
                email: user.email.to_string(),
            });
        }
        ensure_can_sign_in(&user, &self.config)?;

        let output = start_session(repo, &self.config, &user, false).await?;
        Ok(ExternalLoginOutcome::SignedIn(output))
    }

    /// Create a passwordless account for a provider account seen for the first time
    async fn link(&self, provider: &str, profile: &ExternalProfile) -> IdentityResult<User> {
        let repo = self.repo.as_ref();
        let email = profile
            .email
            .as_deref()
            .ok_or(IdentityError::ExternalEmailMissing)?;
        let email = Email::new(email)?;

        if let Some(existing) = UserRepository::find_by_email(repo, &email).await? {
            tracing::warn!(
                user_id = %existing.user_id,
                provider,
                "External login email already belongs to an account"
            );
            return Err(IdentityError::DuplicateEmail(email.to_string()));
        }

        let user = User::new(email, None);
        UserRepository::create(repo, &user).await?;
        tracing::info!(user_id = %user.user_id, provider, "User created an account using external login");

        let login = ExternalLogin::new(provider, profile.provider_key.clone(), user.user_id);
        ExternalLoginRepository::create(repo, &login).await?;
        tracing::info!(user_id = %user.user_id, provider, "External login linked");

        Ok(user)
    }

    async fn send_confirmation(&self, user: &User) -> IdentityResult<()> {
        let repo = self.repo.as_ref();

        UserTokenRepository::delete_for_user(repo, &user.user_id, TokenPurpose::EmailConfirmation)
            .await?;
        let (token, code) = UserToken::issue(
            user.user_id,
            TokenPurpose::EmailConfirmation,
            to_chrono(self.config.token_ttl)?,
        );
        UserTokenRepository::create(repo, &token).await?;

        emails::send_confirmation(
            self.mailer.as_ref(),
            &self.config,
            user.email.as_str(),
            &user.user_id,
            &code,
        )
        .await
    }
}
