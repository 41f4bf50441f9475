//! Confirm Email Use Case
//!
//! Redeems the code from the confirmation email and marks the account
//! confirmed. Also re-sends confirmation emails on request.

use std::sync::Arc;

use kernel::id::UserId;
use mailer::EmailSender;

use crate::application::config::{IdentityConfig, to_chrono};
use crate::application::emails;
use crate::domain::entity::user_token::{UserToken, hash_code};
use crate::domain::repository::{UserRepository, UserTokenRepository};
use crate::domain::value_object::{email::Email, token_purpose::TokenPurpose};
use crate::error::{IdentityError, IdentityResult};

pub struct ConfirmEmailUseCase<U, T>
where
    U: UserRepository,
    T: UserTokenRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
}

impl<U, T> ConfirmEmailUseCase<U, T>
where
    U: UserRepository,
    T: UserTokenRepository,
{
    pub fn new(user_repo: Arc<U>, token_repo: Arc<T>) -> Self {
        Self {
            user_repo,
            token_repo,
        }
    }

    pub async fn execute(&self, user_id: &str, code: &str) -> IdentityResult<()> {
        let user_id: UserId = user_id.parse().map_err(|_| IdentityError::InvalidToken)?;

        let mut user = self
            .user_repo
            .find_by_id(&user_id)
            .await?
            .ok_or(IdentityError::InvalidToken)?;

        let mut token = self
            .token_repo
            .find_by_hash(TokenPurpose::EmailConfirmation, &hash_code(code))
            .await?
            .filter(|t| t.matches(code) && t.is_usable_for(&user_id, TokenPurpose::EmailConfirmation))
            .ok_or(IdentityError::InvalidToken)?;

        token.consume();
        self.token_repo.update(&token).await?;

        if !user.email_confirmed {
            user.confirm_email();
            self.user_repo.update(&user).await?;
        }

        tracing::info!(user_id = %user.user_id, "Email confirmed");
        Ok(())
    }
}

pub struct ResendConfirmationUseCase<U, T, M>
where
    U: UserRepository,
    T: UserTokenRepository,
    M: EmailSender,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    mailer: Arc<M>,
    config: Arc<IdentityConfig>,
}

impl<U, T, M> ResendConfirmationUseCase<U, T, M>
where
    U: UserRepository,
    T: UserTokenRepository,
    M: EmailSender,
{
    pub fn new(user_repo: Arc<U>, token_repo: Arc<T>, mailer: Arc<M>, config: Arc<IdentityConfig>) -> Self {
        Self {
            user_repo,
            token_repo,
            mailer,
            config,
        }
    }

    /// Unknown and already confirmed addresses are ignored silently
    pub async fn execute(&self, email: &str) -> IdentityResult<()> {
        let email = Email::new(email)?;

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            tracing::debug!("Confirmation resend for unknown email");
            return Ok(());
        };
        if user.email_confirmed {
            return Ok(());
        }

        self.token_repo
            .delete_for_user(&user.user_id, TokenPurpose::EmailConfirmation)
            .await?;

        let (token, code) = UserToken::issue(
            user.user_id,
            TokenPurpose::EmailConfirmation,
            to_chrono(self.config.token_ttl)?,
        );
        self.token_repo.create(&token).await?;

        emails::send_confirmation(
            self.mailer.as_ref(),
            &self.config,
            user.email.as_str(),
            &user.user_id,
            &code,
        )
        .await?;

        tracing::info!(user_id = %user.user_id, "Confirmation email re-sent");
        Ok(())
    }
}
