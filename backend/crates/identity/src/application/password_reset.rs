//! Forgot / Reset Password Use Cases
//!
//! Neither step reveals whether an account exists.

use std::sync::Arc;

use mailer::EmailSender;
use platform::password::ClearTextPassword;

use crate::application::config::{IdentityConfig, to_chrono};
use crate::application::emails;
use crate::domain::entity::user_token::{UserToken, hash_code};
use crate::domain::repository::{AuthSessionRepository, UserRepository, UserTokenRepository};
use crate::domain::value_object::{email::Email, token_purpose::TokenPurpose};
use crate::error::{IdentityError, IdentityResult};

pub struct ForgotPasswordUseCase<U, T, M>
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

impl<U, T, M> ForgotPasswordUseCase<U, T, M>
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

    /// Email a reset link to confirmed accounts; do nothing for anyone else
    pub async fn execute(&self, email: &str) -> IdentityResult<()> {
        let email = Email::new(email)?;

        let user = match self.user_repo.find_by_email(&email).await? {
            Some(user) if user.email_confirmed => user,
            _ => {
                tracing::debug!("Password reset requested for unknown or unconfirmed account");
                return Ok(());
            }
        };

        let (token, code) = UserToken::issue(
            user.user_id,
            TokenPurpose::PasswordReset,
            to_chrono(self.config.token_ttl)?,
        );
        self.token_repo.create(&token).await?;

        emails::send_password_reset(self.mailer.as_ref(), &self.config, user.email.as_str(), &code)
            .await?;

        tracing::info!(user_id = %user.user_id, "Password reset email sent");
        Ok(())
    }
}

pub struct ResetPasswordInput {
    pub email: String,
    pub code: String,
    pub password: String,
    pub confirm_password: String,
}

pub struct ResetPasswordUseCase<U, T, S>
where
    U: UserRepository,
    T: UserTokenRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    token_repo: Arc<T>,
    session_repo: Arc<S>,
    config: Arc<IdentityConfig>,
}

impl<U, T, S> ResetPasswordUseCase<U, T, S>
where
    U: UserRepository,
    T: UserTokenRepository,
    S: AuthSessionRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        token_repo: Arc<T>,
        session_repo: Arc<S>,
        config: Arc<IdentityConfig>,
    ) -> Self {
        Self {
            user_repo,
            token_repo,
            session_repo,
            config,
        }
    }

    /// Set a new password. Unknown emails succeed without doing anything.
    pub async fn execute(&self, input: ResetPasswordInput) -> IdentityResult<()> {
        let email = Email::new(input.email)?;

        if input.password != input.confirm_password {
            return Err(IdentityError::PasswordMismatch);
        }
        let password = ClearTextPassword::new(input.password, &self.config.password_policy)?;

        let Some(mut user) = self.user_repo.find_by_email(&email).await? else {
            tracing::debug!("Password reset for unknown email");
            return Ok(());
        };

        let mut token = self
            .token_repo
            .find_by_hash(TokenPurpose::PasswordReset, &hash_code(&input.code))
            .await?
            .filter(|t| {
                t.matches(&input.code) && t.is_usable_for(&user.user_id, TokenPurpose::PasswordReset)
            })
            .ok_or(IdentityError::InvalidToken)?;

        let password_hash = password
            .hash()
            .map_err(|e| IdentityError::Internal(e.to_string()))?;
        user.set_password(password_hash);
        self.user_repo.update(&user).await?;

        token.consume();
        self.token_repo.update(&token).await?;

        // Old cookies belong to the previous credentials
        let revoked = self.session_repo.delete_all_for_user(&user.user_id).await?;

        tracing::info!(
            user_id = %user.user_id,
            sessions_revoked = revoked,
            "Password reset"
        );
        Ok(())
    }
}
