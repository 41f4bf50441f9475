//! Register Use Case
//!
//! Creates an unconfirmed local account and emails a confirmation link.

use std::sync::Arc;

use mailer::EmailSender;
use platform::password::ClearTextPassword;

use crate::application::config::{IdentityConfig, to_chrono};
use crate::application::emails;
use crate::domain::entity::{user::User, user_token::UserToken};
use crate::domain::repository::{UserRepository, UserTokenRepository};
use crate::domain::value_object::{email::Email, token_purpose::TokenPurpose};
use crate::error::{IdentityError, IdentityResult};

pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub struct RegisterOutput {
    pub user_id: String,
    /// Always true while confirmed accounts are required
    pub requires_confirmation: bool,
}

pub struct RegisterUseCase<U, T, M>
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

impl<U, T, M> RegisterUseCase<U, T, M>
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

    pub async fn execute(&self, input: RegisterInput) -> IdentityResult<RegisterOutput> {
        let email = Email::new(input.email)?;

        if input.password != input.confirm_password {
            return Err(IdentityError::PasswordMismatch);
        }
        let password = ClearTextPassword::new(input.password, &self.config.password_policy)?;

        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::DuplicateEmail(email.to_string()));
        }

        let password_hash = password
            .hash()
            .map_err(|e| IdentityError::Internal(e.to_string()))?;
        let user = User::new(email, Some(password_hash));
        self.user_repo.create(&user).await?;

        tracing::info!(user_id = %user.user_id, "User created a new account with password");

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

        Ok(RegisterOutput {
            user_id: user.user_id.to_string(),
            requires_confirmation: self.config.require_confirmed_account,
        })
    }
}
