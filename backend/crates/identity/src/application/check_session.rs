//! Check Session Use Case
//!
//! Resolves a session cookie into the signed-in user.

use std::sync::Arc;

use kernel::id::{AuthSessionId, UserId};

use crate::application::config::{IdentityConfig, to_chrono};
use crate::application::session_token;
use crate::domain::repository::{AuthSessionRepository, UserRepository};
use crate::error::{IdentityError, IdentityResult};

/// The signed-in user of the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: UserId,
    pub session_id: AuthSessionId,
    pub email: String,
    pub email_confirmed: bool,
}

pub struct CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository + Clone + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<IdentityConfig>,
}

impl<U, S> CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: AuthSessionRepository + Clone + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<IdentityConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(&self, session_token: &str) -> IdentityResult<CurrentUser> {
        let session_id = session_token::parse(&self.config.session_secret, session_token)?;

        let mut session = self
            .session_repo
            .find_by_id(&session_id)
            .await?
            .ok_or(IdentityError::SessionInvalid)?;

        if session.is_expired() {
            self.session_repo.delete(&session_id).await?;
            return Err(IdentityError::SessionInvalid);
        }

        let user = self
            .user_repo
            .find_by_id(&session.user_id)
            .await?
            .ok_or(IdentityError::SessionInvalid)?;

        session.touch();
        session.extend_if_needed(to_chrono(self.config.session_ttl(session.remember_me))?);

        // Update in background
        let repo = self.session_repo.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.update(&session).await {
                tracing::warn!(error = %e, "Failed to update session activity");
            }
        });

        Ok(CurrentUser {
            user_id: user.user_id,
            session_id,
            email: user.email.to_string(),
            email_confirmed: user.email_confirmed,
        })
    }
}
