//! Sign Out Use Case
//!
//! Invalidates a user session.

use std::sync::Arc;

use crate::application::config::IdentityConfig;
use crate::application::session_token;
use crate::domain::repository::AuthSessionRepository;
use crate::error::IdentityResult;

pub struct SignOutUseCase<S>
where
    S: AuthSessionRepository,
{
    session_repo: Arc<S>,
    config: Arc<IdentityConfig>,
}

impl<S> SignOutUseCase<S>
where
    S: AuthSessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<IdentityConfig>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    /// Sign out from current session
    pub async fn execute(&self, session_token: &str) -> IdentityResult<()> {
        let session_id = session_token::parse(&self.config.session_secret, session_token)?;
        self.session_repo.delete(&session_id).await?;

        tracing::info!(session_id = %session_id, "User signed out");
        Ok(())
    }
}
