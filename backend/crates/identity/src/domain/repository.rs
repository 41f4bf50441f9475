//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use kernel::id::{AuthSessionId, UserId};

use crate::domain::entity::{
    auth_session::AuthSession, external_login::ExternalLogin, user::User, user_token::UserToken,
};
use crate::domain::value_object::{email::Email, token_purpose::TokenPurpose};
use crate::error::IdentityResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user (normalized email must be unique)
    async fn create(&self, user: &User) -> IdentityResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> IdentityResult<Option<User>>;

    /// Find user by normalized email
    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<User>>;

    async fn update(&self, user: &User) -> IdentityResult<()>;
}

/// One-time token repository trait
#[trait_variant::make(UserTokenRepository: Send)]
pub trait LocalUserTokenRepository {
    async fn create(&self, token: &UserToken) -> IdentityResult<()>;

    /// Find by purpose and SHA-256 of the code
    async fn find_by_hash(
        &self,
        purpose: TokenPurpose,
        token_hash: &[u8],
    ) -> IdentityResult<Option<UserToken>>;

    /// Persist `consumed_at`
    async fn update(&self, token: &UserToken) -> IdentityResult<()>;

    /// Drop every outstanding token of `purpose` for the user
    async fn delete_for_user(&self, user_id: &UserId, purpose: TokenPurpose) -> IdentityResult<u64>;
}

/// Auth session repository trait
#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create(&self, session: &AuthSession) -> IdentityResult<()>;

    /// Find an unexpired session
    async fn find_by_id(&self, session_id: &AuthSessionId) -> IdentityResult<Option<AuthSession>>;

    async fn update(&self, session: &AuthSession) -> IdentityResult<()>;

    async fn delete(&self, session_id: &AuthSessionId) -> IdentityResult<()>;

    async fn delete_all_for_user(&self, user_id: &UserId) -> IdentityResult<u64>;
}

/// External login repository trait
#[trait_variant::make(ExternalLoginRepository: Send)]
pub trait LocalExternalLoginRepository {
    async fn create(&self, login: &ExternalLogin) -> IdentityResult<()>;

    async fn find(&self, provider: &str, provider_key: &str) -> IdentityResult<Option<ExternalLogin>>;
}

/// Everything the HTTP layer needs from one store
pub trait IdentityRepository:
    UserRepository
    + UserTokenRepository
    + AuthSessionRepository
    + ExternalLoginRepository
    + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> IdentityRepository for T where
    T: UserRepository
        + UserTokenRepository
        + AuthSessionRepository
        + ExternalLoginRepository
        + Clone
        + Send
        + Sync
        + 'static
{
}
