//! Domain Layer
//!
//! Entities, value objects and repository traits.

pub mod entity;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{
    auth_session::AuthSession, external_login::ExternalLogin, user::User, user_token::UserToken,
};
pub use repository::{
    AuthSessionRepository, ExternalLoginRepository, IdentityRepository, UserRepository,
    UserTokenRepository,
};
