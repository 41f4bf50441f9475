//! Identity Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - PostgreSQL store and the Facebook provider
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Local accounts with email + password
//! - Confirmed accounts: sign-in is refused until the emailed link is followed
//! - Password reset by email
//! - Facebook login linked to local accounts by email
//! - Server-side sessions with signed cookie tokens
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Confirmation and reset codes stored as SHA-256 hashes, single use
//! - Session cookie is `HttpOnly`, HMAC-signed and revoked on password reset

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::IdentityConfig;
pub use application::CurrentUser;
pub use error::{IdentityError, IdentityResult};
pub use infra::{FacebookOptions, FacebookProvider, PgIdentityRepository};
pub use presentation::handlers::IdentityState;
pub use presentation::router::{PgIdentityState, identity_router, identity_router_generic};

pub mod middleware {
    pub use crate::presentation::middleware::*;
}

#[cfg(test)]
mod testing;
