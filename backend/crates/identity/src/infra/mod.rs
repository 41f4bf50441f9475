//! Infrastructure Layer

pub mod facebook;
pub mod postgres;

pub use facebook::{FacebookOptions, FacebookProvider};
pub use postgres::PgIdentityRepository;
