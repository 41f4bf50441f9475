//! Shared Kernel
//!
//! Vocabulary every crate in the workspace agrees on:
//! - The unified error type ([`error::app_error::AppError`]) and its kinds
//! - Conversions from library errors into it
//! - Typed identifiers
//!
//! Only things whose meaning is the same across the home pages, the mailer
//! and the identity flows belong here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
