//! Presentation Layer
//!
//! HTTP handlers, HTML views and routing.

pub mod handlers;
pub mod router;
pub mod views;
