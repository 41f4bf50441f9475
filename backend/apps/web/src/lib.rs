//! Web Application
//!
//! Settings, request pipeline and endpoint composition for the site.
//! `main.rs` wires these to PostgreSQL, SMTP and the listener.

pub mod config;
pub mod pipeline;

pub use config::{AppEnvironment, AppSettings, ConfigError};
pub use pipeline::{PipelineOptions, build_app, endpoints};

#[cfg(test)]
mod tests;
