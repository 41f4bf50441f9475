//! Mail Error Types
//!
//! Integrates with the unified `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

pub type MailResult<T> = Result<T, MailError>;

#[derive(Debug, Error)]
pub enum MailError {
    /// Sender or recipient is not a valid mailbox
    #[error("Invalid email address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// Message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    /// Connecting, authenticating or the relay refusing the message
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

impl MailError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MailError::InvalidAddress { .. } => ErrorKind::BadRequest,
            MailError::Build(_) => ErrorKind::InternalServerError,
            MailError::Transport(_) => ErrorKind::ServiceUnavailable,
        }
    }

    pub fn to_app_error(&self) -> AppError {
        let err = match self {
            MailError::InvalidAddress { address, .. } => {
                AppError::bad_request(format!("Invalid email address: {}", address))
            }
            MailError::Build(_) => AppError::internal("Failed to build email"),
            MailError::Transport(_) => AppError::service_unavailable("Email could not be delivered")
                .with_action("Try again later"),
        };
        err.with_source(SourceText(self.to_string()))
    }

    fn log(&self) {
        match self {
            MailError::Transport(e) => {
                tracing::error!(error = %e, "SMTP transport error");
            }
            MailError::Build(e) => {
                tracing::error!(error = %e, "Email build error");
            }
            MailError::InvalidAddress { address, .. } => {
                tracing::debug!(address = %address, "Invalid email address");
            }
        }
    }
}

impl IntoResponse for MailError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

/// Owned rendering of a `MailError`, so the app error can carry it as source
#[derive(Debug)]
struct SourceText(String);

impl std::fmt::Display for SourceText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SourceText {}

#[cfg(test)]
mod tests {
    use super::*;
    use lettre::Address;

    fn invalid_address() -> MailError {
        let source = "not-an-address".parse::<Address>().unwrap_err();
        MailError::InvalidAddress {
            address: "not-an-address".to_string(),
            source,
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(invalid_address().kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_app_error_keeps_detail_as_source() {
        let app_err = invalid_address().to_app_error();
        assert_eq!(app_err.status_code(), 400);
        let report = app_err.report();
        assert_eq!(report.sources.len(), 1);
        assert!(report.sources[0].contains("not-an-address"));
    }

    #[test]
    fn test_into_response_status() {
        let response = invalid_address().into_response();
        assert_eq!(response.status(), 400);
    }
}
