//! Identity Error Types
//!
//! Identity-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use mailer::MailError;
use platform::password::PasswordPolicyError;
use thiserror::Error;

pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Email failed validation
    #[error("{0}")]
    InvalidEmail(String),

    /// Another account already uses this email
    #[error("Email '{0}' is already taken.")]
    DuplicateEmail(String),

    /// Password does not meet the policy
    #[error("{0}")]
    PasswordPolicy(#[from] PasswordPolicyError),

    #[error("The password and confirmation password do not match.")]
    PasswordMismatch,

    /// Unknown email or wrong password
    #[error("Invalid login attempt.")]
    InvalidCredentials,

    /// Credentials are valid but the account may not sign in yet
    #[error("Sign-in is not allowed until the email address is confirmed.")]
    NotAllowed,

    /// Confirmation or reset code is unknown, expired or used
    #[error("Invalid token.")]
    InvalidToken,

    /// A reset link arrived without its code
    #[error("A code must be supplied for password reset.")]
    ResetCodeMissing,

    /// Session cookie missing, forged or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// No external provider is configured
    #[error("External login provider '{0}' is not configured")]
    ExternalLoginUnavailable(String),

    /// The OAuth state did not round-trip
    #[error("External login state mismatch")]
    ExternalStateMismatch,

    /// Provider refused the code or returned something unusable
    #[error("External login failed: {0}")]
    ExternalLoginFailed(String),

    /// Provider did not share an email address
    #[error("The external login provider did not supply an email address.")]
    ExternalEmailMissing,

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IdentityError::InvalidEmail(_)
            | IdentityError::PasswordPolicy(_)
            | IdentityError::PasswordMismatch
            | IdentityError::InvalidToken
            | IdentityError::ResetCodeMissing
            | IdentityError::ExternalStateMismatch
            | IdentityError::ExternalEmailMissing => ErrorKind::BadRequest,
            IdentityError::DuplicateEmail(_) => ErrorKind::Conflict,
            IdentityError::InvalidCredentials | IdentityError::SessionInvalid => {
                ErrorKind::Unauthorized
            }
            IdentityError::NotAllowed => ErrorKind::Forbidden,
            IdentityError::ExternalLoginUnavailable(_) => ErrorKind::ServiceUnavailable,
            IdentityError::ExternalLoginFailed(_) => ErrorKind::BadGateway,
            IdentityError::Mail(e) => e.kind(),
            IdentityError::Database(_) | IdentityError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Convert to AppError, keeping library errors as the source
    pub fn into_app_error(self) -> AppError {
        match self {
            IdentityError::Mail(e) => e.to_app_error(),
            IdentityError::Database(e) => AppError::from(e),
            IdentityError::NotAllowed => AppError::new(self.kind(), self.to_string())
                .with_action("Confirm your account using the link sent by email"),
            IdentityError::Internal(_) => AppError::internal("Internal error").with_source(self),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            IdentityError::Database(e) => {
                tracing::error!(error = %e, "Identity database error");
            }
            IdentityError::Internal(msg) => {
                tracing::error!(message = %msg, "Identity internal error");
            }
            IdentityError::Mail(e) => {
                tracing::error!(error = %e, "Identity email delivery failed");
            }
            IdentityError::ExternalLoginFailed(msg) => {
                tracing::warn!(message = %msg, "External login failed");
            }
            IdentityError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            IdentityError::ExternalStateMismatch => {
                tracing::warn!("External login state mismatch");
            }
            _ => {
                tracing::debug!(error = %self, "Identity error");
            }
        }
    }
}

impl IntoResponse for IdentityError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

impl From<AppError> for IdentityError {
    fn from(err: AppError) -> Self {
        IdentityError::Internal(err.to_string())
    }
}
