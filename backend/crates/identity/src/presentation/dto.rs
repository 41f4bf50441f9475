//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

// ============================================================================
// Register
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
    /// The account must be confirmed from the emailed link before sign-in
    pub requires_confirmation: bool,
}

// ============================================================================
// Email Confirmation
// ============================================================================

/// Query of the emailed confirmation link
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmEmailQuery {
    pub user_id: String,
    pub code: String,
}

/// Resend confirmation / forgot password request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// "Remember me?"
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: String,
    pub email: String,
}

// ============================================================================
// Password Reset
// ============================================================================

/// Query of the link in the reset email
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPasswordQuery {
    pub code: Option<String>,
}

/// What the reset form needs: the code to post back
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordForm {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub password: String,
    pub confirm_password: String,
}

// ============================================================================
// External Login
// ============================================================================

/// Query the provider sends back to the callback
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set when the user declined or the provider failed
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLoginResponse {
    pub requires_confirmation: bool,
    pub email: String,
}

// ============================================================================
// Manage
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManageResponse {
    pub user_id: String,
    pub email: String,
    pub email_confirmed: bool,
}
