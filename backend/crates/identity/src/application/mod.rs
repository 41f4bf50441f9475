//! Application Layer
//!
//! Use cases and application services.

pub mod check_session;
pub mod config;
pub mod confirm_email;
pub mod emails;
pub mod external_login;
pub mod password_reset;
pub mod register;
pub mod session_token;
pub mod sign_in;
pub mod sign_out;

// Re-exports
pub use check_session::{CheckSessionUseCase, CurrentUser};
pub use config::IdentityConfig;
pub use confirm_email::{ConfirmEmailUseCase, ResendConfirmationUseCase};
pub use external_login::{
    ExternalLoginOutcome, ExternalLoginProvider, ExternalLoginUseCase, ExternalProfile,
};
pub use password_reset::{ForgotPasswordUseCase, ResetPasswordInput, ResetPasswordUseCase};
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
