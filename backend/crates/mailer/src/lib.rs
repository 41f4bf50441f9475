//! Mailer Crate
//!
//! Outbound email for the account flows (confirmation, password reset).
//!
//! - [`EmailSender`]: the seam the identity use cases depend on
//! - [`SmtpEmailSender`]: delivers through an SMTP relay with `lettre`,
//!   one connection and one attempt per message
//!
//! Configuration is fixed at construction and never validated there; bad
//! hosts, ports or credentials surface as [`MailError`]s from `send_email`.

pub mod config;
pub mod error;
pub mod smtp;

pub use config::EmailSenderConfig;
pub use error::{MailError, MailResult};
pub use smtp::SmtpEmailSender;

/// Sends an HTML email to a single recipient
#[trait_variant::make(EmailSender: Send)]
pub trait LocalEmailSender {
    /// Deliver `html_message` to `email`. Completes once the relay accepted
    /// the message.
    async fn send_email(&self, email: &str, subject: &str, html_message: &str) -> MailResult<()>;
}

#[cfg(test)]
mod tests;
