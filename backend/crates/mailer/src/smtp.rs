//! SMTP delivery with lettre

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::config::EmailSenderConfig;
use crate::error::{MailError, MailResult};
use crate::EmailSender;

/// [`EmailSender`] backed by an SMTP relay
#[derive(Debug, Clone)]
pub struct SmtpEmailSender {
    config: EmailSenderConfig,
}

impl SmtpEmailSender {
    /// Store the settings. Nothing is checked or contacted here.
    pub fn new(config: EmailSenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmailSenderConfig {
        &self.config
    }

    fn build_message(&self, email: &str, subject: &str, html_message: &str) -> MailResult<Message> {
        let from = parse_mailbox(&self.config.sender_email)?;
        let to = parse_mailbox(email)?;

        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_message.to_string())?)
    }

    /// A fresh transport per message; the relay session ends with the send.
    ///
    /// A blank user name means the relay needs no authentication.
    fn transport(&self) -> MailResult<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = if self.config.enable_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
        }
        .port(self.config.port);

        if !self.config.user_name.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.user_name.clone(),
                self.config.password.clone(),
            ));
        }

        Ok(builder.build())
    }
}

impl EmailSender for SmtpEmailSender {
    async fn send_email(&self, email: &str, subject: &str, html_message: &str) -> MailResult<()> {
        let message = self.build_message(email, subject, html_message)?;
        let transport = self.transport()?;

        match transport.send(message).await {
            Ok(_) => {
                tracing::info!(recipient = %email, subject = %subject, "Email sent");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    recipient = %email,
                    host = %self.config.host,
                    port = self.config.port,
                    error = %e,
                    "Email delivery failed"
                );
                Err(MailError::Transport(e))
            }
        }
    }
}

fn parse_mailbox(address: &str) -> MailResult<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|source| MailError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender() -> SmtpEmailSender {
        SmtpEmailSender::new(EmailSenderConfig::new(
            "localhost",
            2525,
            false,
            "mailer",
            "secret",
            "noreply@example.com",
        ))
    }

    #[test]
    fn test_new_accepts_blank_settings() {
        let sender = SmtpEmailSender::new(EmailSenderConfig::default());
        assert!(sender.config().host.is_empty());
        assert_eq!(sender.config().port, 0);
    }

    #[test]
    fn test_message_is_html() {
        let message = sender()
            .build_message("user@example.com", "Confirm your email", "<b>hi</b>")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("Subject: Confirm your email"));
        assert!(raw.contains("From: noreply@example.com"));
        assert!(raw.contains("To: user@example.com"));
        assert!(raw.contains("<b>hi</b>"));
    }

    #[test]
    fn test_invalid_recipient() {
        let err = sender()
            .build_message("not an address", "s", "b")
            .unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress { ref address, .. } if address == "not an address"));
    }

    #[test]
    fn test_blank_sender_is_invalid() {
        let sender = SmtpEmailSender::new(EmailSenderConfig::default());
        let err = sender
            .build_message("user@example.com", "s", "b")
            .unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress { .. }));
    }
}
