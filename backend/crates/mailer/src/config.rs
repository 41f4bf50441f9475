//! SMTP relay settings

use std::fmt;

use serde::Deserialize;

/// Relay connection settings, taken as-is from the `EmailSender` section
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EmailSenderConfig {
    pub host: String,
    pub port: u16,
    /// Negotiate STARTTLS before authenticating
    #[serde(rename = "EnableSSL")]
    pub enable_ssl: bool,
    pub user_name: String,
    pub password: String,
    pub sender_email: String,
}

impl EmailSenderConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        enable_ssl: bool,
        user_name: impl Into<String>,
        password: impl Into<String>,
        sender_email: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            enable_ssl,
            user_name: user_name.into(),
            password: password.into(),
            sender_email: sender_email.into(),
        }
    }
}

impl fmt::Debug for EmailSenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSenderConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("enable_ssl", &self.enable_ssl)
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .field("sender_email", &self.sender_email)
            .finish()
    }
}
