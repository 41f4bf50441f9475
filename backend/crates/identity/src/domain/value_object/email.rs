//! Email Value Object
//!
//! A syntactically plausible address. Ownership is proven separately by the
//! confirmation email.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{IdentityError, IdentityResult};

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Email address as entered (trimmed), compared through [`Email::normalized`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> IdentityResult<Self> {
        let email = email.into().trim().to_string();

        if email.is_empty() {
            return Err(IdentityError::InvalidEmail(
                "The Email field is required.".to_string(),
            ));
        }

        if email.len() > EMAIL_MAX_LENGTH {
            return Err(IdentityError::InvalidEmail(format!(
                "Email must be at most {} characters.",
                EMAIL_MAX_LENGTH
            )));
        }

        if !Self::is_valid_format(&email) {
            return Err(IdentityError::InvalidEmail(
                "The Email field is not a valid e-mail address.".to_string(),
            ));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > 64 || local.chars().any(char::is_whitespace) {
            return false;
        }

        if domain.is_empty() || !domain.contains('.') || domain.contains('@') {
            return false;
        }

        if !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return false;
        }

        !(domain.starts_with(['.', '-']) || domain.ends_with(['.', '-']))
    }

    /// Stored value, assumed valid
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lookup key: lowercase
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl FromStr for Email {
    type Err = IdentityError;

    fn from_str(s: &str) -> IdentityResult<Self> {
        Email::new(s)
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("user@example.com").is_ok());
        assert!(Email::new("user.name@example.co.jp").is_ok());
        assert!(Email::new("user+tag@example.com").is_ok());
        assert!(Email::new("  padded@example.com ").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        assert!(Email::new("").is_err());
        assert!(Email::new("userexample.com").is_err());
        assert!(Email::new("user@").is_err());
        assert!(Email::new("@example.com").is_err());
        assert!(Email::new("user@@example.com").is_err());
        assert!(Email::new("user@example").is_err());
        assert!(Email::new("us er@example.com").is_err());
        assert!(Email::new("user@-example.com").is_err());
    }

    #[test]
    fn test_case_is_kept_but_normalized_for_lookup() {
        let email = Email::new("User@Example.COM").unwrap();
        assert_eq!(email.as_str(), "User@Example.COM");
        assert_eq!(email.normalized(), "user@example.com");
    }
}
