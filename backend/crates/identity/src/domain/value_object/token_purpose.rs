//! What a one-time user token may be used for

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenPurpose {
    EmailConfirmation,
    PasswordReset,
}

impl TokenPurpose {
    /// Database code
    pub fn id(&self) -> i16 {
        match self {
            TokenPurpose::EmailConfirmation => 1,
            TokenPurpose::PasswordReset => 2,
        }
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TokenPurpose::EmailConfirmation),
            2 => Some(TokenPurpose::PasswordReset),
            _ => None,
        }
    }
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPurpose::EmailConfirmation => write!(f, "EmailConfirmation"),
            TokenPurpose::PasswordReset => write!(f, "PasswordReset"),
        }
    }
}
