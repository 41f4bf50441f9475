//! User Token Entity
//!
//! One-time codes for email confirmation and password reset. Only the
//! SHA-256 of the code is stored; the code itself goes out by email.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{UserId, UserTokenId};
use platform::crypto::{constant_time_eq, random_token, sha256};

use crate::domain::value_object::token_purpose::TokenPurpose;

/// Random bytes behind each code
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone)]
pub struct UserToken {
    pub token_id: UserTokenId,
    pub user_id: UserId,
    pub purpose: TokenPurpose,
    pub token_hash: Vec<u8>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserToken {
    /// Create a token and return it with the clear code to send
    pub fn issue(user_id: UserId, purpose: TokenPurpose, ttl: Duration) -> (Self, String) {
        let code = random_token(TOKEN_BYTES);
        let now = Utc::now();

        let token = Self {
            token_id: UserTokenId::new(),
            user_id,
            purpose,
            token_hash: hash_code(&code).to_vec(),
            expires_at: now + ttl,
            consumed_at: None,
            created_at: now,
        };

        (token, code)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Usable for `user_id` and `purpose` right now
    pub fn is_usable_for(&self, user_id: &UserId, purpose: TokenPurpose) -> bool {
        self.user_id == *user_id
            && self.purpose == purpose
            && self.consumed_at.is_none()
            && !self.is_expired()
    }

    pub fn matches(&self, code: &str) -> bool {
        constant_time_eq(&self.token_hash, &hash_code(code))
    }

    pub fn consume(&mut self) {
        self.consumed_at = Some(Utc::now());
    }
}

/// Lookup hash of a clear code
pub fn hash_code(code: &str) -> [u8; 32] {
    sha256(code.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_match() {
        let user_id = UserId::new();
        let (token, code) = UserToken::issue(user_id, TokenPurpose::EmailConfirmation, Duration::hours(24));

        assert!(token.matches(&code));
        assert!(!token.matches("other"));
        assert!(token.is_usable_for(&user_id, TokenPurpose::EmailConfirmation));
        assert!(!token.is_usable_for(&user_id, TokenPurpose::PasswordReset));
        assert!(!token.is_usable_for(&UserId::new(), TokenPurpose::EmailConfirmation));
    }

    #[test]
    fn test_consumed_token_is_not_usable() {
        let user_id = UserId::new();
        let (mut token, _) = UserToken::issue(user_id, TokenPurpose::PasswordReset, Duration::hours(24));
        token.consume();
        assert!(!token.is_usable_for(&user_id, TokenPurpose::PasswordReset));
    }

    #[test]
    fn test_expired_token_is_not_usable() {
        let user_id = UserId::new();
        let (token, _) = UserToken::issue(user_id, TokenPurpose::PasswordReset, Duration::seconds(-1));
        assert!(token.is_expired());
        assert!(!token.is_usable_for(&user_id, TokenPurpose::PasswordReset));
    }

    #[test]
    fn test_codes_are_url_safe() {
        let (_, code) = UserToken::issue(UserId::new(), TokenPurpose::EmailConfirmation, Duration::hours(1));
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
