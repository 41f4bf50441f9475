//! Password Policy, Hashing and Verification
//!
//! - Policy: length, character classes and distinct characters, checked
//!   together so every violation is reported at once
//! - Hashing: Argon2id in PHC string format
//! - Clear text is NFKC-normalized and zeroized on drop

use std::fmt;

use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Upper bound so hashing cost stays bounded
pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Policy
// ============================================================================

/// Password requirements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub required_length: usize,
    pub required_unique_chars: usize,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
    pub require_non_alphanumeric: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            required_length: 6,
            required_unique_chars: 1,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
            require_non_alphanumeric: true,
        }
    }
}

/// One unmet requirement
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordViolation {
    #[error("Passwords must be at least {min} characters.")]
    TooShort { min: usize },

    #[error("Passwords must be at most {max} characters.")]
    TooLong { max: usize },

    #[error("Passwords must have at least one digit ('0'-'9').")]
    MissingDigit,

    #[error("Passwords must have at least one lowercase ('a'-'z').")]
    MissingLowercase,

    #[error("Passwords must have at least one uppercase ('A'-'Z').")]
    MissingUppercase,

    #[error("Passwords must have at least one non alphanumeric character.")]
    MissingNonAlphanumeric,

    #[error("Passwords must use at least {min} different characters.")]
    TooFewUniqueChars { min: usize },
}

/// All violations of a rejected password, in policy order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicyError(pub Vec<PasswordViolation>);

impl fmt::Display for PasswordPolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl std::error::Error for PasswordPolicyError {}

impl PasswordPolicy {
    /// Check `password` against every rule
    pub fn validate(&self, password: &str) -> Result<(), PasswordPolicyError> {
        let mut violations = Vec::new();
        let char_count = password.chars().count();

        if char_count < self.required_length {
            violations.push(PasswordViolation::TooShort {
                min: self.required_length,
            });
        }
        if char_count > MAX_PASSWORD_LENGTH {
            violations.push(PasswordViolation::TooLong {
                max: MAX_PASSWORD_LENGTH,
            });
        }
        if self.require_non_alphanumeric && password.chars().all(|c| c.is_ascii_alphanumeric()) {
            violations.push(PasswordViolation::MissingNonAlphanumeric);
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            violations.push(PasswordViolation::MissingDigit);
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            violations.push(PasswordViolation::MissingLowercase);
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            violations.push(PasswordViolation::MissingUppercase);
        }

        let mut distinct: Vec<char> = password.chars().collect();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < self.required_unique_chars {
            violations.push(PasswordViolation::TooFewUniqueChars {
                min: self.required_unique_chars,
            });
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(PasswordPolicyError(violations))
        }
    }
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password, zeroized when dropped. Not `Clone`; `Debug` is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Normalize and validate against `policy` (used when a password is chosen)
    pub fn new(raw: String, policy: &PasswordPolicy) -> Result<Self, PasswordPolicyError> {
        let password = Self::normalized(raw);
        policy.validate(&password.0)?;
        Ok(password)
    }

    /// Normalize without policy checks (used when a password is presented for sign-in)
    pub fn normalized(raw: String) -> Self {
        let mut raw = raw;
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash with Argon2id and a random salt
    pub fn hash(&self) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(self.as_bytes(), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id hash in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Parse a stored PHC string
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Constant-time verification (inside argon2)
    pub fn verify(&self, password: &ClearTextPassword) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
