//! User Entity
//!
//! An account identified by email. Local accounts carry a password hash;
//! accounts created through an external login may not.

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use platform::password::HashedPassword;

use crate::domain::value_object::email::Email;

#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub email: Email,
    /// Set once the owner followed the confirmation link
    pub email_confirmed: bool,
    pub password_hash: Option<HashedPassword>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New unconfirmed account
    pub fn new(email: Email, password_hash: Option<HashedPassword>) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email,
            email_confirmed: false,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn normalized_email(&self) -> String {
        self.email.normalized()
    }

    /// Accounts must be confirmed before they may sign in
    pub fn can_sign_in(&self) -> bool {
        self.email_confirmed
    }

    pub fn confirm_email(&mut self) {
        self.email_confirmed = true;
        self.updated_at = Utc::now();
    }

    /// Replace the password. Callers revoke existing sessions.
    pub fn set_password(&mut self, password_hash: HashedPassword) {
        self.password_hash = Some(password_hash);
        self.updated_at = Utc::now();
    }
}
