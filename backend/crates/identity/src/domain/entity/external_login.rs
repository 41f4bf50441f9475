//! External Login Entity
//!
//! Links a provider account (e.g. a Facebook user id) to a local user.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLogin {
    /// Provider name, e.g. `Facebook`
    pub provider: String,
    /// User id at the provider
    pub provider_key: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl ExternalLogin {
    pub fn new(provider: impl Into<String>, provider_key: impl Into<String>, user_id: UserId) -> Self {
        Self {
            provider: provider.into(),
            provider_key: provider_key.into(),
            user_id,
            created_at: Utc::now(),
        }
    }
}
