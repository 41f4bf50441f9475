//! Auth Session Entity
//!
//! Server-side sign-in session referenced by the signed session cookie.

use chrono::{DateTime, Duration, Utc};
use kernel::id::{AuthSessionId, UserId};

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: AuthSessionId,
    pub user_id: UserId,
    /// Persistent cookie ("Remember me?") instead of a browser-session one
    pub remember_me: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    /// TTL comes from the application config
    pub fn new(user_id: UserId, remember_me: bool, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            session_id: AuthSessionId::new(),
            user_id,
            remember_me,
            expires_at: now + ttl,
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Sliding expiration: once less than half of `ttl` remains, push the
    /// expiry back out to `now + ttl`. Returns whether it moved.
    pub fn extend_if_needed(&mut self, ttl: Duration) -> bool {
        let now = Utc::now();
        if self.expires_at < now + ttl / 2 {
            self.expires_at = now + ttl;
            true
        } else {
            false
        }
    }
}
