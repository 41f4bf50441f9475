//! Application Configuration
//!
//! Configuration for the Identity application layer.

use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::crypto::random_bytes;
use platform::password::PasswordPolicy;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

use crate::error::{IdentityError, IdentityResult};

/// Identity application configuration
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Cookie carrying the OAuth `state` between challenge and callback
    pub external_cookie_name: String,
    /// Session secret key for HMAC signing (32 bytes)
    pub session_secret: [u8; 32],
    /// Session TTL without "Remember me?" (12 hours)
    pub session_ttl_short: Duration,
    /// Session TTL with "Remember me?" (14 days)
    pub session_ttl_long: Duration,
    /// Lifetime of confirmation and reset codes (1 day)
    pub token_ttl: Duration,
    /// Lifetime of the external login state cookie (15 minutes)
    pub external_state_ttl: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Sign-in requires a confirmed email address
    pub require_confirmed_account: bool,
    pub password_policy: PasswordPolicy,
    /// Origin used to build links in emails, without trailing slash
    pub public_base_url: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "Identity.Application".to_string(),
            external_cookie_name: "Identity.External".to_string(),
            session_secret: [0u8; 32],
            session_ttl_short: Duration::from_secs(12 * 3600),
            session_ttl_long: Duration::from_secs(14 * 24 * 3600),
            token_ttl: Duration::from_secs(24 * 3600),
            external_state_ttl: Duration::from_secs(15 * 60),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            require_confirmed_account: true,
            password_policy: PasswordPolicy::default(),
            public_base_url: "https://localhost:5001".to_string(),
        }
    }
}

impl IdentityConfig {
    /// Create config with a random session secret (for development)
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&random_bytes(32));
        Self {
            session_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Session lifetime for the chosen cookie persistence
    pub fn session_ttl(&self, remember_me: bool) -> Duration {
        if remember_me {
            self.session_ttl_long
        } else {
            self.session_ttl_short
        }
    }

    pub fn session_cookie(&self) -> CookieConfig {
        CookieConfig::new(&self.session_cookie_name)
            .secure(self.cookie_secure)
            .same_site(self.cookie_same_site)
    }

    pub fn external_cookie(&self) -> CookieConfig {
        CookieConfig::new(&self.external_cookie_name)
            .secure(self.cookie_secure)
            .same_site(self.cookie_same_site)
    }

    /// Absolute URL for `path_and_query` under the public origin
    pub fn absolute_url(&self, path_and_query: &str) -> String {
        format!(
            "{}{}",
            self.public_base_url.trim_end_matches('/'),
            path_and_query
        )
    }
}

/// `std` duration as a `chrono` one for entity timestamps
pub fn to_chrono(duration: Duration) -> IdentityResult<chrono::Duration> {
    chrono::Duration::from_std(duration)
        .map_err(|e| IdentityError::Internal(format!("Invalid duration: {e}")))
}
