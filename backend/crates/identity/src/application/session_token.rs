//! Session cookie token: `{session_id}.{base64url(HMAC-SHA256(session_id))}`

use kernel::id::AuthSessionId;
use platform::crypto::{from_base64_url, hmac_sha256, to_base64_url, verify_hmac_sha256};

use crate::error::{IdentityError, IdentityResult};

/// Sign a session id for the cookie
pub fn issue(secret: &[u8; 32], session_id: &AuthSessionId) -> String {
    let session_id = session_id.to_string();
    let signature = hmac_sha256(secret, session_id.as_bytes());
    format!("{}.{}", session_id, to_base64_url(&signature))
}

/// Verify the signature and recover the session id
pub fn parse(secret: &[u8; 32], token: &str) -> IdentityResult<AuthSessionId> {
    let (session_id, signature) = token
        .split_once('.')
        .ok_or(IdentityError::SessionInvalid)?;

    let signature = from_base64_url(signature).map_err(|_| IdentityError::SessionInvalid)?;
    if !verify_hmac_sha256(secret, session_id.as_bytes(), &signature) {
        return Err(IdentityError::SessionInvalid);
    }

    session_id.parse().map_err(|_| IdentityError::SessionInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 32] = [7u8; 32];

    #[test]
    fn test_issue_then_parse() {
        let session_id = AuthSessionId::new();
        let token = issue(&SECRET, &session_id);
        assert_eq!(parse(&SECRET, &token).unwrap(), session_id);
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = issue(&SECRET, &AuthSessionId::new());
        assert!(matches!(
            parse(&[8u8; 32], &token),
            Err(IdentityError::SessionInvalid)
        ));
    }

    #[test]
    fn test_rejects_tampered_id() {
        let token = issue(&SECRET, &AuthSessionId::new());
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", AuthSessionId::new(), signature);
        assert!(parse(&SECRET, &forged).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse(&SECRET, "").is_err());
        assert!(parse(&SECRET, "no-dot").is_err());
        assert!(parse(&SECRET, "a.b.c").is_err());
    }
}
