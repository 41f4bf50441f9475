//! Facebook login over the Graph API

use std::time::Duration;

use platform::crypto::hmac_sha256;
use serde::Deserialize;
use url::Url;

use crate::application::external_login::{ExternalLoginProvider, ExternalProfile};
use crate::error::{IdentityError, IdentityResult};

pub const PROVIDER_NAME: &str = "Facebook";

/// App credentials and endpoints
#[derive(Clone)]
pub struct FacebookOptions {
    pub app_id: String,
    pub app_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_information_endpoint: String,
}

impl FacebookOptions {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            authorization_endpoint: "https://www.facebook.com/v18.0/dialog/oauth".to_string(),
            token_endpoint: "https://graph.facebook.com/v18.0/oauth/access_token".to_string(),
            user_information_endpoint: "https://graph.facebook.com/v18.0/me".to_string(),
        }
    }
}

impl std::fmt::Debug for FacebookOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacebookOptions")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct MeResponse {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FacebookProvider {
    options: FacebookOptions,
    http: reqwest::Client,
}

impl FacebookProvider {
    pub fn new(options: FacebookOptions) -> IdentityResult<Self> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| IdentityError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self { options, http })
    }

    /// `appsecret_proof`: hex HMAC-SHA256 of the access token keyed by the app secret
    fn app_secret_proof(&self, access_token: &str) -> String {
        hex::encode(hmac_sha256(
            self.options.app_secret.as_bytes(),
            access_token.as_bytes(),
        ))
    }
}

fn failed(e: reqwest::Error) -> IdentityError {
    IdentityError::ExternalLoginFailed(e.to_string())
}

impl ExternalLoginProvider for FacebookProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn authorization_url(&self, state: &str, redirect_uri: &str) -> IdentityResult<String> {
        let url = Url::parse_with_params(
            &self.options.authorization_endpoint,
            &[
                ("client_id", self.options.app_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", "email"),
                ("state", state),
            ],
        )
        .map_err(|e| IdentityError::Internal(format!("Invalid authorization endpoint: {e}")))?;

        Ok(url.into())
    }

    async fn fetch_profile(&self, code: &str, redirect_uri: &str) -> IdentityResult<ExternalProfile> {
        let token: TokenResponse = self
            .http
            .get(&self.options.token_endpoint)
            .query(&[
                ("client_id", self.options.app_id.as_str()),
                ("client_secret", self.options.app_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("code", code),
            ])
            .send()
            .await
            .map_err(failed)?
            .error_for_status()
            .map_err(failed)?
            .json()
            .await
            .map_err(failed)?;

        let proof = self.app_secret_proof(&token.access_token);
        let me: MeResponse = self
            .http
            .get(&self.options.user_information_endpoint)
            .query(&[
                ("fields", "id,email"),
                ("access_token", token.access_token.as_str()),
                ("appsecret_proof", proof.as_str()),
            ])
            .send()
            .await
            .map_err(failed)?
            .error_for_status()
            .map_err(failed)?
            .json()
            .await
            .map_err(failed)?;

        tracing::debug!(provider_key = %me.id, has_email = me.email.is_some(), "Facebook profile loaded");

        Ok(ExternalProfile {
            provider_key: me.id,
            email: me.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> FacebookProvider {
        FacebookProvider::new(FacebookOptions::new("1234", "app-secret")).unwrap()
    }

    #[test]
    fn test_authorization_url() {
        let url = provider()
            .authorization_url(
                "xyz",
                "https://localhost:5001/Identity/Account/ExternalLogin/Facebook/Callback",
            )
            .unwrap();
        let url = Url::parse(&url).unwrap();

        assert_eq!(url.host_str(), Some("www.facebook.com"));
        let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(params.contains(&("client_id".to_string(), "1234".to_string())));
        assert!(params.contains(&("state".to_string(), "xyz".to_string())));
        assert!(params.contains(&("scope".to_string(), "email".to_string())));
        assert!(params.contains(&(
            "redirect_uri".to_string(),
            "https://localhost:5001/Identity/Account/ExternalLogin/Facebook/Callback".to_string()
        )));
    }

    #[test]
    fn test_app_secret_proof_is_hex_hmac() {
        let proof = provider().app_secret_proof("token");
        assert_eq!(proof.len(), 64);
        assert_eq!(proof, hex::encode(hmac_sha256(b"app-secret", b"token")));
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug_output = format!("{:?}", FacebookOptions::new("1234", "app-secret"));
        assert!(!debug_output.contains("app-secret"));
    }
}
