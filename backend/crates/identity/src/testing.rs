//! In-memory fakes for use case and router tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use kernel::id::{AuthSessionId, UserId};
use mailer::{EmailSender, MailResult};

use crate::application::external_login::{ExternalLoginProvider, ExternalProfile};
use crate::domain::entity::{
    auth_session::AuthSession, external_login::ExternalLogin, user::User, user_token::UserToken,
};
use crate::domain::repository::{
    AuthSessionRepository, ExternalLoginRepository, UserRepository, UserTokenRepository,
};
use crate::domain::value_object::{email::Email, token_purpose::TokenPurpose};
use crate::error::{IdentityError, IdentityResult};

#[derive(Default)]
struct Store {
    users: HashMap<UserId, User>,
    tokens: Vec<UserToken>,
    sessions: HashMap<AuthSessionId, AuthSession>,
    logins: Vec<ExternalLogin>,
}

#[derive(Clone, Default)]
pub struct InMemoryIdentityRepository {
    store: Arc<Mutex<Store>>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        let normalized = email.to_lowercase();
        let store = self.store.lock().unwrap();
        store
            .users
            .values()
            .find(|u| u.normalized_email() == normalized)
            .cloned()
    }

    pub fn session_count(&self) -> usize {
        self.store.lock().unwrap().sessions.len()
    }

    pub fn login_count(&self) -> usize {
        self.store.lock().unwrap().logins.len()
    }
}

impl UserRepository for InMemoryIdentityRepository {
    async fn create(&self, user: &User) -> IdentityResult<()> {
        let mut store = self.store.lock().unwrap();
        let normalized = user.normalized_email();
        if store.users.values().any(|u| u.normalized_email() == normalized) {
            return Err(IdentityError::DuplicateEmail(user.email.to_string()));
        }
        store.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> IdentityResult<Option<User>> {
        Ok(self.store.lock().unwrap().users.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> IdentityResult<Option<User>> {
        Ok(self.user_by_email(email.as_str()))
    }

    async fn update(&self, user: &User) -> IdentityResult<()> {
        self.store
            .lock()
            .unwrap()
            .users
            .insert(user.user_id, user.clone());
        Ok(())
    }
}

impl UserTokenRepository for InMemoryIdentityRepository {
    async fn create(&self, token: &UserToken) -> IdentityResult<()> {
        self.store.lock().unwrap().tokens.push(token.clone());
        Ok(())
    }

    async fn find_by_hash(
        &self,
        purpose: TokenPurpose,
        token_hash: &[u8],
    ) -> IdentityResult<Option<UserToken>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .tokens
            .iter()
            .find(|t| t.purpose == purpose && t.token_hash == token_hash)
            .cloned())
    }

    async fn update(&self, token: &UserToken) -> IdentityResult<()> {
        let mut store = self.store.lock().unwrap();
        if let Some(existing) = store.tokens.iter_mut().find(|t| t.token_id == token.token_id) {
            *existing = token.clone();
        }
        Ok(())
    }

    async fn delete_for_user(&self, user_id: &UserId, purpose: TokenPurpose) -> IdentityResult<u64> {
        let mut store = self.store.lock().unwrap();
        let before = store.tokens.len();
        store
            .tokens
            .retain(|t| !(t.user_id == *user_id && t.purpose == purpose));
        Ok((before - store.tokens.len()) as u64)
    }
}

impl AuthSessionRepository for InMemoryIdentityRepository {
    async fn create(&self, session: &AuthSession) -> IdentityResult<()> {
        self.store
            .lock()
            .unwrap()
            .sessions
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, session_id: &AuthSessionId) -> IdentityResult<Option<AuthSession>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .sessions
            .get(session_id)
            .filter(|s| !s.is_expired())
            .cloned())
    }

    async fn update(&self, session: &AuthSession) -> IdentityResult<()> {
        let mut store = self.store.lock().unwrap();
        if let Some(existing) = store.sessions.get_mut(&session.session_id) {
            *existing = session.clone();
        }
        Ok(())
    }

    async fn delete(&self, session_id: &AuthSessionId) -> IdentityResult<()> {
        self.store.lock().unwrap().sessions.remove(session_id);
        Ok(())
    }

    async fn delete_all_for_user(&self, user_id: &UserId) -> IdentityResult<u64> {
        let mut store = self.store.lock().unwrap();
        let before = store.sessions.len();
        store.sessions.retain(|_, s| s.user_id != *user_id);
        Ok((before - store.sessions.len()) as u64)
    }
}

impl ExternalLoginRepository for InMemoryIdentityRepository {
    async fn create(&self, login: &ExternalLogin) -> IdentityResult<()> {
        self.store.lock().unwrap().logins.push(login.clone());
        Ok(())
    }

    async fn find(&self, provider: &str, provider_key: &str) -> IdentityResult<Option<ExternalLogin>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .logins
            .iter()
            .find(|l| l.provider == provider && l.provider_key == provider_key)
            .cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl SentEmail {
    /// The `code` query parameter of the link in the body
    pub fn code(&self) -> String {
        let start = self.html.find("code=").expect("link with code") + "code=".len();
        self.html[start..]
            .split(['\'', '&'])
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// The `userId` query parameter of a confirmation link
    pub fn user_id(&self) -> String {
        let start = self.html.find("userId=").expect("link with userId") + "userId=".len();
        self.html[start..]
            .split(['\'', '&'])
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

/// Records every email instead of sending it
#[derive(Clone, Default)]
pub struct RecordingEmailSender {
    sent: Arc<Mutex<Vec<SentEmail>>>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> SentEmail {
        self.sent().pop().expect("an email was sent")
    }
}

impl EmailSender for RecordingEmailSender {
    async fn send_email(&self, email: &str, subject: &str, html_message: &str) -> MailResult<()> {
        self.sent.lock().unwrap().push(SentEmail {
            to: email.to_string(),
            subject: subject.to_string(),
            html: html_message.to_string(),
        });
        Ok(())
    }
}

/// Provider that returns a fixed profile for code `good-code`
pub struct FakeProvider {
    pub profile: ExternalProfile,
}

impl FakeProvider {
    pub fn new(provider_key: &str, email: Option<&str>) -> Self {
        Self {
            profile: ExternalProfile {
                provider_key: provider_key.to_string(),
                email: email.map(str::to_string),
            },
        }
    }
}

impl ExternalLoginProvider for FakeProvider {
    fn name(&self) -> &str {
        "Facebook"
    }

    fn authorization_url(&self, state: &str, redirect_uri: &str) -> IdentityResult<String> {
        Ok(format!(
            "https://provider.test/dialog?state={}&redirect_uri={}",
            state, redirect_uri
        ))
    }

    async fn fetch_profile(&self, code: &str, _redirect_uri: &str) -> IdentityResult<ExternalProfile> {
        if code == "good-code" {
            Ok(self.profile.clone())
        } else {
            Err(IdentityError::ExternalLoginFailed("bad code".to_string()))
        }
    }
}
