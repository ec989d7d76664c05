//! Session store: the auth token plus the profile it was validated against.
//!
//! # Design
//! `SessionState` makes the pairing structural: a profile exists only inside
//! `Authenticated`, next to the token it was fetched with. `Loading` is the
//! state of a store whose `startup` has not run yet. Validation is a single
//! blocking call, so the store goes straight from there to its outcome.
//!
//! The store is a plain value handed to whoever needs it, and every
//! operation takes the `Api` it should talk through. Navigation side effects
//! are queued as `SessionEvent`s for the presentation layer to drain.

use thiserror::Error;
use tracing::{info, warn};

use crate::api::Api;
use crate::error::ApiError;
use crate::http::Transport;
use crate::storage::{StorageError, TokenStore};
use crate::types::{Credentials, MessageResponse, PasswordChange, Profile, RegisteredUser, Registration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Authenticated { token: String, profile: Profile },
    Anonymous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Anonymous,
}

/// Side effects the presentation layer should act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    RedirectToLogin,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug)]
pub struct SessionStore {
    state: SessionState,
    events: Vec<SessionEvent>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// A fresh store is `Loading` until `startup` has run.
    pub fn new() -> Self {
        Self {
            state: SessionState::Loading,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Loading => SessionStatus::Loading,
            SessionState::Authenticated { .. } => SessionStatus::Authenticated,
            SessionState::Anonymous => SessionStatus::Anonymous,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status() == SessionStatus::Loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { token, .. } => Some(token),
            SessionState::Loading | SessionState::Anonymous => None,
        }
    }

    pub fn user(&self) -> Option<&Profile> {
        match &self.state {
            SessionState::Authenticated { profile, .. } => Some(profile),
            _ => None,
        }
    }

    /// Validate any persisted token. Failure demotes to `Anonymous` silently
    /// and forgets the token.
    pub fn startup<T: Transport, S: TokenStore>(&mut self, api: &Api<T, S>) -> SessionStatus {
        match api.tokens().load() {
            Some(token) => self.revalidate(api, token),
            None => self.state = SessionState::Anonymous,
        }
        self.status()
    }

    /// Adopt a token whose profile the caller already fetched. No round trip.
    pub fn login<T: Transport, S: TokenStore>(
        &mut self,
        api: &Api<T, S>,
        token: &str,
        profile: Profile,
    ) -> Result<(), StorageError> {
        api.tokens().save(token)?;
        info!(user = %profile.email, "signed in");
        self.state = SessionState::Authenticated {
            token: token.to_string(),
            profile,
        };
        Ok(())
    }

    pub fn logout<T: Transport, S: TokenStore>(&mut self, api: &Api<T, S>) {
        forget_token(api);
        self.state = SessionState::Anonymous;
        self.events.push(SessionEvent::RedirectToLogin);
    }

    pub fn refetch_user<T: Transport, S: TokenStore>(&mut self, api: &Api<T, S>) -> SessionStatus {
        match api.tokens().load() {
            Some(token) => self.revalidate(api, token),
            None => self.logout(api),
        }
        self.status()
    }

    /// Full login flow: credentials → token → profile → `login`.
    ///
    /// Any failure leaves no token behind and the session `Anonymous`.
    pub fn sign_in<T: Transport, S: TokenStore>(
        &mut self,
        api: &Api<T, S>,
        credentials: &Credentials,
    ) -> Result<Profile, SessionError> {
        let result = self.try_sign_in(api, credentials);
        if let Err(e) = &result {
            warn!(user = %credentials.email, error = %e, "sign in failed");
            forget_token(api);
            self.state = SessionState::Anonymous;
        }
        result
    }

    fn try_sign_in<T: Transport, S: TokenStore>(
        &mut self,
        api: &Api<T, S>,
        credentials: &Credentials,
    ) -> Result<Profile, SessionError> {
        let token = api.login(credentials)?.access_token;
        // the profile request authenticates with the stored token
        api.tokens().save(&token)?;
        let profile = api.current_user()?;
        self.login(api, &token, profile.clone())?;
        Ok(profile)
    }

    pub fn register<T: Transport, S: TokenStore>(
        &self,
        api: &Api<T, S>,
        registration: &Registration,
    ) -> Result<RegisteredUser, ApiError> {
        api.register(registration)
    }

    pub fn change_password<T: Transport, S: TokenStore>(
        &self,
        api: &Api<T, S>,
        change: &PasswordChange,
    ) -> Result<MessageResponse, ApiError> {
        api.change_password(change)
    }

    /// Deletes the account and, once the server confirms, logs out.
    pub fn delete_account<T: Transport, S: TokenStore>(
        &mut self,
        api: &Api<T, S>,
    ) -> Result<(), ApiError> {
        api.delete_account()?;
        info!("account deleted");
        self.logout(api);
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    fn revalidate<T: Transport, S: TokenStore>(&mut self, api: &Api<T, S>, token: String) {
        self.state = match api.current_user() {
            Ok(profile) => SessionState::Authenticated { token, profile },
            Err(e) => {
                warn!(error = %e, "stored token rejected, continuing anonymously");
                forget_token(api);
                SessionState::Anonymous
            }
        };
    }
}

fn forget_token<T: Transport, S: TokenStore>(api: &Api<T, S>) {
    if let Err(e) = api.tokens().clear() {
        warn!(error = %e, "could not clear stored token");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GroceryClient;
    use crate::storage::MemoryTokenStore;
    use crate::testing::ScriptedTransport;

    const PROFILE: &str = r#"{"id":1,"email":"ann@example.com","is_active":true,"created_at":"2024-05-01T10:00:00","updated_at":null}"#;

    fn api(transport: ScriptedTransport, tokens: MemoryTokenStore) -> Api<ScriptedTransport, MemoryTokenStore> {
        Api::new(GroceryClient::new("http://api.test"), transport, tokens)
    }

    fn profile() -> Profile {
        serde_json::from_str(PROFILE).unwrap()
    }

    #[test]
    fn starts_loading() {
        let session = SessionStore::new();
        assert!(session.is_loading());
        assert!(session.user().is_none());
    }

    #[test]
    fn startup_without_token_is_anonymous_without_request() {
        let api = api(ScriptedTransport::new(), MemoryTokenStore::new());
        let mut session = SessionStore::new();
        assert_eq!(session.startup(&api), SessionStatus::Anonymous);
        assert!(api.transport().requests().is_empty());
    }

    #[test]
    fn startup_with_valid_token_authenticates() {
        let api = api(ScriptedTransport::new().reply(200, PROFILE), MemoryTokenStore::with_token("good"));
        let mut session = SessionStore::new();
        assert_eq!(session.startup(&api), SessionStatus::Authenticated);
        assert_eq!(session.token(), Some("good"));
        assert_eq!(session.user(), Some(&profile()));
        assert_eq!(
            api.transport().requests()[0].header("authorization"),
            Some("Bearer good")
        );
    }

    #[test]
    fn startup_with_expired_token_clears_it() {
        let api = api(
            ScriptedTransport::new().reply(401, r#"{"detail":"Could not validate credentials"}"#),
            MemoryTokenStore::with_token("expired"),
        );
        let mut session = SessionStore::new();
        assert_eq!(session.startup(&api), SessionStatus::Anonymous);
        assert!(api.tokens().load().is_none());
        assert!(session.token().is_none());
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn login_is_synchronous_and_persists() {
        let api = api(ScriptedTransport::new(), MemoryTokenStore::new());
        let mut session = SessionStore::new();
        session.login(&api, "fresh", profile()).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(api.tokens().load().as_deref(), Some("fresh"));
        assert!(api.transport().requests().is_empty());
    }

    #[test]
    fn logout_clears_and_requests_redirect() {
        let api = api(ScriptedTransport::new(), MemoryTokenStore::new());
        let mut session = SessionStore::new();
        session.login(&api, "fresh", profile()).unwrap();
        session.logout(&api);
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert!(session.user().is_none());
        assert!(api.tokens().load().is_none());
        assert_eq!(session.take_events(), vec![SessionEvent::RedirectToLogin]);
        assert!(session.take_events().is_empty());
    }

    #[test]
    fn refetch_without_token_behaves_like_logout() {
        let api = api(ScriptedTransport::new(), MemoryTokenStore::new());
        let mut session = SessionStore::new();
        assert_eq!(session.refetch_user(&api), SessionStatus::Anonymous);
        assert_eq!(session.take_events(), vec![SessionEvent::RedirectToLogin]);
    }

    #[test]
    fn rejected_refetch_drops_token_and_profile() {
        let api = api(
            ScriptedTransport::new().reply(401, r#"{"detail":"Could not validate credentials"}"#),
            MemoryTokenStore::new(),
        );
        let mut session = SessionStore::new();
        session.login(&api, "revoked", profile()).unwrap();
        assert_eq!(session.refetch_user(&api), SessionStatus::Anonymous);
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(session.token().is_none());
        assert!(api.tokens().load().is_none());
    }

    #[test]
    fn refetch_replaces_profile_wholesale() {
        let updated = PROFILE.replace("\"updated_at\":null", "\"updated_at\":\"2024-06-01T00:00:00\"");
        let api = api(
            ScriptedTransport::new().reply(200, &updated),
            MemoryTokenStore::new(),
        );
        let mut session = SessionStore::new();
        session.login(&api, "tok", profile()).unwrap();
        session.refetch_user(&api);
        assert_eq!(
            session.user().unwrap().updated_at.as_deref(),
            Some("2024-06-01T00:00:00")
        );
    }

    #[test]
    fn sign_in_fetches_profile_with_new_token() {
        let api = api(
            ScriptedTransport::new()
                .reply(200, r#"{"access_token":"abc","token_type":"bearer"}"#)
                .reply(200, PROFILE),
            MemoryTokenStore::new(),
        );
        let mut session = SessionStore::new();
        let credentials = Credentials {
            email: "ann@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        let user = session.sign_in(&api, &credentials).unwrap();
        assert_eq!(user.email, "ann@example.com");
        assert!(session.is_authenticated());
        assert_eq!(api.tokens().load().as_deref(), Some("abc"));
        let sent = api.transport().requests();
        assert_eq!(sent[1].header("authorization"), Some("Bearer abc"));
    }

    #[test]
    fn sign_in_with_failed_profile_fetch_leaves_no_token() {
        let api = api(
            ScriptedTransport::new()
                .reply(200, r#"{"access_token":"abc"}"#)
                .reply(500, "oops"),
            MemoryTokenStore::new(),
        );
        let mut session = SessionStore::new();
        let credentials = Credentials {
            email: "ann@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        let err = session.sign_in(&api, &credentials).unwrap_err();
        assert!(matches!(err, SessionError::Api(ApiError::Http { status: 500, .. })));
        assert!(api.tokens().load().is_none());
        assert_eq!(session.status(), SessionStatus::Anonymous);
    }

    #[test]
    fn delete_account_logs_out_only_on_success() {
        let api = api(
            ScriptedTransport::new()
                .reply(500, r#"{"detail":"try later"}"#)
                .reply(204, ""),
            MemoryTokenStore::new(),
        );
        let mut session = SessionStore::new();
        session.login(&api, "tok", profile()).unwrap();

        assert!(session.delete_account(&api).is_err());
        assert!(session.is_authenticated());

        session.delete_account(&api).unwrap();
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert!(api.tokens().load().is_none());
        assert_eq!(session.take_events(), vec![SessionEvent::RedirectToLogin]);
    }
}
