//! The authentication lifecycle state machine.
//!
//! `SessionManager` is the single writer of `SessionState`; everything else
//! (route guard, stores, navbar-equivalents) observes it through a
//! `tokio::sync::watch` channel. The machine has exactly three phases:
//!
//! - **Resolving**: a persisted token was found and is being verified
//! - **Anonymous**: no credential, or verification failed
//! - **Authenticated**: token plus server-verified identity
//!
//! A token without a verified identity is only ever observable as
//! Resolving: protected views never render from an unverified credential.

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{ApiError, Transport};
use crate::models::Identity;

use super::TokenStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Resolving,
    Anonymous,
    Authenticated,
}

/// Observable session state. Invariant: `identity` is `Some` only when
/// `token` is `Some` and `resolving` is false.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub token: Option<String>,
    pub identity: Option<Identity>,
    pub resolving: bool,
}

impl SessionState {
    fn resolving(token: String) -> Self {
        Self {
            token: Some(token),
            identity: None,
            resolving: true,
        }
    }

    fn anonymous() -> Self {
        Self::default()
    }

    fn authenticated(token: String, identity: Identity) -> Self {
        Self {
            token: Some(token),
            identity: Some(identity),
            resolving: false,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.resolving {
            SessionPhase::Resolving
        } else if self.token.is_some() && self.identity.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}

pub struct SessionManager<T, S> {
    transport: T,
    store: S,
    state: watch::Sender<SessionState>,
}

impl<T: Transport, S: TokenStore> SessionManager<T, S> {
    /// Build the machine from whatever the token store holds. A persisted
    /// token starts the machine in Resolving; absence means Anonymous with
    /// no network round trip.
    pub fn new(transport: T, store: S) -> Self {
        let initial = match store.load() {
            Ok(Some(token)) => SessionState::resolving(token),
            Ok(None) => SessionState::anonymous(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token, starting anonymous");
                SessionState::anonymous()
            }
        };
        let (state, _) = watch::channel(initial);
        Self {
            transport,
            store,
            state,
        }
    }

    /// Watch for state transitions. Receivers always see the latest state;
    /// readers must re-read at the moment they issue a request since logout
    /// can happen while one of their requests is in flight.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token.clone()
    }

    /// Turn the persisted credential into a verified identity.
    ///
    /// Every exit of this function leaves `resolving` false: a hydration
    /// that failed for any reason settles into Anonymous rather than
    /// freezing the UI behind a loading placeholder. Failures are absorbed
    /// here (logged, never returned) - the caller only needs the resulting
    /// phase.
    pub async fn hydrate(&self) -> SessionPhase {
        let token = match self.token() {
            Some(token) => token,
            None => {
                self.state.send_replace(SessionState::anonymous());
                return SessionPhase::Anonymous;
            }
        };

        match self.transport.me(&token).await {
            Ok(identity) => {
                if let Err(e) = self.store.save(&token) {
                    warn!(error = %e, "Failed to persist token after hydration");
                }
                self.state
                    .send_replace(SessionState::authenticated(token, identity));
                SessionPhase::Authenticated
            }
            Err(ApiError::Unauthorized) => {
                // The server rejected the credential outright; a retry with
                // the same token can never succeed, so drop it.
                debug!("Persisted token rejected by identity check, clearing it");
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "Failed to clear rejected token");
                }
                self.state.send_replace(SessionState::anonymous());
                SessionPhase::Anonymous
            }
            Err(err) => {
                // Transport trouble says nothing about token validity; keep
                // it persisted so the next start can try again.
                warn!(error = %err, "Session hydration failed, keeping persisted token");
                self.state.send_replace(SessionState::anonymous());
                SessionPhase::Anonymous
            }
        }
    }

    /// Authenticate with email and password. On failure the state machine
    /// is left untouched and the error is returned for the login form to
    /// display.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let auth = self.transport.login(email, password).await?;
        if let Err(e) = self.store.save(&auth.token) {
            warn!(error = %e, "Failed to persist token after login");
        }
        let identity = auth.user.clone();
        self.state
            .send_replace(SessionState::authenticated(auth.token, auth.user));
        Ok(identity)
    }

    /// Create an account. The server does not hand out a token here; the
    /// caller routes the user to the login form afterwards.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<(), ApiError> {
        self.transport.register(name, email, password).await
    }

    /// Synchronous and infallible: in-memory state and the persisted token
    /// are both gone afterwards, whatever the store says.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to remove persisted token on logout");
        }
        self.state.send_replace(SessionState::anonymous());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::api::AuthSession;
    use crate::models::{
        AdminStats, AdminUser, ExpenseDraft, ExpenseFilters, ExpensePage, ExpenseRecord, Role,
    };

    fn identity(id: &str, role: Role) -> Identity {
        Identity {
            id: id.into(),
            name: "Test".into(),
            email: "a@b.com".into(),
            role,
        }
    }

    enum MeBehavior {
        Accept(Identity),
        Reject,
        NetworkDown,
    }

    struct MockTransport {
        me_behavior: MeBehavior,
        login_result: Option<AuthSession>,
        me_calls: AtomicUsize,
    }

    impl MockTransport {
        fn new(me_behavior: MeBehavior) -> Self {
            Self {
                me_behavior,
                login_result: None,
                me_calls: AtomicUsize::new(0),
            }
        }

        fn with_login(mut self, auth: AuthSession) -> Self {
            self.login_result = Some(auth);
            self
        }
    }

    impl Transport for &MockTransport {
        async fn login(&self, _email: &str, _password: &str) -> Result<AuthSession, ApiError> {
            self.login_result.clone().ok_or(ApiError::Unauthorized)
        }

        async fn register(
            &self,
            _name: &str,
            _email: &str,
            _password: &str,
        ) -> Result<(), ApiError> {
            Ok(())
        }

        async fn me(&self, _token: &str) -> Result<Identity, ApiError> {
            self.me_calls.fetch_add(1, Ordering::SeqCst);
            match &self.me_behavior {
                MeBehavior::Accept(identity) => Ok(identity.clone()),
                MeBehavior::Reject => Err(ApiError::Unauthorized),
                MeBehavior::NetworkDown => Err(ApiError::ServerError("gateway timeout".into())),
            }
        }

        async fn list_expenses(
            &self,
            _token: &str,
            _page: u32,
            _filters: &ExpenseFilters,
        ) -> Result<ExpensePage, ApiError> {
            unreachable!("not used in session tests")
        }

        async fn create_expense(
            &self,
            _token: &str,
            _draft: &ExpenseDraft,
        ) -> Result<ExpenseRecord, ApiError> {
            unreachable!("not used in session tests")
        }

        async fn update_expense(
            &self,
            _token: &str,
            _id: &str,
            _draft: &ExpenseDraft,
        ) -> Result<ExpenseRecord, ApiError> {
            unreachable!("not used in session tests")
        }

        async fn delete_expense(&self, _token: &str, _id: &str) -> Result<(), ApiError> {
            unreachable!("not used in session tests")
        }

        async fn export_expenses(
            &self,
            _token: &str,
            _filters: &ExpenseFilters,
        ) -> Result<Vec<u8>, ApiError> {
            unreachable!("not used in session tests")
        }

        async fn admin_stats(&self, _token: &str) -> Result<AdminStats, ApiError> {
            unreachable!("not used in session tests")
        }

        async fn admin_users(&self, _token: &str) -> Result<Vec<AdminUser>, ApiError> {
            unreachable!("not used in session tests")
        }

        async fn delete_user(&self, _token: &str, _id: &str) -> Result<(), ApiError> {
            unreachable!("not used in session tests")
        }
    }

    #[derive(Default)]
    struct MemoryTokenStore {
        token: Mutex<Option<String>>,
    }

    impl MemoryTokenStore {
        fn with_token(token: &str) -> Self {
            Self {
                token: Mutex::new(Some(token.to_string())),
            }
        }

        fn stored(&self) -> Option<String> {
            self.token.lock().clone()
        }
    }

    impl TokenStore for &MemoryTokenStore {
        fn load(&self) -> anyhow::Result<Option<String>> {
            Ok(self.token.lock().clone())
        }

        fn save(&self, token: &str) -> anyhow::Result<()> {
            *self.token.lock() = Some(token.to_string());
            Ok(())
        }

        fn clear(&self) -> anyhow::Result<()> {
            *self.token.lock() = None;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_hydrate_without_token_is_anonymous_without_network() {
        let transport = MockTransport::new(MeBehavior::Reject);
        let store = MemoryTokenStore::default();
        let session = SessionManager::new(&transport, &store);

        // No token found: never Resolving, not even transiently.
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert_eq!(session.hydrate().await, SessionPhase::Anonymous);
        assert_eq!(transport.me_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hydrate_with_valid_token_authenticates() {
        let transport = MockTransport::new(MeBehavior::Accept(identity("1", Role::User)));
        let store = MemoryTokenStore::with_token("t0");
        let session = SessionManager::new(&transport, &store);

        assert_eq!(session.phase(), SessionPhase::Resolving);
        assert_eq!(session.hydrate().await, SessionPhase::Authenticated);

        let state = session.current();
        assert!(!state.resolving);
        assert_eq!(state.token.as_deref(), Some("t0"));
        assert_eq!(state.identity.as_ref().map(|i| i.id.as_str()), Some("1"));
        assert_eq!(store.stored().as_deref(), Some("t0"));
    }

    #[tokio::test]
    async fn test_hydrate_with_rejected_token_clears_it() {
        let transport = MockTransport::new(MeBehavior::Reject);
        let store = MemoryTokenStore::with_token("expired");
        let session = SessionManager::new(&transport, &store);

        assert_eq!(session.hydrate().await, SessionPhase::Anonymous);

        let state = session.current();
        assert!(!state.resolving);
        assert_eq!(state.token, None);
        assert_eq!(state.identity, None);
        // An explicit 401 means the token can never work again.
        assert_eq!(store.stored(), None);
    }

    #[tokio::test]
    async fn test_hydrate_network_failure_keeps_persisted_token() {
        let transport = MockTransport::new(MeBehavior::NetworkDown);
        let store = MemoryTokenStore::with_token("t0");
        let session = SessionManager::new(&transport, &store);

        assert_eq!(session.hydrate().await, SessionPhase::Anonymous);
        assert!(!session.current().resolving);
        // Transport trouble is not a verdict on the token.
        assert_eq!(store.stored().as_deref(), Some("t0"));
    }

    #[tokio::test]
    async fn test_login_persists_token_and_authenticates() {
        let transport = MockTransport::new(MeBehavior::Reject).with_login(AuthSession {
            token: "t1".into(),
            user: identity("1", Role::User),
        });
        let store = MemoryTokenStore::default();
        let session = SessionManager::new(&transport, &store);

        let who = session.login("a@b.com", "x").await.unwrap();
        assert_eq!(who.id, "1");
        assert_eq!(session.phase(), SessionPhase::Authenticated);
        assert_eq!(session.token().as_deref(), Some("t1"));
        assert_eq!(store.stored().as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_login_failure_leaves_state_unchanged() {
        let transport = MockTransport::new(MeBehavior::Reject);
        let store = MemoryTokenStore::default();
        let session = SessionManager::new(&transport, &store);

        let err = session.login("a@b.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert_eq!(store.stored(), None);
    }

    #[tokio::test]
    async fn test_register_does_not_authenticate() {
        let transport = MockTransport::new(MeBehavior::Reject);
        let store = MemoryTokenStore::default();
        let session = SessionManager::new(&transport, &store);

        session.register("Ada", "a@b.com", "x").await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Anonymous);
    }

    #[tokio::test]
    async fn test_logout_clears_everything_and_notifies() {
        let transport = MockTransport::new(MeBehavior::Reject).with_login(AuthSession {
            token: "t1".into(),
            user: identity("1", Role::User),
        });
        let store = MemoryTokenStore::default();
        let session = SessionManager::new(&transport, &store);
        let mut rx = session.subscribe();

        session.login("a@b.com", "x").await.unwrap();
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        session.logout();
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert_eq!(store.stored(), None);
    }
}
