//! Client session: the one place "who is logged in" and "which bearer token goes on requests"
//! live. Identity and credential sit behind a single lock so the API boundary and the store can
//! never disagree about them.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::principal::{Identity, Role};
use crate::api::{ApiClient, AuthResponse, LoginRequest, RegisterRequest};
use crate::error::{AppError, AppResult};

/// Opaque bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new<S: Into<String>>(token: S) -> Self { Credential(token.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn bearer(&self) -> String { format!("Bearer {}", self.0) }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Credential(***)") }
}

#[derive(Debug, Clone)]
enum SessionState {
    /// Startup, before the first session check finished. May hold a token carried over from a
    /// previous run; it is sent only to resolve the identity.
    Resolving { credential: Option<Credential> },
    Anonymous,
    Authenticated { credential: Credential, identity: Identity },
}

#[derive(Debug)]
struct CellInner {
    state: SessionState,
    /// Bumped on every credential change.
    epoch: u64,
}

/// Read-only view of the session, what gates and views render from.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub loading: bool,
    pub identity: Option<Identity>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool { self.identity.is_some() }
    pub fn is_admin(&self) -> bool { self.identity.as_ref().is_some_and(|i| i.role == Role::Admin) }
    pub fn is_manager(&self) -> bool { self.identity.as_ref().is_some_and(|i| i.role == Role::Manager) }
}

/// Shared owner of identity + credential. Cloning shares the same state.
#[derive(Clone)]
pub struct SessionCell {
    inner: Arc<RwLock<CellInner>>,
}

impl Default for SessionCell {
    fn default() -> Self { Self::new() }
}

impl SessionCell {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(CellInner { state: SessionState::Resolving { credential: None }, epoch: 0 })) }
    }

    /// Start with a token from a previous run; `SessionStore::check_session` resolves it.
    pub fn resuming(credential: Credential) -> Self {
        Self { inner: Arc::new(RwLock::new(CellInner { state: SessionState::Resolving { credential: Some(credential) }, epoch: 0 })) }
    }

    /// Token to attach to the next outgoing request. Only an established session has one.
    pub fn credential(&self) -> Option<Credential> {
        match &self.inner.read().state {
            SessionState::Authenticated { credential, .. } => Some(credential.clone()),
            _ => None,
        }
    }

    /// Carried-over token still waiting for `check_session`.
    pub fn pending_credential(&self) -> Option<Credential> {
        match &self.inner.read().state {
            SessionState::Resolving { credential } => credential.clone(),
            _ => None,
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        match &self.inner.read().state {
            SessionState::Authenticated { identity, .. } => Some(identity.clone()),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.inner.read().state, SessionState::Resolving { .. })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let g = self.inner.read();
        match &g.state {
            SessionState::Resolving { .. } => SessionSnapshot { loading: true, identity: None },
            SessionState::Anonymous => SessionSnapshot { loading: false, identity: None },
            SessionState::Authenticated { identity, .. } => SessionSnapshot { loading: false, identity: Some(identity.clone()) },
        }
    }

    pub fn epoch(&self) -> u64 { self.inner.read().epoch }

    /// Set token and identity together.
    pub fn establish(&self, credential: Credential, identity: Identity) {
        let mut g = self.inner.write();
        g.state = SessionState::Authenticated { credential, identity };
        g.epoch += 1;
    }

    /// Finish a startup check. Applies only if still resolving the same token.
    fn resolve(&self, credential: &Credential, identity: Identity) -> bool {
        let mut g = self.inner.write();
        let pending = matches!(&g.state, SessionState::Resolving { credential: Some(c) } if c == credential);
        if pending {
            g.state = SessionState::Authenticated { credential: credential.clone(), identity };
        }
        pending
    }

    /// Startup check failed or had nothing to check: end in the anonymous state.
    fn resolve_anonymous(&self) {
        let mut g = self.inner.write();
        let had = match &g.state {
            SessionState::Resolving { credential } => credential.is_some(),
            _ => return,
        };
        g.state = SessionState::Anonymous;
        if had { g.epoch += 1; }
    }

    /// Swap in a refreshed token and identity, provided nothing changed since `epoch` was read.
    pub fn replace_if(&self, epoch: u64, credential: Credential, identity: Identity) -> bool {
        let mut g = self.inner.write();
        if g.epoch != epoch || !matches!(g.state, SessionState::Authenticated { .. }) {
            return false;
        }
        g.state = SessionState::Authenticated { credential, identity };
        g.epoch += 1;
        true
    }

    /// Drop the session only if it still holds `credential`, pending or established.
    /// Returns the epoch after the clear, or None when the session had moved on.
    pub fn clear_if(&self, credential: &Credential) -> Option<u64> {
        let mut g = self.inner.write();
        let holds = match &g.state {
            SessionState::Resolving { credential: Some(c) } => c == credential,
            SessionState::Authenticated { credential: c, .. } => c == credential,
            _ => false,
        };
        if !holds {
            return None;
        }
        g.state = SessionState::Anonymous;
        g.epoch += 1;
        Some(g.epoch)
    }

    /// Drop token and identity. Returns whether a token was held.
    pub fn clear(&self) -> bool {
        let mut g = self.inner.write();
        let had = match &g.state {
            SessionState::Resolving { credential } => credential.is_some(),
            SessionState::Anonymous => false,
            SessionState::Authenticated { .. } => true,
        };
        g.state = SessionState::Anonymous;
        if had { g.epoch += 1; }
        had
    }
}

/// Where the router should go next. Emitted as an effect; nothing in the session depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Admin,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Admin => "/admin",
            Route::Dashboard => "/dashboard",
        }
    }

    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Admin => Route::Admin,
            Role::Manager => Route::Dashboard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A call got 401. One event per response; `cleared` says whether this response dropped the
    /// token it was sent with, and `epoch` is the session epoch right after.
    Unauthorized { path: String, cleared: bool, epoch: u64 },
    Navigate(Route),
}

/// Process-wide publish/subscribe channel for session events.
#[derive(Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for SessionEvents {
    fn default() -> Self { Self::new() }
}

impl SessionEvents {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> { self.tx.subscribe() }

    pub fn publish(&self, ev: SessionEvent) {
        // No subscribers is fine: nobody needs to react.
        let _ = self.tx.send(ev);
    }
}

/// Login/logout/check operations over the shared session.
#[derive(Clone)]
pub struct SessionStore {
    api: ApiClient,
}

impl SessionStore {
    pub fn new(api: ApiClient) -> Self { Self { api } }

    pub fn api(&self) -> &ApiClient { &self.api }

    pub fn snapshot(&self) -> SessionSnapshot { self.api.session().snapshot() }
    pub fn identity(&self) -> Option<Identity> { self.api.session().identity() }
    pub fn is_loading(&self) -> bool { self.api.session().is_loading() }
    pub fn is_authenticated(&self) -> bool { self.snapshot().is_authenticated() }
    pub fn is_admin(&self) -> bool { self.snapshot().is_admin() }
    pub fn is_manager(&self) -> bool { self.snapshot().is_manager() }

    /// Resolve the identity for a carried-over token. Never fails: any problem ends anonymous.
    /// Calling it again after the session resolved does nothing.
    pub async fn check_session(&self) {
        let cell = self.api.session();
        if !cell.is_loading() {
            return;
        }
        let Some(credential) = cell.pending_credential() else {
            debug!(target: "commission_desk::session", "check_session: no stored credential");
            cell.resolve_anonymous();
            return;
        };
        match self.api.auth().me_as(&credential).await {
            Ok(identity) => {
                let uid = identity.id.clone();
                if cell.resolve(&credential, identity) {
                    info!(target: "commission_desk::session", "session restored user={}", uid);
                } else {
                    debug!(target: "commission_desk::session", "check_session: session changed while resolving; result dropped");
                }
            }
            Err(e) => {
                debug!(target: "commission_desk::session", "check_session failed: {}", e);
                cell.resolve_anonymous();
            }
        }
    }

    /// Exchange email/password for a session. On failure nothing changes.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Identity> {
        let req = LoginRequest::new(email, password)?;
        let resp = self.api.auth().login(&req).await.map_err(as_auth_failure)?;
        Ok(self.adopt(resp, "login"))
    }

    pub async fn register(&self, req: &RegisterRequest) -> AppResult<Identity> {
        req.validate()?;
        let resp = self.api.auth().register(req).await.map_err(as_auth_failure)?;
        Ok(self.adopt(resp, "register"))
    }

    /// Swap the current token for a fresh one. A logout or expiry while the call is out wins.
    pub async fn refresh(&self) -> AppResult<Identity> {
        if !self.is_authenticated() {
            return Err(AppError::expired("not_authenticated", "no active session to refresh"));
        }
        let epoch = self.api.session().epoch();
        let resp = self.api.auth().refresh().await?;
        let identity = resp.user.clone();
        if !self.api.session().replace_if(epoch, Credential::new(resp.access_token), resp.user) {
            debug!(target: "commission_desk::session", "refresh result dropped: session changed while in flight");
            return Err(AppError::expired("session_changed", "Session ended while refreshing"));
        }
        debug!(target: "commission_desk::session", "token refreshed user={}", identity.id);
        Ok(identity)
    }

    fn adopt(&self, resp: AuthResponse, how: &str) -> Identity {
        let identity = resp.user.clone();
        self.api.session().establish(Credential::new(resp.access_token), resp.user);
        info!(target: "commission_desk::session", "{} ok user={} role={}", how, identity.id, identity.role.as_str());
        self.api.events().publish(SessionEvent::Navigate(Route::home_for(identity.role)));
        identity
    }

    /// Clear identity and token and send the user to the login page. Safe to call repeatedly.
    pub fn logout(&self) {
        let had = self.api.session().clear();
        debug!(target: "commission_desk::session", "logout had_credential={}", had);
        if had {
            info!(target: "commission_desk::session", "logged out");
        }
        self.api.events().publish(SessionEvent::Navigate(Route::Login));
    }

    /// React to one session event. Returns true when it ended the session.
    ///
    /// The boundary has already dropped the token; what is left is sending the user to the login
    /// page. Events that cleared nothing, or that predate a newer session, are ignored.
    pub fn handle_event(&self, ev: &SessionEvent) -> bool {
        match ev {
            SessionEvent::Unauthorized { path, cleared: true, epoch } if *epoch == self.api.session().epoch() => {
                warn!(target: "commission_desk::session", "unauthorized response from {}; session ended", path);
                self.api.events().publish(SessionEvent::Navigate(Route::Login));
                true
            }
            SessionEvent::Unauthorized { path, cleared, epoch } => {
                debug!(target: "commission_desk::session", "ignoring unauthorized from {} cleared={} epoch={}", path, cleared, epoch);
                false
            }
            SessionEvent::Navigate(_) => false,
        }
    }

    /// Listen for unauthorized events from any request and end the session for each.
    pub fn spawn_unauthorized_listener(&self) -> JoinHandle<()> {
        let store = self.clone();
        let mut rx = self.api.events().subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => { store.handle_event(&ev); }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // The boundary already cleared the token; only navigation effects were missed.
                        warn!(target: "commission_desk::session", "session listener lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

// Login and register failures are credential problems unless the network itself failed.
fn as_auth_failure(e: AppError) -> AppError {
    match e {
        AppError::Network { .. } | AppError::Validation { .. } | AppError::Authentication { .. } => e,
        AppError::Server { message, .. } | AppError::AuthorizationExpired { message, .. } if !message.is_empty() => {
            AppError::Authentication { code: "invalid_credentials".into(), message }
        }
        _ => AppError::authentication("login_failed", "Login failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity {
            id: "u1".into(), email: "admin@example.de".into(), first_name: "Ada".into(),
            last_name: "Admin".into(), role: Role::Admin, manager: None,
        }
    }

    #[test]
    fn starts_loading_without_credential() {
        let cell = SessionCell::new();
        assert!(cell.is_loading());
        assert!(cell.credential().is_none());
        assert_eq!(cell.snapshot(), SessionSnapshot { loading: true, identity: None });
    }

    #[test]
    fn establish_sets_both_and_clear_drops_both() {
        let cell = SessionCell::new();
        cell.establish(Credential::new("tok"), admin());
        assert_eq!(cell.credential().unwrap().bearer(), "Bearer tok");
        assert!(cell.snapshot().is_admin());
        assert!(cell.clear());
        assert!(cell.credential().is_none());
        assert!(cell.identity().is_none());
        assert!(!cell.clear(), "second clear has nothing to drop");
        assert!(!cell.is_loading());
    }

    #[test]
    fn resolve_applies_only_to_same_pending_token() {
        let cell = SessionCell::resuming(Credential::new("old"));
        assert!(!cell.resolve(&Credential::new("other"), admin()));
        assert!(cell.is_loading());
        assert!(cell.resolve(&Credential::new("old"), admin()));
        assert!(cell.snapshot().is_authenticated());
        assert!(!cell.resolve(&Credential::new("old"), admin()));
    }

    #[test]
    fn epoch_moves_on_credential_changes_only() {
        let cell = SessionCell::new();
        let e0 = cell.epoch();
        cell.clear();
        assert_eq!(cell.epoch(), e0);
        cell.establish(Credential::new("t"), admin());
        cell.clear();
        assert_eq!(cell.epoch(), e0 + 2);
    }

    #[test]
    fn pending_token_is_not_a_request_credential() {
        let cell = SessionCell::resuming(Credential::new("old"));
        assert!(cell.credential().is_none());
        assert_eq!(cell.pending_credential(), Some(Credential::new("old")));
        cell.establish(Credential::new("new"), admin());
        assert!(cell.pending_credential().is_none());
        assert_eq!(cell.credential(), Some(Credential::new("new")));
    }

    #[test]
    fn clear_if_only_drops_the_matching_token() {
        let cell = SessionCell::resuming(Credential::new("old"));
        cell.establish(Credential::new("new"), admin());
        let epoch = cell.epoch();
        assert_eq!(cell.clear_if(&Credential::new("old")), None);
        assert!(cell.snapshot().is_authenticated());
        assert_eq!(cell.epoch(), epoch);
        assert_eq!(cell.clear_if(&Credential::new("new")), Some(epoch + 1));
        assert!(cell.credential().is_none());
        assert_eq!(cell.clear_if(&Credential::new("new")), None);
    }

    #[test]
    fn clear_if_drops_a_pending_token() {
        let cell = SessionCell::resuming(Credential::new("old"));
        assert!(cell.clear_if(&Credential::new("old")).is_some());
        assert!(!cell.is_loading());
        assert!(cell.pending_credential().is_none());
    }

    #[test]
    fn replace_if_requires_unchanged_session() {
        let cell = SessionCell::new();
        cell.establish(Credential::new("a"), admin());
        let epoch = cell.epoch();
        assert!(cell.replace_if(epoch, Credential::new("b"), admin()));
        assert_eq!(cell.credential(), Some(Credential::new("b")));
        assert!(!cell.replace_if(epoch, Credential::new("c"), admin()), "stale epoch");
        let epoch = cell.epoch();
        cell.clear();
        assert!(!cell.replace_if(epoch, Credential::new("d"), admin()));
        assert!(cell.credential().is_none());
    }

    #[test]
    fn credential_debug_is_redacted() {
        assert_eq!(format!("{:?}", Credential::new("secret")), "Credential(***)");
    }

    #[test]
    fn auth_failure_mapping() {
        let e = as_auth_failure(AppError::server("bad_request", "Invalid credentials", 401));
        assert_eq!(e, AppError::authentication("invalid_credentials", "Invalid credentials"));
        let e = as_auth_failure(AppError::server("server_error", "", 500));
        assert_eq!(e.message(), "Login failed");
        assert!(matches!(as_auth_failure(AppError::network("timeout", "t")), AppError::Network { .. }));
    }

    #[test]
    fn home_route_by_role() {
        assert_eq!(Route::home_for(Role::Admin).path(), "/admin");
        assert_eq!(Route::home_for(Role::Manager).path(), "/dashboard");
    }
}
