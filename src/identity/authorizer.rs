use super::session::{Route, SessionSnapshot};

/// What a protected view renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Loading,
    Unauthenticated,
    Forbidden,
    Authorized,
}

/// Static screen shown instead of a protected view. The action is the only way out; nothing
/// retries on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fallback {
    pub title: &'static str,
    pub message: &'static str,
    pub action_label: &'static str,
    pub action: Option<Route>,
}

/// Guard for a protected view, parametrized only by whether the view is admin-only. Holds no
/// session state; every decision is read from the snapshot passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthorizationGate {
    pub requires_admin: bool,
}

impl AuthorizationGate {
    pub fn new(requires_admin: bool) -> Self { Self { requires_admin } }
    pub fn any_user() -> Self { Self { requires_admin: false } }
    pub fn admin_only() -> Self { Self { requires_admin: true } }

    pub fn evaluate(&self, session: &SessionSnapshot) -> GateState {
        if session.loading {
            return GateState::Loading;
        }
        match &session.identity {
            None => GateState::Unauthenticated,
            Some(id) if self.requires_admin && !id.is_admin() => GateState::Forbidden,
            Some(_) => GateState::Authorized,
        }
    }

    pub fn fallback(state: GateState) -> Option<Fallback> {
        match state {
            GateState::Authorized => None,
            GateState::Loading => Some(Fallback {
                title: "Loading...",
                message: "",
                action_label: "",
                action: None,
            }),
            GateState::Unauthenticated => Some(Fallback {
                title: "Access Denied",
                message: "Please log in to access this page.",
                action_label: "Go to Login",
                action: Some(Route::Login),
            }),
            GateState::Forbidden => Some(Fallback {
                title: "Admin Access Required",
                message: "You don't have permission to access this page.",
                action_label: "Go to Dashboard",
                action: Some(Route::Dashboard),
            }),
        }
    }

    /// Evaluate and, when not authorized, hand back the screen to show instead.
    pub fn check(&self, session: &SessionSnapshot) -> Result<(), Fallback> {
        match Self::fallback(self.evaluate(session)) {
            None => Ok(()),
            Some(f) => Err(f),
        }
    }
}
