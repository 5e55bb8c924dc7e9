//! Client-side identity: who is logged in, the bearer credential that goes with it, and the
//! gate protected views consult. Keep the public surface thin and split implementation across
//! sub-modules.

mod principal;
mod session;
mod authorizer;

pub use principal::{Identity, ManagerRef, Role};
pub use session::{Credential, Route, SessionCell, SessionEvent, SessionEvents, SessionSnapshot, SessionStore};
pub use authorizer::{AuthorizationGate, Fallback, GateState};
