//! Route guard decisions.
//!
//! SYSTEM CONTEXT
//! ==============
//! `RouteGuard` and `RoleGuard` render whatever [`evaluate`] says for the
//! current snapshot and location. The function is pure so every
//! snapshot/policy combination can be tested without a reactive runtime;
//! [`GuardNavigator`] makes sure each redirect is issued once per entry into
//! a redirecting state rather than on every re-render.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use session::{LANDING_PATH, LOGIN_PATH, RedirectIntent, Role, UNAUTHORIZED_PATH};

use crate::state::session::SessionSnapshot;

/// What a guarded subtree demands of the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardPolicy {
    /// Sign-in page unauthenticated visitors are sent to.
    pub redirect_to: String,
    /// `true` guards a member area; `false` guards a guest-only page such as
    /// sign-in, which signed-in users are bounced away from.
    pub require_auth: bool,
    pub required_role: Option<Role>,
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self { redirect_to: LOGIN_PATH.to_owned(), require_auth: true, required_role: None }
    }
}

impl GuardPolicy {
    #[must_use]
    pub fn guest_only() -> Self {
        Self { require_auth: false, ..Self::default() }
    }

    #[must_use]
    pub fn with_role(role: Role) -> Self {
        Self { required_role: Some(role), ..Self::default() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardState {
    /// Session not known yet; show the loading placeholder.
    Pending,
    Admitted,
    /// Wrong side of the auth boundary; navigate to the target.
    Redirecting(String),
    /// Signed in but missing the required role.
    Denied(String),
}

impl GuardState {
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Redirecting(target) | Self::Denied(target) => Some(target),
            Self::Pending | Self::Admitted => None,
        }
    }
}

/// Decide what the guard at `path?query` shows for `snapshot`.
///
/// `query` is the raw search string, without or with its leading `?`.
#[must_use]
pub fn evaluate(snapshot: &SessionSnapshot, policy: &GuardPolicy, path: &str, query: &str) -> GuardState {
    match snapshot {
        SessionSnapshot::Loading => GuardState::Pending,
        SessionSnapshot::Authenticated(session) => {
            if !policy.require_auth {
                let target = RedirectIntent::from_query(query)
                    .map_or_else(|| LANDING_PATH.to_owned(), |intent| intent.target_path);
                return GuardState::Redirecting(target);
            }
            match &policy.required_role {
                Some(role) if !session.has_role(role) => GuardState::Denied(UNAUTHORIZED_PATH.to_owned()),
                _ => GuardState::Admitted,
            }
        }
        SessionSnapshot::Unauthenticated { .. } | SessionSnapshot::Errored(_) if !policy.require_auth => {
            GuardState::Admitted
        }
        SessionSnapshot::Unauthenticated { reason } => {
            if path == policy.redirect_to {
                return GuardState::Admitted;
            }
            let mut intent = RedirectIntent::from_location(path, query);
            if let Some(reason) = reason {
                intent = intent.with_error(reason.code());
            }
            GuardState::Redirecting(intent.login_url(&policy.redirect_to))
        }
        SessionSnapshot::Errored(err) => {
            if path == policy.redirect_to {
                return GuardState::Admitted;
            }
            let intent = RedirectIntent::from_location(path, query).with_error(err.code());
            GuardState::Redirecting(intent.login_url(&policy.redirect_to))
        }
    }
}

/// Remembers the last navigation so a redirect fires once per state entry.
#[derive(Debug, Default)]
pub struct GuardNavigator {
    last: Option<String>,
}

impl GuardNavigator {
    /// Target to navigate to now, if any.
    pub fn next(&mut self, state: &GuardState) -> Option<String> {
        let Some(target) = state.target() else {
            self.last = None;
            return None;
        };
        if self.last.as_deref() == Some(target) {
            return None;
        }
        self.last = Some(target.to_owned());
        self.last.clone()
    }
}
