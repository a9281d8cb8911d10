//! Shared session model for the server edge and the browser client.
//!
//! This crate owns the types both sides agree on: the session issued by the
//! identity gateway, the closed set of auth error codes carried in redirect
//! URLs, and the return-after-login intent. The server serializes these into
//! cookies, JSON bodies and query strings; the client reads them back.

pub mod error;
pub mod intent;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub use error::{AuthError, ErrorCode};
pub use intent::{ERROR_PARAM, REDIRECT_PARAM, RedirectIntent};

/// Default login route. Guards and the server edge both redirect here.
pub const LOGIN_PATH: &str = "/auth/login";

/// Where authenticated users land when they hit a login/register page.
pub const LANDING_PATH: &str = "/dashboard";

/// Where role mismatches are sent. Re-authenticating would not help.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

// =============================================================================
// ROLE
// =============================================================================

/// Coarse authorization label attached to a session, compared by equality.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// Server-validated proof of identity. Owned by the gateway; everyone else
/// holds a read-only copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Gateway-assigned user identifier.
    pub user_id: String,
    /// Primary email address.
    pub email: String,
    /// Roles granted to the user.
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    /// Seconds since the Unix epoch when the session was issued.
    pub issued_at: i64,
    /// Seconds since the Unix epoch when the session stops being valid.
    pub expires_at: i64,
    /// Free-form gateway metadata (display name, provider, ...).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Session {
    /// True once `now` has reached `expires_at`.
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    /// True when the session is still valid but ends within `window_secs`.
    #[must_use]
    pub fn expires_within(&self, now: i64, window_secs: i64) -> bool {
        !self.is_expired(now) && self.expires_at - now <= window_secs
    }

    /// Seconds left before expiry, clamped at zero.
    #[must_use]
    pub fn remaining_secs(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }

    #[must_use]
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}

// =============================================================================
// WIRE DTOS
// =============================================================================

/// Body of a successful `GET /api/auth/session` or `POST /api/auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub session: Session,
}

/// Body of a failed auth API call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: ErrorCode,
}

/// Body of `POST /api/auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
