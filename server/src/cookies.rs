//! Session cookie construction.
//!
//! Handlers never write the session cookie themselves. They attach a
//! [`CookieDirective`] to their response and the synchronizer turns the final
//! directive into exactly one `Set-Cookie`.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::CookieSettings;

/// Requested change to the session cookie, carried as a response extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieDirective {
    /// Write `token`, valid for `max_age_secs`.
    Set { token: String, max_age_secs: i64 },
    /// Remove the cookie.
    Clear,
}

impl CookieDirective {
    #[must_use]
    pub fn into_cookie(self, settings: &CookieSettings) -> Cookie<'static> {
        match self {
            Self::Set { token, max_age_secs } => session_cookie(settings, token, max_age_secs),
            Self::Clear => clear_session_cookie(settings),
        }
    }
}

/// HttpOnly, SameSite=Lax, Path=/ session cookie.
#[must_use]
pub fn session_cookie(settings: &CookieSettings, token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((settings.name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .max_age(Duration::seconds(max_age_secs.max(0)))
        .build()
}

/// Removal cookie carrying the same flags as the one it replaces.
#[must_use]
pub fn clear_session_cookie(settings: &CookieSettings) -> Cookie<'static> {
    session_cookie(settings, String::new(), 0)
}

#[cfg(test)]
#[path = "cookies_test.rs"]
mod tests;
