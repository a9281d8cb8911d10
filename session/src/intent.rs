//! Return-after-login intent carried in the login URL.
//!
//! ENCODING
//! ========
//! The original path+query is form-urlencoded exactly once when written into
//! `redirect=` and decoded exactly once when read back. Callers holding values
//! from a router query map (already decoded) use [`RedirectIntent::from_params`];
//! callers holding a raw query string use [`RedirectIntent::from_query`]. Never
//! both.

use url::form_urlencoded;

use crate::{ErrorCode, LANDING_PATH};

/// Query key holding the encoded return target.
pub const REDIRECT_PARAM: &str = "redirect";

/// Query key holding the [`ErrorCode`].
pub const ERROR_PARAM: &str = "error";

/// Where the user was trying to go when a guard or the server edge sent them
/// to the login page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectIntent {
    /// Same-origin path plus optional query, unencoded.
    pub target_path: String,
    pub error_code: Option<ErrorCode>,
}

impl RedirectIntent {
    #[must_use]
    pub fn new(target_path: impl Into<String>) -> Self {
        Self { target_path: target_path.into(), error_code: None }
    }

    /// Capture the current location. `query` may be empty or start with `?`.
    #[must_use]
    pub fn from_location(path: &str, query: &str) -> Self {
        let query = query.trim_start_matches('?');
        if query.is_empty() {
            Self::new(path)
        } else {
            Self::new(format!("{path}?{query}"))
        }
    }

    #[must_use]
    pub fn with_error(mut self, code: ErrorCode) -> Self {
        self.error_code = Some(code);
        self
    }

    /// Build `login_path?error=…&redirect=…`.
    #[must_use]
    pub fn login_url(&self, login_path: &str) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(code) = self.error_code {
            query.append_pair(ERROR_PARAM, code.as_str());
        }
        query.append_pair(REDIRECT_PARAM, &self.target_path);
        let separator = if login_path.contains('?') { '&' } else { '?' };
        format!("{login_path}{separator}{}", query.finish())
    }

    /// Rebuild from already-decoded query values.
    ///
    /// Returns `None` when there is no redirect or it points off-site.
    #[must_use]
    pub fn from_params(redirect: Option<&str>, error: Option<&str>) -> Option<Self> {
        let target = redirect.filter(|t| is_safe_target(t))?;
        Some(Self { target_path: target.to_owned(), error_code: error.map(ErrorCode::from_param) })
    }

    /// Rebuild from a raw (still encoded) query string, decoding once.
    #[must_use]
    pub fn from_query(raw_query: &str) -> Option<Self> {
        let mut redirect = None;
        let mut error = None;
        for (key, value) in form_urlencoded::parse(raw_query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                REDIRECT_PARAM if redirect.is_none() => redirect = Some(value.into_owned()),
                ERROR_PARAM if error.is_none() => error = Some(value.into_owned()),
                _ => {}
            }
        }
        Self::from_params(redirect.as_deref(), error.as_deref())
    }

    /// Post-sign-in destination: the decoded target when safe, else the landing page.
    #[must_use]
    pub fn return_target(redirect: Option<&str>) -> String {
        Self::from_params(redirect, None).map_or_else(|| LANDING_PATH.to_owned(), |intent| intent.target_path)
    }
}

/// Only same-origin absolute paths may be used as return targets.
#[must_use]
pub fn is_safe_target(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}

#[cfg(test)]
#[path = "intent_test.rs"]
mod tests;
