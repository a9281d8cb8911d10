//! Auth error taxonomy and the closed set of URL error codes.
//!
//! `AuthError` is what the gateway boundaries produce; `ErrorCode` is what
//! travels in `?error=` and JSON bodies. Every error maps to exactly one code,
//! so adding a kind means adding one variant and one mapping arm.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error code carried in the `error` query parameter.
///
/// Serialized as its query-string spelling. Deserialization never fails on an
/// unknown string; it folds into [`ErrorCode::Default`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    SessionExpired,
    AccessDenied,
    InvalidCredentials,
    EmailNotConfirmed,
    #[default]
    Default,
}

impl ErrorCode {
    /// Query-string spelling of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionExpired => "session_expired",
            Self::AccessDenied => "access_denied",
            Self::InvalidCredentials => "invalid_credentials",
            Self::EmailNotConfirmed => "email_not_confirmed",
            Self::Default => "default",
        }
    }

    /// Parse a code, folding anything unrecognized into [`ErrorCode::Default`].
    #[must_use]
    pub fn from_param(raw: &str) -> Self {
        raw.parse().unwrap_or(Self::Default)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_param(&raw))
    }
}

/// Returned by [`ErrorCode::from_str`] for codes outside the closed set.
#[derive(Debug, thiserror::Error)]
#[error("unknown auth error code: {0}")]
pub struct UnknownErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "session_expired" => Ok(Self::SessionExpired),
            "access_denied" => Ok(Self::AccessDenied),
            "invalid_credentials" => Ok(Self::InvalidCredentials),
            "email_not_confirmed" => Ok(Self::EmailNotConfirmed),
            "default" => Ok(Self::Default),
            other => Err(UnknownErrorCode(other.to_owned())),
        }
    }
}

/// Failure surfaced by the session boundaries (server edge, client store).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The session ended or was revoked.
    #[error("session expired")]
    Expired,
    /// Authenticated but not allowed.
    #[error("access denied")]
    AccessDenied,
    /// Sign-in rejected.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Sign-in blocked until the email is confirmed.
    #[error("email not confirmed")]
    EmailNotConfirmed,
    /// The gateway could not be reached.
    #[error("network error: {0}")]
    Network(String),
    /// The gateway answered with something other than a session.
    #[error("gateway error: {0}")]
    Gateway(String),
    #[error("unknown auth error")]
    Unknown,
}

impl AuthError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Expired => ErrorCode::SessionExpired,
            Self::AccessDenied => ErrorCode::AccessDenied,
            Self::InvalidCredentials => ErrorCode::InvalidCredentials,
            Self::EmailNotConfirmed => ErrorCode::EmailNotConfirmed,
            Self::Network(_) | Self::Gateway(_) | Self::Unknown => ErrorCode::Default,
        }
    }

    /// Inverse of [`AuthError::code`] for codes that name a specific failure.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        match code {
            ErrorCode::SessionExpired => Self::Expired,
            ErrorCode::AccessDenied => Self::AccessDenied,
            ErrorCode::InvalidCredentials => Self::InvalidCredentials,
            ErrorCode::EmailNotConfirmed => Self::EmailNotConfirmed,
            ErrorCode::Default => Self::Unknown,
        }
    }

    /// Transport or upstream failures that leave the session state unknown.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Gateway(_))
    }
}
