//! Session gateway: the external identity service.
//!
//! DESIGN
//! ======
//! The gateway owns the session; this server only asks it to validate,
//! refresh, sign in, and sign out. `SessionGateway` is the seam: the HTTP
//! client below talks to the real service, tests substitute mocks.
//!
//! ERROR HANDLING
//! ==============
//! `GatewayError` separates definitive rejections (the token is dead, the
//! credentials are wrong) from transport failures (timeout, connection
//! refused, 5xx). Callers treat the first as a fact about the session and the
//! second as "unknown for this request only".

use std::time::Duration;

use serde::Deserialize;
use session::{AuthError, ErrorCode, Session};

use crate::config::GatewayConfig;

const CONNECT_TIMEOUT_SECS: u64 = 2;

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// No answer within the configured bound.
    #[error("gateway timed out")]
    Timeout,
    /// Connection-level failure.
    #[error("gateway unreachable: {0}")]
    Unreachable(String),
    /// The gateway answered and said no.
    #[error("gateway rejected request: {code}")]
    Rejected { code: ErrorCode },
    /// The gateway answered with a server-side failure.
    #[error("gateway returned status {status}")]
    Upstream { status: u16 },
    /// The gateway answered with a body we could not read.
    #[error("gateway response parse failed: {0}")]
    Decode(String),
}

impl GatewayError {
    /// True when the gateway definitively refused; false for transport trouble.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Rejected { code } => *code,
            Self::Timeout | Self::Unreachable(_) | Self::Upstream { .. } | Self::Decode(_) => ErrorCode::Default,
        }
    }
}

impl From<GatewayError> for AuthError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected { code } => Self::from_code(code),
            GatewayError::Timeout => Self::Network("gateway timed out".to_owned()),
            GatewayError::Unreachable(msg) => Self::Network(msg),
            other @ (GatewayError::Upstream { .. } | GatewayError::Decode(_)) => Self::Gateway(other.to_string()),
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// A session together with the token that now represents it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayGrant {
    pub session: Session,
    /// May differ from the presented token when the gateway rotates it.
    pub token: String,
}

/// Operations the identity gateway exposes. Enables mocking in tests.
#[async_trait::async_trait]
pub trait SessionGateway: Send + Sync {
    /// Validate a token, refreshing it if the gateway decides to.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Rejected`] with `session_expired` for dead tokens;
    /// transport variants otherwise.
    async fn validate_or_refresh(&self, token: &str) -> Result<GatewayGrant, GatewayError>;

    /// Revoke the session behind `token`.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError`] if the gateway cannot be reached or refuses.
    async fn sign_out(&self, token: &str) -> Result<(), GatewayError>;

    /// Read the session behind `token` without refreshing it.
    ///
    /// # Errors
    ///
    /// Same as [`SessionGateway::validate_or_refresh`].
    async fn get_user(&self, token: &str) -> Result<Session, GatewayError>;

    /// Exchange credentials for a new session.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Rejected`] with `invalid_credentials` or
    /// `email_not_confirmed`; transport variants otherwise.
    async fn sign_in(&self, email: &str, password: &str) -> Result<GatewayGrant, GatewayError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// `SessionGateway` over the gateway's JSON HTTP API.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct UserBody {
    session: Session,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorCode,
}

impl HttpGateway {
    /// Build the client. The request timeout bounds every gateway call.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unreachable`] if the HTTP client cannot be built.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(config.timeout))
            .build()
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone(), api_key: config.api_key.clone() })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.api_key {
            Some(key) => builder.header("apikey", key),
            None => builder,
        }
    }

    async fn send(builder: reqwest::RequestBuilder, fallback: ErrorCode) -> Result<String, GatewayError> {
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_transport_error)?;
        check_status(status, &body, fallback)?;
        Ok(body)
    }
}

#[async_trait::async_trait]
impl SessionGateway for HttpGateway {
    async fn validate_or_refresh(&self, token: &str) -> Result<GatewayGrant, GatewayError> {
        let builder = self.request(reqwest::Method::POST, "/session/refresh").bearer_auth(token);
        let body = Self::send(builder, ErrorCode::SessionExpired).await?;
        parse_body(&body)
    }

    async fn sign_out(&self, token: &str) -> Result<(), GatewayError> {
        let builder = self.request(reqwest::Method::POST, "/session/sign-out").bearer_auth(token);
        Self::send(builder, ErrorCode::SessionExpired).await.map(|_| ())
    }

    async fn get_user(&self, token: &str) -> Result<Session, GatewayError> {
        let builder = self.request(reqwest::Method::GET, "/session/user").bearer_auth(token);
        let body = Self::send(builder, ErrorCode::SessionExpired).await?;
        parse_body::<UserBody>(&body).map(|b| b.session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<GatewayGrant, GatewayError> {
        let builder = self
            .request(reqwest::Method::POST, "/session/sign-in")
            .json(&serde_json::json!({ "email": email, "password": password }));
        let body = Self::send(builder, ErrorCode::InvalidCredentials).await?;
        parse_body(&body)
    }
}

/// Bound a gateway call; an elapsed deadline becomes [`GatewayError::Timeout`].
///
/// # Errors
///
/// Returns the call's own error or [`GatewayError::Timeout`].
pub async fn with_timeout<T, F>(timeout: Duration, call: F) -> Result<T, GatewayError>
where
    F: std::future::Future<Output = Result<T, GatewayError>>,
{
    tokio::time::timeout(timeout, call).await.unwrap_or(Err(GatewayError::Timeout))
}

fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() { GatewayError::Timeout } else { GatewayError::Unreachable(err.to_string()) }
}

/// Classify a gateway status code. 4xx is a rejection carrying the body's
/// error code (or `fallback` when absent); 5xx and anything unexpected is an
/// upstream failure.
pub(crate) fn check_status(status: u16, body: &str, fallback: ErrorCode) -> Result<(), GatewayError> {
    match status {
        200..=299 => Ok(()),
        400..=499 => {
            let code = serde_json::from_str::<ErrorBody>(body).map_or(fallback, |b| b.error);
            let code = if code == ErrorCode::Default { fallback } else { code };
            Err(GatewayError::Rejected { code })
        }
        _ => Err(GatewayError::Upstream { status }),
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, GatewayError> {
    serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "gateway_test.rs"]
mod tests;
