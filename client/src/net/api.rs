//! REST API helpers for the auth endpoints.
//!
//! Client-side (hydrate): real HTTP calls via `gloo-net`.
//! Server-side (SSR): stubs, since the session is only fetched after
//! hydration.
//!
//! ERROR HANDLING
//! ==============
//! Every response is folded into `session::AuthError` by the pure
//! `classify_*` helpers, so status-code handling is testable natively and a
//! failed call never panics during hydration.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use session::{AuthError, Session};

#[cfg(any(test, feature = "hydrate"))]
use session::{ErrorCode, ErrorPayload, SessionPayload};

use crate::state::session::SessionGateway;

/// Browser gateway backed by this app's `/api/auth/*` endpoints.
pub struct HttpSessionGateway;

impl SessionGateway for HttpSessionGateway {
    fn fetch_session(&self) -> LocalBoxFuture<'static, Result<Option<Session>, AuthError>> {
        fetch_session().boxed_local()
    }

    fn sign_out(&self) -> LocalBoxFuture<'static, Result<(), AuthError>> {
        logout().boxed_local()
    }
}

#[cfg(any(test, feature = "hydrate"))]
fn error_code(body: &str) -> ErrorCode {
    serde_json::from_str::<ErrorPayload>(body).map_or(ErrorCode::Default, |payload| payload.error)
}

/// Map a `/api/auth/session` response. `401 default` means "no session",
/// `401 session_expired` means the session just ended, and `503` means the
/// server could not verify the session on this request.
#[cfg(any(test, feature = "hydrate"))]
fn classify_session_response(status: u16, body: &str) -> Result<Option<Session>, AuthError> {
    match status {
        200 => serde_json::from_str::<SessionPayload>(body)
            .map(|payload| Some(payload.session))
            .map_err(|e| AuthError::Gateway(format!("malformed session payload: {e}"))),
        401 => match error_code(body) {
            ErrorCode::SessionExpired => Err(AuthError::Expired),
            _ => Ok(None),
        },
        status => Err(AuthError::Gateway(format!("session request failed: {status}"))),
    }
}

/// Map a `/api/auth/login` response.
#[cfg(any(test, feature = "hydrate"))]
fn classify_sign_in_response(status: u16, body: &str) -> Result<Session, AuthError> {
    match status {
        200 => serde_json::from_str::<SessionPayload>(body)
            .map(|payload| payload.session)
            .map_err(|e| AuthError::Gateway(format!("malformed session payload: {e}"))),
        401 | 403 => Err(AuthError::from_code(error_code(body))),
        status => Err(AuthError::Gateway(format!("sign-in request failed: {status}"))),
    }
}

/// Fetch the session the server reconciled for this request.
///
/// # Errors
///
/// `Expired` when the server says the session just ended; `Network` or
/// `Gateway` when it could not answer.
pub async fn fetch_session() -> Result<Option<Session>, AuthError> {
    #[cfg(feature = "hydrate")]
    {
        let resp = gloo_net::http::Request::get("/api/auth/session")
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| AuthError::Network(e.to_string()))?;
        classify_session_response(status, &body)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Ok(None)
    }
}

/// Sign in with email and password via `POST /api/auth/login`. The server
/// sets the session cookie on success.
///
/// # Errors
///
/// The rejection the gateway gave (e.g. `InvalidCredentials`), or
/// `Network`/`Gateway` on transport failure.
pub async fn sign_in(email: &str, password: &str) -> Result<Session, AuthError> {
    #[cfg(feature = "hydrate")]
    {
        let request = session::SignInRequest { email: email.to_owned(), password: password.to_owned() };
        let resp = gloo_net::http::Request::post("/api/auth/login")
            .json(&request)
            .map_err(|e| AuthError::Network(e.to_string()))?
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| AuthError::Network(e.to_string()))?;
        classify_sign_in_response(status, &body)
    }
    #[cfg(not(feature = "hydrate"))]
    {
        let _ = (email, password);
        Err(AuthError::Network("not available on server".to_owned()))
    }
}

/// Revoke the session via `POST /api/auth/logout`.
///
/// # Errors
///
/// `Network` when the request never completed, `Gateway` on a non-2xx answer.
pub async fn logout() -> Result<(), AuthError> {
    #[cfg(feature = "hydrate")]
    {
        let resp = gloo_net::http::Request::post("/api/auth/logout")
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !resp.ok() {
            return Err(AuthError::Gateway(format!("logout failed: {}", resp.status())));
        }
        Ok(())
    }
    #[cfg(not(feature = "hydrate"))]
    {
        Ok(())
    }
}
