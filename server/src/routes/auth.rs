//! Auth routes for reading the session and signing in and out.
//!
//! None of these handlers touch `Set-Cookie` directly. Sign-in and sign-out
//! attach a [`CookieDirective`] and the synchronizer writes it.

use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use session::{ErrorCode, ErrorPayload, SessionPayload, SignInRequest};

use crate::cookies::CookieDirective;
use crate::gateway::{GatewayError, with_timeout};
use crate::state::AppState;
use crate::sync::{AuthRejection, AuthSession};

/// `GET /api/auth/session`: the session as the synchronizer saw it on this
/// request. No second gateway call.
pub async fn current_session(auth: AuthSession) -> Json<SessionPayload> {
    Json(SessionPayload { session: auth.session })
}

/// `GET /api/auth/user`: read the session straight from the gateway without
/// refreshing it.
pub async fn current_user(State(state): State<AppState>, auth: AuthSession) -> Response {
    match with_timeout(state.config.gateway.timeout, state.gateway.get_user(&auth.token)).await {
        Ok(session) => Json(SessionPayload { session }).into_response(),
        Err(err) => gateway_error_response(&err),
    }
}

/// `POST /api/auth/login`: exchange credentials for a session cookie.
pub async fn login(State(state): State<AppState>, Json(body): Json<SignInRequest>) -> Response {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return AuthRejection(ErrorCode::InvalidCredentials).into_response();
    }

    match with_timeout(state.config.gateway.timeout, state.gateway.sign_in(email, &body.password)).await {
        Ok(grant) => {
            let now = time::OffsetDateTime::now_utc().unix_timestamp();
            let directive =
                CookieDirective::Set { token: grant.token, max_age_secs: grant.session.remaining_secs(now) };
            tracing::info!(user_id = %grant.session.user_id, "signed in");
            (Extension(directive), Json(SessionPayload { session: grant.session })).into_response()
        }
        Err(err) => gateway_error_response(&err),
    }
}

/// `POST /api/auth/logout`: revoke at the gateway, then clear the cookie
/// whether or not the gateway agreed.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let token = jar.get(&state.config.cookie.name).map(Cookie::value).unwrap_or_default();
    if !token.is_empty() {
        if let Err(err) = with_timeout(state.config.gateway.timeout, state.gateway.sign_out(token)).await {
            tracing::warn!(error = %err, "gateway sign-out failed; clearing cookie anyway");
        }
    }
    (Extension(CookieDirective::Clear), StatusCode::NO_CONTENT)
}

/// Rejections become `401` with the gateway's code; transport trouble `502`.
fn gateway_error_response(err: &GatewayError) -> Response {
    if err.is_rejection() {
        return AuthRejection(err.error_code()).into_response();
    }
    tracing::warn!(error = %err, "session gateway call failed");
    (StatusCode::BAD_GATEWAY, Json(ErrorPayload { error: ErrorCode::Default })).into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
