//! Request session synchronizer.
//!
//! SYSTEM CONTEXT
//! ==============
//! Runs once per intercepted request, before any handler or page render. It
//! reconciles the session cookie with the gateway, classifies the request for
//! downstream extractors, and owns the only write of the session cookie.
//!
//! FAILURE POLICY
//! ==============
//! - Gateway rejects the token: clear the cookie; protected routes redirect to
//!   the login page with `error=session_expired`.
//! - Gateway unreachable or slow: leave the cookie alone and treat this one
//!   request as unverified. Protected routes fail closed (login redirect),
//!   public routes fail open (render anonymously, auth API answers `503`).
//! - Never a 500.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use session::{ErrorCode, ErrorPayload, RedirectIntent, Session};

use crate::cookies::CookieDirective;
use crate::gateway::{GatewayError, GatewayGrant, with_timeout};
use crate::matcher::RouteClass;
use crate::state::AppState;

// =============================================================================
// REQUEST CLASSIFICATION
// =============================================================================

/// Session state of the current request, inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSession {
    Anonymous {
        /// The request carried a cookie the gateway rejected.
        expired: bool,
    },
    Authenticated {
        session: Session,
        token: String,
    },
    /// A cookie was presented but the gateway could not be asked about it.
    /// Rendered like `Anonymous`; the auth API reports it as an outage.
    Unverified,
}

impl RequestSession {
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated { session, .. } => Some(session),
            Self::Anonymous { .. } | Self::Unverified => None,
        }
    }
}

/// Outcome of asking the gateway about the presented cookie.
#[derive(Debug)]
enum Reconciled {
    NoCookie,
    Valid { grant: GatewayGrant, renew: bool },
    Rejected,
    Unavailable(GatewayError),
}

async fn reconcile(state: &AppState, token: Option<&str>, now: i64) -> Reconciled {
    let Some(token) = token else {
        return Reconciled::NoCookie;
    };

    let result = with_timeout(state.config.gateway.timeout, state.gateway.validate_or_refresh(token)).await;
    match result {
        Ok(grant) if grant.session.is_expired(now) => Reconciled::Rejected,
        Ok(grant) => {
            let renew =
                grant.token != token || grant.session.expires_within(now, state.config.refresh_window_secs);
            Reconciled::Valid { grant, renew }
        }
        Err(err) if err.is_rejection() => Reconciled::Rejected,
        Err(err) => Reconciled::Unavailable(err),
    }
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

/// Axum middleware; install with `axum::middleware::from_fn_with_state`.
pub async fn synchronize(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    let class = state.config.matcher.classify(&path);
    if class == RouteClass::Bypass {
        return next.run(req).await;
    }

    let return_to = RedirectIntent::from_location(&path, req.uri().query().unwrap_or_default());
    let token = CookieJar::from_headers(req.headers())
        .get(&state.config.cookie.name)
        .map(|c| c.value().to_owned())
        .filter(|t| !t.is_empty());

    let now = time::OffsetDateTime::now_utc().unix_timestamp();
    let protected = class == RouteClass::Protected;

    let (classification, own_directive) = match reconcile(&state, token.as_deref(), now).await {
        Reconciled::NoCookie => {
            if protected {
                tracing::info!(%path, "no session cookie on protected route, redirecting to login");
                return login_redirect(&state, &return_to, None);
            }
            (RequestSession::Anonymous { expired: false }, None)
        }
        Reconciled::Valid { grant, renew } => {
            let directive = renew.then(|| CookieDirective::Set {
                token: grant.token.clone(),
                max_age_secs: grant.session.remaining_secs(now),
            });
            if renew {
                tracing::debug!(%path, user_id = %grant.session.user_id, "renewing session cookie");
            }
            (RequestSession::Authenticated { session: grant.session, token: grant.token }, directive)
        }
        Reconciled::Rejected => {
            if protected {
                tracing::info!(%path, "session rejected on protected route, redirecting to login");
                let intent = return_to.with_error(ErrorCode::SessionExpired);
                return login_redirect(&state, &intent, Some(CookieDirective::Clear));
            }
            tracing::debug!(%path, "session rejected on public route, clearing cookie");
            (RequestSession::Anonymous { expired: true }, Some(CookieDirective::Clear))
        }
        Reconciled::Unavailable(err) => {
            tracing::warn!(error = %err, %path, protected, "session gateway unavailable");
            if protected {
                return login_redirect(&state, &return_to, None);
            }
            (RequestSession::Unverified, None)
        }
    };

    req.extensions_mut().insert(classification);
    let mut response = next.run(req).await;

    // A handler's directive (sign-in, sign-out) supersedes the synchronizer's.
    let directive = response.extensions_mut().remove::<CookieDirective>().or(own_directive);
    apply_directive(&state, response, directive)
}

fn login_redirect(state: &AppState, intent: &RedirectIntent, directive: Option<CookieDirective>) -> Response {
    let response = Redirect::temporary(&intent.login_url(&state.config.login_path)).into_response();
    apply_directive(state, response, directive)
}

fn apply_directive(state: &AppState, response: Response, directive: Option<CookieDirective>) -> Response {
    match directive {
        Some(directive) => {
            let jar = CookieJar::new().add(directive.into_cookie(&state.config.cookie));
            (jar, response).into_response()
        }
        None => response,
    }
}

// =============================================================================
// EXTRACTORS
// =============================================================================

impl<S: Send + Sync> FromRequestParts<S> for RequestSession {
    type Rejection = std::convert::Infallible;

    /// Requests the synchronizer never saw are anonymous.
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or(Self::Anonymous { expired: false }))
    }
}

/// Handler parameter requiring an authenticated request.
pub struct AuthSession {
    pub session: Session,
    pub token: String,
}

/// `401` with the error code the client store understands.
pub struct AuthRejection(pub ErrorCode);

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(ErrorPayload { error: self.0 })).into_response()
    }
}

/// `503` when the session could not be verified on this request. Distinct
/// from `401 default` so the client does not mistake an outage for sign-out.
pub struct GatewayUnavailable;

impl IntoResponse for GatewayUnavailable {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, Json(ErrorPayload { error: ErrorCode::Default })).into_response()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthSession {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(request_session) = RequestSession::from_request_parts(parts, state).await;
        match request_session {
            RequestSession::Authenticated { session, token } => Ok(Self { session, token }),
            RequestSession::Unverified => Err(GatewayUnavailable.into_response()),
            RequestSession::Anonymous { expired: true } => {
                Err(AuthRejection(ErrorCode::SessionExpired).into_response())
            }
            RequestSession::Anonymous { expired: false } => Err(AuthRejection(ErrorCode::Default).into_response()),
        }
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
