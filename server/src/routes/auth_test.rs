use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::Request;
use session::SessionPayload;
use tower::ServiceExt;

use super::*;
use crate::gateway::GatewayGrant;
use crate::routes;
use crate::state::test_helpers::{MockAnswer, MockGateway, session_for, test_app_state};

fn app(gateway: Arc<MockGateway>) -> Router {
    routes::app(test_app_state(gateway))
}

async fn call(app: Router, method: &str, uri: &str, token: Option<&str>, json: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(COOKIE, format!("session_token={token}"));
    }
    let body = match json {
        Some(json) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_owned())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_owned())
        .collect()
}

fn grant_for(user_id: &str, token: &str) -> GatewayGrant {
    GatewayGrant { session: session_for(user_id, &["member"], 3600), token: token.to_owned() }
}

// =============================================================================
// GET /api/auth/session
// =============================================================================

#[tokio::test]
async fn session_endpoint_returns_synchronized_session() {
    let gateway = Arc::new(MockGateway::new().with_answer("t1", MockAnswer::Grant(grant_for("u-7", "t1"))));
    let response = call(app(gateway.clone()), "GET", "/api/auth/session", Some("t1"), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload: SessionPayload = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(payload.session.user_id, "u-7");
    assert_eq!(gateway.validate_calls(), 1);
}

#[tokio::test]
async fn session_endpoint_without_cookie_is_401_default() {
    let response = call(app(Arc::new(MockGateway::new())), "GET", "/api/auth/session", None, None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, serde_json::json!({ "error": "default" }));
}

#[tokio::test]
async fn session_endpoint_with_dead_cookie_is_401_expired_and_clears() {
    let response = call(app(Arc::new(MockGateway::new())), "GET", "/api/auth/session", Some("dead"), None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(set_cookies(&response).len(), 1);
    assert_eq!(body_json(response).await, serde_json::json!({ "error": "session_expired" }));
}

#[tokio::test]
async fn session_endpoint_reports_gateway_outage_as_503() {
    let gateway = Arc::new(
        MockGateway::new().with_answer("t1", MockAnswer::Fail(GatewayError::Unreachable("refused".into()))),
    );
    let response = call(app(gateway), "GET", "/api/auth/session", Some("t1"), None).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    // The cookie is kept so the next request can try again.
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await, serde_json::json!({ "error": "default" }));
}

#[tokio::test]
async fn session_endpoint_reports_gateway_timeout_as_503() {
    let gateway = Arc::new(MockGateway::new().with_answer("t1", MockAnswer::Hang));
    let response = call(app(gateway), "GET", "/api/auth/session", Some("t1"), None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn user_endpoint_reads_from_gateway() {
    let gateway = Arc::new(MockGateway::new().with_answer("t1", MockAnswer::Grant(grant_for("u-8", "t1"))));
    let response = call(app(gateway.clone()), "GET", "/api/auth/user", Some("t1"), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["session"]["user_id"], "u-8");
    // One call from the synchronizer, one from the handler.
    assert_eq!(gateway.validate_calls(), 2);
}

// =============================================================================
// POST /api/auth/login
// =============================================================================

#[tokio::test]
async fn login_sets_session_cookie() {
    let gateway = Arc::new(MockGateway::new().with_credentials("ana@example.com", Ok(grant_for("u-1", "fresh"))));
    let body = r#"{"email":" ana@example.com ","password":"pw"}"#;
    let response = call(app(gateway), "POST", "/api/auth/login", None, Some(body)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("session_token=fresh"));
    assert!(cookies[0].contains("HttpOnly"));
    assert_eq!(body_json(response).await["session"]["user_id"], "u-1");
}

#[tokio::test]
async fn login_rejections_carry_gateway_code() {
    let gateway = Arc::new(MockGateway::new().with_credentials(
        "new@example.com",
        Err(GatewayError::Rejected { code: ErrorCode::EmailNotConfirmed }),
    ));
    let app = app(gateway);

    let response =
        call(app.clone(), "POST", "/api/auth/login", None, Some(r#"{"email":"new@example.com","password":"pw"}"#)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await, serde_json::json!({ "error": "email_not_confirmed" }));

    let response =
        call(app, "POST", "/api/auth/login", None, Some(r#"{"email":"who@example.com","password":"pw"}"#)).await;
    assert_eq!(body_json(response).await, serde_json::json!({ "error": "invalid_credentials" }));
}

#[tokio::test]
async fn login_with_blank_fields_never_reaches_gateway() {
    let response =
        call(app(Arc::new(MockGateway::new())), "POST", "/api/auth/login", None, Some(r#"{"email":"  ","password":""}"#))
            .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, serde_json::json!({ "error": "invalid_credentials" }));
}

#[tokio::test]
async fn login_with_unreachable_gateway_is_502() {
    let gateway = Arc::new(
        MockGateway::new().with_credentials("a@example.com", Err(GatewayError::Unreachable("refused".into()))),
    );
    let response =
        call(app(gateway), "POST", "/api/auth/login", None, Some(r#"{"email":"a@example.com","password":"pw"}"#)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await, serde_json::json!({ "error": "default" }));
}

// =============================================================================
// POST /api/auth/logout
// =============================================================================

#[tokio::test]
async fn logout_clears_cookie_even_when_gateway_fails() {
    let gateway = Arc::new(MockGateway::new().with_answer("t1", MockAnswer::Grant(grant_for("u-1", "t1"))));
    *gateway.sign_out_result.lock().unwrap() = Some(GatewayError::Upstream { status: 500 });
    let response = call(app(gateway.clone()), "POST", "/api/auth/logout", Some("t1"), None).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].contains("Max-Age=0"));
    assert_eq!(gateway.sign_out_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn logout_without_cookie_skips_gateway() {
    let gateway = Arc::new(MockGateway::new());
    let response = call(app(gateway.clone()), "POST", "/api/auth/logout", None, None).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(gateway.sign_out_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn healthz_is_ok_and_bypassed() {
    let gateway = Arc::new(MockGateway::new());
    let response = call(app(gateway.clone()), "GET", "/healthz", Some("t1"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(gateway.validate_calls(), 0);
}
