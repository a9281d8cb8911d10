use super::*;

const SESSION_BODY: &str = r#"{"session":{"user_id":"u-1","email":"u-1@example.com","roles":["member"],"issued_at":10,"expires_at":20}}"#;

#[test]
fn session_ok_decodes_payload() {
    let session = classify_session_response(200, SESSION_BODY).unwrap().unwrap();
    assert_eq!(session.user_id, "u-1");
    assert!(session.metadata.is_empty());
}

#[test]
fn session_401_default_means_signed_out() {
    assert_eq!(classify_session_response(401, r#"{"error":"default"}"#), Ok(None));
    assert_eq!(classify_session_response(401, ""), Ok(None));
}

#[test]
fn session_401_expired_is_expired() {
    assert_eq!(classify_session_response(401, r#"{"error":"session_expired"}"#), Err(AuthError::Expired));
}

#[test]
fn session_server_errors_are_gateway_errors() {
    assert_eq!(
        classify_session_response(502, r#"{"error":"default"}"#),
        Err(AuthError::Gateway("session request failed: 502".to_owned()))
    );
    assert!(matches!(classify_session_response(200, "not json"), Err(AuthError::Gateway(_))));
}

#[test]
fn sign_in_maps_rejection_codes() {
    assert_eq!(
        classify_sign_in_response(401, r#"{"error":"invalid_credentials"}"#),
        Err(AuthError::InvalidCredentials)
    );
    assert_eq!(
        classify_sign_in_response(401, r#"{"error":"email_not_confirmed"}"#),
        Err(AuthError::EmailNotConfirmed)
    );
    assert_eq!(classify_sign_in_response(200, SESSION_BODY).map(|s| s.user_id), Ok("u-1".to_owned()));
}

#[test]
fn sign_in_upstream_failure_is_transient() {
    let err = classify_sign_in_response(502, "").unwrap_err();
    assert!(err.is_transient());
}

#[test]
fn session_outage_answer_leaves_store_errored() {
    let result = classify_session_response(503, r#"{"error":"default"}"#);
    assert_eq!(result, Err(AuthError::Gateway("session request failed: 503".to_owned())));

    let snapshot = crate::state::session::SessionSnapshot::from_fetch(result, 0);
    assert_eq!(snapshot.status(), crate::state::session::SessionStatus::Errored);
}
