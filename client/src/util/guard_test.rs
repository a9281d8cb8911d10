use session::{AuthError, Session};

use super::*;

fn session_with(roles: &[&str]) -> SessionSnapshot {
    SessionSnapshot::Authenticated(Session {
        user_id: "u-1".to_owned(),
        email: "u-1@example.com".to_owned(),
        roles: roles.iter().map(|r| Role::new(*r)).collect(),
        issued_at: 0,
        expires_at: i64::MAX,
        metadata: Default::default(),
    })
}

fn signed_out() -> SessionSnapshot {
    SessionSnapshot::Unauthenticated { reason: None }
}

// =============================================================================
// MEMBER AREAS
// =============================================================================

#[test]
fn loading_is_pending_for_every_policy() {
    for policy in [GuardPolicy::default(), GuardPolicy::guest_only(), GuardPolicy::with_role(Role::new("admin"))] {
        assert_eq!(evaluate(&SessionSnapshot::Loading, &policy, "/dashboard", ""), GuardState::Pending);
    }
}

#[test]
fn signed_in_member_is_admitted() {
    let state = evaluate(&session_with(&["member"]), &GuardPolicy::default(), "/dashboard", "");
    assert_eq!(state, GuardState::Admitted);
}

#[test]
fn signed_out_visitor_is_sent_to_login_with_return_path() {
    let state = evaluate(&signed_out(), &GuardPolicy::default(), "/dashboard", "");
    assert_eq!(state, GuardState::Redirecting("/auth/login?redirect=%2Fdashboard".to_owned()));
}

#[test]
fn return_path_keeps_the_query_string() {
    let state = evaluate(&signed_out(), &GuardPolicy::default(), "/dashboard", "?tab=2");
    assert_eq!(state, GuardState::Redirecting("/auth/login?redirect=%2Fdashboard%3Ftab%3D2".to_owned()));
}

#[test]
fn expired_session_redirect_carries_error_code() {
    let snapshot = SessionSnapshot::Unauthenticated { reason: Some(AuthError::Expired) };
    let state = evaluate(&snapshot, &GuardPolicy::default(), "/dashboard", "");
    assert_eq!(state, GuardState::Redirecting("/auth/login?error=session_expired&redirect=%2Fdashboard".to_owned()));
}

#[test]
fn errored_snapshot_redirects_with_default_error() {
    let snapshot = SessionSnapshot::Errored(AuthError::Network("offline".into()));
    let state = evaluate(&snapshot, &GuardPolicy::default(), "/dashboard", "");
    assert_eq!(state, GuardState::Redirecting("/auth/login?error=default&redirect=%2Fdashboard".to_owned()));
}

#[test]
fn custom_redirect_target_is_honored() {
    let policy = GuardPolicy { redirect_to: "/entrar".to_owned(), ..GuardPolicy::default() };
    let state = evaluate(&signed_out(), &policy, "/dashboard", "");
    assert_eq!(state, GuardState::Redirecting("/entrar?redirect=%2Fdashboard".to_owned()));
}

#[test]
fn guard_on_the_login_page_itself_does_not_loop() {
    let state = evaluate(&signed_out(), &GuardPolicy::default(), "/auth/login", "");
    assert_eq!(state, GuardState::Admitted);
}

// =============================================================================
// ROLES
// =============================================================================

#[test]
fn missing_role_is_denied() {
    let policy = GuardPolicy::with_role(Role::new("admin"));
    let state = evaluate(&session_with(&["member"]), &policy, "/admin", "");
    assert_eq!(state, GuardState::Denied("/unauthorized".to_owned()));
}

#[test]
fn matching_role_is_admitted() {
    let policy = GuardPolicy::with_role(Role::new("admin"));
    assert_eq!(evaluate(&session_with(&["member", "admin"]), &policy, "/admin", ""), GuardState::Admitted);
}

#[test]
fn role_guard_still_requires_sign_in_first() {
    let policy = GuardPolicy::with_role(Role::new("admin"));
    let state = evaluate(&signed_out(), &policy, "/admin", "");
    assert_eq!(state, GuardState::Redirecting("/auth/login?redirect=%2Fadmin".to_owned()));
}

// =============================================================================
// GUEST-ONLY PAGES
// =============================================================================

#[test]
fn guest_page_admits_signed_out_and_errored_visitors() {
    let policy = GuardPolicy::guest_only();
    assert_eq!(evaluate(&signed_out(), &policy, "/auth/login", ""), GuardState::Admitted);
    let errored = SessionSnapshot::Errored(AuthError::Gateway("502".into()));
    assert_eq!(evaluate(&errored, &policy, "/auth/login", ""), GuardState::Admitted);
}

#[test]
fn guest_page_sends_signed_in_users_to_landing() {
    let state = evaluate(&session_with(&["member"]), &GuardPolicy::guest_only(), "/auth/login", "");
    assert_eq!(state, GuardState::Redirecting("/dashboard".to_owned()));
}

#[test]
fn guest_page_honors_decoded_return_target() {
    let state = evaluate(
        &session_with(&["member"]),
        &GuardPolicy::guest_only(),
        "/auth/login",
        "?error=session_expired&redirect=%2Fdashboard%3Ftab%3D2",
    );
    assert_eq!(state, GuardState::Redirecting("/dashboard?tab=2".to_owned()));
}

#[test]
fn guest_page_ignores_off_site_return_target() {
    let state = evaluate(
        &session_with(&["member"]),
        &GuardPolicy::guest_only(),
        "/auth/login",
        "redirect=https%3A%2F%2Fevil.example",
    );
    assert_eq!(state, GuardState::Redirecting("/dashboard".to_owned()));
}

// =============================================================================
// NAVIGATOR
// =============================================================================

#[test]
fn navigator_fires_once_per_state_entry() {
    let mut navigator = GuardNavigator::default();
    let redirect = GuardState::Redirecting("/auth/login?redirect=%2Fdashboard".to_owned());

    assert_eq!(navigator.next(&GuardState::Pending), None);
    assert_eq!(navigator.next(&redirect).as_deref(), Some("/auth/login?redirect=%2Fdashboard"));
    assert_eq!(navigator.next(&redirect), None);

    assert_eq!(navigator.next(&GuardState::Admitted), None);
    assert!(navigator.next(&redirect).is_some());
}

#[test]
fn navigator_fires_again_for_a_different_target() {
    let mut navigator = GuardNavigator::default();
    assert!(navigator.next(&GuardState::Redirecting("/a".to_owned())).is_some());
    assert_eq!(navigator.next(&GuardState::Denied("/unauthorized".to_owned())).as_deref(), Some("/unauthorized"));
}
