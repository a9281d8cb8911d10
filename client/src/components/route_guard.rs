//! Route guard components.
//!
//! SYSTEM CONTEXT
//! ==============
//! Wrap a page body to gate it on the session. The decision comes from
//! `util::guard::evaluate`; this component only renders the result and
//! performs the navigation side effect.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};
use session::{LOGIN_PATH, Role};

use crate::state::session::use_session;
use crate::util::guard::{GuardNavigator, GuardPolicy, GuardState, evaluate};

/// Gate `children` on the current session.
///
/// With `require_auth` (the default) signed-out visitors are sent to
/// `redirect_to` with a return path, and signed-in users without
/// `required_role` are sent to the unauthorized page. With
/// `require_auth=false` the page is guest-only.
#[component]
pub fn RouteGuard(
    #[prop(optional, into)] redirect_to: Option<String>,
    #[prop(default = true)] require_auth: bool,
    #[prop(optional, into)] required_role: Option<String>,
    /// Shown while the session is loading.
    #[prop(optional, into)]
    fallback: Option<ViewFn>,
    children: ChildrenFn,
) -> impl IntoView {
    let session = use_session();
    let location = use_location();
    let navigate = use_navigate();

    let policy = GuardPolicy {
        redirect_to: redirect_to.unwrap_or_else(|| LOGIN_PATH.to_owned()),
        require_auth,
        required_role: required_role.map(Role::new),
    };
    let state = Memo::new(move |_| evaluate(&session.get(), &policy, &location.pathname.get(), &location.search.get()));

    let mut navigator = GuardNavigator::default();
    Effect::new(move || {
        if let Some(target) = navigator.next(&state.get()) {
            log::debug!("guard redirecting to {target}");
            navigate(&target, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    let fallback = fallback.unwrap_or_else(|| ViewFn::from(|| view! { <p class="session-loading">"Carregando..."</p> }));
    move || match state.get() {
        GuardState::Pending => fallback.run(),
        GuardState::Admitted => children().into_any(),
        GuardState::Redirecting(_) | GuardState::Denied(_) => ().into_any(),
    }
}

/// `RouteGuard` that also requires `role`.
#[component]
pub fn RoleGuard(#[prop(into)] role: String, children: ChildrenFn) -> impl IntoView {
    view! { <RouteGuard required_role=role>{children()}</RouteGuard> }
}
