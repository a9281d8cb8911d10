//! Member landing page.
//!
//! SYSTEM CONTEXT
//! ==============
//! Authenticated landing route. Shows who is signed in, how long the session
//! has left and offers sign-out; the guard handles everything else.

use leptos::prelude::*;
use leptos_router::components::A;

use crate::components::route_guard::RouteGuard;
use crate::state::session::{now_secs, use_session};

#[component]
pub fn DashboardPage() -> impl IntoView {
    view! {
        <RouteGuard>
            <Dashboard/>
        </RouteGuard>
    }
}

#[component]
fn Dashboard() -> impl IntoView {
    let session = use_session();
    let email = move || session.get().session().map(|s| s.email.clone()).unwrap_or_default();
    let minutes_left = move || session.get().session().map_or(0, |s| s.remaining_secs(now_secs()) / 60);
    let roles = move || {
        session
            .get()
            .session()
            .map(|s| s.roles.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))
            .unwrap_or_default()
    };

    view! {
        <div class="dashboard-page">
            <header class="dashboard-header">
                <h1>"Painel"</h1>
                <button class="dashboard-button" on:click=move |_| session.sign_out()>
                    "Sair"
                </button>
            </header>
            <p class="dashboard-user">{email}</p>
            <p class="dashboard-meta">"Papéis: " {roles}</p>
            <p class="dashboard-meta">"Sessão expira em " {minutes_left} " min"</p>
            <A href="/admin">"Administração"</A>
        </div>
    }
}
