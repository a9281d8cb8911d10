//! Email + password sign-in page.
//!
//! Guest-only: once the session turns `Authenticated` (right after a
//! successful sign-in, or for a visitor who is already signed in) the guard
//! sends the user back to the decoded `redirect` target.

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use leptos::prelude::*;

use crate::components::auth_error_notice::AuthErrorNotice;
use crate::components::route_guard::RouteGuard;
use crate::state::session::use_session;

#[cfg(any(test, feature = "hydrate"))]
use crate::util::auth_error::message_for;

const MISSING_FIELDS: &str = "Informe e-mail e senha.";

fn validate_sign_in_input(email: &str, password: &str) -> Result<(String, String), &'static str> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(MISSING_FIELDS);
    }
    Ok((email.to_owned(), password.to_owned()))
}

/// Message for a failed sign-in; goes through the same copy as URL errors.
#[cfg(any(test, feature = "hydrate"))]
fn sign_in_failure_message(err: &session::AuthError) -> &'static str {
    message_for(err.code())
}

#[component]
pub fn LoginPage() -> impl IntoView {
    view! {
        <RouteGuard require_auth=false>
            <LoginForm/>
        </RouteGuard>
    }
}

#[component]
fn LoginForm() -> impl IntoView {
    let email = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let info = RwSignal::new(String::new());
    let busy = RwSignal::new(false);
    let session = use_session();

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let (email_value, password_value) = match validate_sign_in_input(&email.get(), &password.get()) {
            Ok(values) => values,
            Err(message) => {
                info.set(message.to_owned());
                return;
            }
        };
        busy.set(true);
        info.set(String::new());

        #[cfg(feature = "hydrate")]
        leptos::task::spawn_local(async move {
            match crate::net::api::sign_in(&email_value, &password_value).await {
                // The cookie is set; the store picks the session up and the guard navigates.
                Ok(_) => session.refresh(),
                Err(err) => {
                    log::info!("sign-in failed: {err}");
                    info.set(sign_in_failure_message(&err).to_owned());
                    busy.set(false);
                }
            }
        });
        #[cfg(not(feature = "hydrate"))]
        let _ = (email_value, password_value, session);
    };

    view! {
        <div class="login-page">
            <div class="login-card">
                <h1>"Entrar"</h1>
                <AuthErrorNotice/>
                <form class="login-form" on:submit=on_submit>
                    <input
                        class="login-input"
                        type="email"
                        placeholder="voce@exemplo.com"
                        prop:value=move || email.get()
                        on:input=move |ev| email.set(event_target_value(&ev))
                    />
                    <input
                        class="login-input"
                        type="password"
                        placeholder="Senha"
                        prop:value=move || password.get()
                        on:input=move |ev| password.set(event_target_value(&ev))
                    />
                    <button class="login-button" type="submit" disabled=move || busy.get()>
                        "Entrar"
                    </button>
                </form>
                <Show when=move || !info.get().is_empty()>
                    <p class="login-message">{move || info.get()}</p>
                </Show>
            </div>
        </div>
    }
}
