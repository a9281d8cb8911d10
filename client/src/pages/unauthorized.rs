//! Landing for signed-in users who lack a required role.

use leptos::prelude::*;
use leptos_router::components::A;
use session::{ErrorCode, LANDING_PATH};

use crate::util::auth_error::message_for;

#[component]
pub fn UnauthorizedPage() -> impl IntoView {
    view! {
        <div class="unauthorized-page">
            <h1>"403"</h1>
            <p>{message_for(ErrorCode::AccessDenied)}</p>
            <A href=LANDING_PATH>"Voltar ao painel"</A>
        </div>
    }
}
