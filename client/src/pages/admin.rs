//! Admin-only page.

use leptos::prelude::*;

use crate::components::route_guard::RoleGuard;

#[component]
pub fn AdminPage() -> impl IntoView {
    view! {
        <RoleGuard role="admin">
            <div class="admin-page">
                <h1>"Administração"</h1>
                <p>"Área restrita a administradores."</p>
            </div>
        </RoleGuard>
    }
}
