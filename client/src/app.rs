//! Root application component with routing and the session context.

use leptos::prelude::*;
use leptos_meta::{MetaTags, Stylesheet, Title, provide_meta_context};
use leptos_router::{
    StaticSegment,
    components::{Redirect, Route, Router, Routes},
};
use session::LANDING_PATH;

use crate::pages::{admin::AdminPage, dashboard::DashboardPage, login::LoginPage, unauthorized::UnauthorizedPage};
use crate::state::session::SessionContext;

/// HTML shell rendered on the server for SSR + hydration.
pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="pt-BR">
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <AutoReload options=options.clone()/>
                <HydrationScripts options/>
                <MetaTags/>
            </head>
            <body>
                <App/>
            </body>
        </html>
    }
}

/// Root application component.
///
/// Owns the tab's session store. On the server the context carries no store
/// and stays `Loading`; the browser fetches the session after hydration.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let session = SessionContext::new(browser_store());
    provide_context(session);

    #[cfg(feature = "hydrate")]
    {
        session.refresh();

        let focus = window_event_listener(leptos::ev::focus, move |_| session.refresh());
        let visibility = window_event_listener(leptos::ev::visibilitychange, move |_| {
            if !document().hidden() {
                session.refresh();
            }
        });
        on_cleanup(move || {
            focus.remove();
            visibility.remove();
            session.dispose();
        });
    }

    view! {
        <Stylesheet id="leptos" href="/pkg/session-gate.css"/>
        <Title text="Sessão"/>

        <Router>
            <Routes fallback=|| "Página não encontrada.".into_view()>
                <Route path=(StaticSegment("auth"), StaticSegment("login")) view=LoginPage/>
                <Route path=StaticSegment("dashboard") view=DashboardPage/>
                <Route path=StaticSegment("admin") view=AdminPage/>
                <Route path=StaticSegment("unauthorized") view=UnauthorizedPage/>
                <Route path=StaticSegment("") view=|| view! { <Redirect path=LANDING_PATH/> }/>
            </Routes>
        </Router>
    }
}

#[cfg(feature = "hydrate")]
fn browser_store() -> Option<crate::state::session::SessionStore> {
    use std::rc::Rc;

    Some(crate::state::session::SessionStore::new(Rc::new(crate::net::api::HttpSessionGateway)))
}

#[cfg(not(feature = "hydrate"))]
fn browser_store() -> Option<crate::state::session::SessionStore> {
    None
}
