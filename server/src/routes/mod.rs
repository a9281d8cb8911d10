//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the auth API and stitches it with Leptos SSR rendering
//! under a single Axum router. The session synchronizer wraps everything, so
//! every page render and API handler sees an already-reconciled session.

pub mod auth;

use std::path::PathBuf;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use leptos::prelude::*;
use leptos_axum::{LeptosRoutes, generate_route_list};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::sync;

/// Auth API routes, without the synchronizer.
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/session", get(auth::current_session))
        .route("/api/auth/user", get(auth::current_user))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Wrap a router with the session synchronizer and request tracing.
fn synchronized(router: Router, state: AppState) -> Router {
    router
        .layer(middleware::from_fn_with_state(state, sync::synchronize))
        .layer(TraceLayer::new_for_http())
}

/// API-only app. Used when no Leptos configuration is available and in tests.
pub fn app(state: AppState) -> Router {
    synchronized(api_routes(state.clone()), state)
}

/// API routes + Leptos SSR pages + `/pkg` assets.
///
/// # Errors
///
/// Returns an error if the Leptos configuration cannot be loaded (missing or
/// malformed `Cargo.toml` `[package.metadata.leptos]` section).
pub fn leptos_app(state: AppState) -> Result<Router, String> {
    let conf = get_configuration(None).map_err(|e| format!("leptos configuration: {e}"))?;
    let leptos_options = conf.leptos_options;
    let routes = generate_route_list(client::app::App);

    let leptos_router = Router::new()
        .leptos_routes(&leptos_options, routes, {
            let opts = leptos_options.clone();
            move || client::app::shell(opts.clone())
        })
        .with_state(leptos_options.clone());

    // Static assets; the matcher bypasses `/pkg/*`, so no gateway call here.
    let site_root_path = PathBuf::from(leptos_options.site_root.as_ref());

    let router = api_routes(state.clone())
        .merge(leptos_router)
        .nest_service("/pkg", ServeDir::new(site_root_path.join("pkg")));
    Ok(synchronized(router, state))
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
