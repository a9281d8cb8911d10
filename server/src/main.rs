mod config;
mod cookies;
mod gateway;
mod matcher;
mod routes;
mod state;
mod sync;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::ServerConfig::from_env().expect("invalid configuration");
    if config.matcher.classify("/api/auth/login") == matcher::RouteClass::Bypass {
        tracing::warn!("auth API is excluded from session synchronization; sign-in cookies will not be written");
    }

    let gateway = gateway::HttpGateway::new(&config.gateway).expect("gateway client init failed");
    let port = config.port;
    let state = state::AppState::new(config, Arc::new(gateway));

    // Leptos is optional at runtime: without its configuration only the API is served.
    let app = match routes::leptos_app(state.clone()) {
        Ok(app) => app,
        Err(e) => {
            tracing::warn!(error = %e, "leptos configuration unavailable; serving API only");
            routes::app(state)
        }
    };

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "server listening");
    axum::serve(listener, app).await.expect("server failed");
}
