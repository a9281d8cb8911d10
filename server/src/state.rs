//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and the session synchronizer via
//! the `State` extractor. It holds the parsed configuration and the gateway
//! client. Nothing session-related is cached here: every request asks the
//! gateway afresh, so a negative result never outlives its request.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::gateway::SessionGateway;

/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub gateway: Arc<dyn SessionGateway>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig, gateway: Arc<dyn SessionGateway>) -> Self {
        Self { config: Arc::new(config), gateway }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use session::{ErrorCode, Role, Session};

    use super::*;
    use crate::gateway::{GatewayError, GatewayGrant};

    #[must_use]
    pub fn now() -> i64 {
        time::OffsetDateTime::now_utc().unix_timestamp()
    }

    /// Session for `user_id` expiring `ttl_secs` from now.
    #[must_use]
    pub fn session_for(user_id: &str, roles: &[&str], ttl_secs: i64) -> Session {
        let now = now();
        Session {
            user_id: user_id.to_owned(),
            email: format!("{user_id}@example.com"),
            roles: roles.iter().map(|r| Role::new(*r)).collect(),
            issued_at: now - 60,
            expires_at: now + ttl_secs,
            metadata: std::collections::BTreeMap::new(),
        }
    }

    /// How the mock answers `validate_or_refresh` for a token.
    #[derive(Clone)]
    pub enum MockAnswer {
        Grant(GatewayGrant),
        Fail(GatewayError),
        Hang,
    }

    /// Scripted gateway keyed by token.
    #[derive(Default)]
    pub struct MockGateway {
        pub answers: Mutex<HashMap<String, MockAnswer>>,
        pub credentials: Mutex<HashMap<String, Result<GatewayGrant, GatewayError>>>,
        pub sign_out_result: Mutex<Option<GatewayError>>,
        pub validate_calls: AtomicUsize,
        pub sign_out_calls: AtomicUsize,
    }

    impl MockGateway {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        #[must_use]
        pub fn with_answer(self, token: &str, answer: MockAnswer) -> Self {
            self.answers.lock().unwrap().insert(token.to_owned(), answer);
            self
        }

        #[must_use]
        pub fn with_credentials(self, email: &str, result: Result<GatewayGrant, GatewayError>) -> Self {
            self.credentials.lock().unwrap().insert(email.to_owned(), result);
            self
        }

        pub fn validate_calls(&self) -> usize {
            self.validate_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SessionGateway for MockGateway {
        async fn validate_or_refresh(&self, token: &str) -> Result<GatewayGrant, GatewayError> {
            self.validate_calls.fetch_add(1, Ordering::SeqCst);
            let answer = self.answers.lock().unwrap().get(token).cloned();
            match answer {
                Some(MockAnswer::Grant(grant)) => Ok(grant),
                Some(MockAnswer::Fail(err)) => Err(err),
                Some(MockAnswer::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(GatewayError::Timeout)
                }
                None => Err(GatewayError::Rejected { code: ErrorCode::SessionExpired }),
            }
        }

        async fn sign_out(&self, _token: &str) -> Result<(), GatewayError> {
            self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
            match self.sign_out_result.lock().unwrap().clone() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn get_user(&self, token: &str) -> Result<Session, GatewayError> {
            self.validate_or_refresh(token).await.map(|grant| grant.session)
        }

        async fn sign_in(&self, email: &str, _password: &str) -> Result<GatewayGrant, GatewayError> {
            self.credentials
                .lock()
                .unwrap()
                .get(email)
                .cloned()
                .unwrap_or(Err(GatewayError::Rejected { code: ErrorCode::InvalidCredentials }))
        }
    }

    /// Config with a short gateway timeout and default matcher.
    #[must_use]
    pub fn test_config() -> ServerConfig {
        ServerConfig::from_lookup(|key| match key {
            "GATEWAY_URL" => Some("http://gateway.test".to_owned()),
            "GATEWAY_TIMEOUT_MS" => Some("50".to_owned()),
            _ => None,
        })
        .expect("test config")
    }

    #[must_use]
    pub fn test_app_state(gateway: Arc<MockGateway>) -> AppState {
        AppState::new(test_config(), gateway)
    }
}
