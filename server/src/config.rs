//! Server configuration parsed from environment variables.
//!
//! Every knob has a default except `GATEWAY_URL`. Parsing goes through a
//! lookup closure so tests can feed a map instead of mutating process env.

use std::time::Duration;

use crate::matcher::{PathPattern, RouteMatcher};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_COOKIE_NAME: &str = "session_token";
pub const DEFAULT_REFRESH_WINDOW_SECS: i64 = 300;
pub const DEFAULT_PROTECTED_PATHS: &str = "/dashboard/*,/admin/*,/profile/*";
pub const DEFAULT_PUBLIC_PATHS: &str = "/healthz";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Where and how to reach the identity gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Session cookie attributes. Every write uses the same flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub gateway: GatewayConfig,
    pub cookie: CookieSettings,
    /// Sessions ending within this many seconds get their cookie renewed.
    pub refresh_window_secs: i64,
    pub login_path: String,
    pub matcher: RouteMatcher,
}

impl ServerConfig {
    /// Build from process environment.
    ///
    /// Required: `GATEWAY_URL`.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `GATEWAY_API_KEY`
    /// - `GATEWAY_TIMEOUT_MS`: default 3000
    /// - `SESSION_COOKIE_NAME`: default `session_token`
    /// - `COOKIE_SECURE`: default true
    /// - `REFRESH_WINDOW_SECS`: default 300
    /// - `LOGIN_PATH`: default `/auth/login`
    /// - `PROTECTED_PATHS`, `PUBLIC_PATHS`: comma-separated path patterns
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `GATEWAY_URL` is missing or a value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("GATEWAY_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("GATEWAY_URL"))?
            .trim()
            .trim_end_matches('/')
            .to_owned();

        let gateway = GatewayConfig {
            base_url,
            api_key: lookup("GATEWAY_API_KEY").filter(|v| !v.is_empty()),
            timeout: Duration::from_millis(parse_or(&lookup, "GATEWAY_TIMEOUT_MS", DEFAULT_GATEWAY_TIMEOUT_MS)?),
        };

        let secure = match lookup("COOKIE_SECURE") {
            None => true,
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { var: "COOKIE_SECURE", value: raw })?,
        };
        let cookie = CookieSettings {
            name: lookup("SESSION_COOKIE_NAME").unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_owned()),
            secure,
        };

        let login_path = lookup("LOGIN_PATH").unwrap_or_else(|| session::LOGIN_PATH.to_owned());
        if !login_path.starts_with('/') {
            return Err(ConfigError::Invalid { var: "LOGIN_PATH", value: login_path });
        }

        let protected = parse_patterns(
            "PROTECTED_PATHS",
            &lookup("PROTECTED_PATHS").unwrap_or_else(|| DEFAULT_PROTECTED_PATHS.to_owned()),
        )?;
        let public =
            parse_patterns("PUBLIC_PATHS", &lookup("PUBLIC_PATHS").unwrap_or_else(|| DEFAULT_PUBLIC_PATHS.to_owned()))?;

        Ok(Self {
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            gateway,
            cookie,
            refresh_window_secs: parse_or(&lookup, "REFRESH_WINDOW_SECS", DEFAULT_REFRESH_WINDOW_SECS)?,
            login_path,
            matcher: RouteMatcher::new(protected, public),
        })
    }
}

/// Accepts `1/true/yes/on` and `0/false/no/off`, case-insensitive.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

fn parse_patterns(var: &'static str, raw: &str) -> Result<Vec<PathPattern>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| PathPattern::parse(s).ok_or_else(|| ConfigError::Invalid { var, value: s.to_owned() }))
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
