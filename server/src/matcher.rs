//! Path matcher deciding which requests the session synchronizer sees.
//!
//! DESIGN
//! ======
//! Three classes: `Bypass` (static assets, public allow-list; never touched),
//! `Protected` (auth required; unauthenticated requests are redirected), and
//! `Public` (synchronized but never redirected). Bypass wins over Protected so
//! an asset under a protected prefix is still served without a gateway call.

/// Paths that are never intercepted regardless of configuration.
const ALWAYS_BYPASSED: &[&str] = &["/pkg/*", "/favicon.ico", "/robots.txt"];

/// Extensions served as static files.
const STATIC_EXTENSIONS: &[&str] =
    &["css", "js", "wasm", "map", "png", "jpg", "jpeg", "gif", "svg", "ico", "webp", "woff", "woff2", "txt"];

/// A literal path (`/healthz`) or a subtree (`/admin/*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    base: String,
    subtree: bool,
}

impl PathPattern {
    /// Parse a pattern. Returns `None` unless it starts with `/`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if !raw.starts_with('/') {
            return None;
        }
        if let Some(base) = raw.strip_suffix("/*") {
            return Some(Self { base: base.to_owned(), subtree: true });
        }
        Some(Self { base: normalize(raw).to_owned(), subtree: false })
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        if !self.subtree {
            return path == self.base;
        }
        // `/*` has an empty base and covers everything.
        self.base.is_empty()
            || path == self.base
            || path.strip_prefix(self.base.as_str()).is_some_and(|rest| rest.starts_with('/'))
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 { path.trim_end_matches('/') } else { path }
}

/// How the synchronizer treats a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Outside the matcher: no gateway call, no cookie write, unauthenticated.
    Bypass,
    /// Synchronized; unauthenticated requests proceed.
    Public,
    /// Synchronized; unauthenticated requests are sent to the login page.
    Protected,
}

#[derive(Debug, Clone)]
pub struct RouteMatcher {
    protected: Vec<PathPattern>,
    public: Vec<PathPattern>,
    builtin: Vec<PathPattern>,
}

impl RouteMatcher {
    #[must_use]
    pub fn new(protected: Vec<PathPattern>, public: Vec<PathPattern>) -> Self {
        let builtin = ALWAYS_BYPASSED.iter().filter_map(|raw| PathPattern::parse(raw)).collect();
        Self { protected, public, builtin }
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if is_static_asset(path) || self.builtin.iter().chain(&self.public).any(|p| p.matches(path)) {
            return RouteClass::Bypass;
        }
        if self.protected.iter().any(|p| p.matches(path)) {
            RouteClass::Protected
        } else {
            RouteClass::Public
        }
    }
}

fn is_static_asset(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    last.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && STATIC_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
