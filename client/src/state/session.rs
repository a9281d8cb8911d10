//! Client session store.
//!
//! SYSTEM CONTEXT
//! ==============
//! One store per browser tab, created by the root `App` and handed to
//! components through [`SessionContext`]. Guards only read the snapshot;
//! `refresh` and `sign_out` are the only writers, and both replace the
//! snapshot wholesale.
//!
//! CONCURRENCY
//! ===========
//! The browser is single-threaded, so the store uses `Rc<RefCell<_>>` and never
//! holds a borrow across an `.await`. Concurrent `refresh` callers share one
//! `Shared` in-flight future: one network call, one resulting snapshot. Every
//! fetch is stamped with the epoch it started in; `sign_out` and `dispose`
//! move the epoch on so late results are dropped instead of applied.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use leptos::prelude::*;
use session::{AuthError, Session};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Which of the four snapshot states holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Unauthenticated,
    Errored,
}

/// The client's view of the session. A session is present exactly when the
/// status is `Authenticated`; the enum makes any other combination
/// unrepresentable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionSnapshot {
    #[default]
    Loading,
    Authenticated(Session),
    Unauthenticated {
        /// Why the user is signed out, when known (e.g. the session expired).
        reason: Option<AuthError>,
    },
    Errored(AuthError),
}

impl SessionSnapshot {
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Loading => SessionStatus::Loading,
            Self::Authenticated(_) => SessionStatus::Authenticated,
            Self::Unauthenticated { .. } => SessionStatus::Unauthenticated,
            Self::Errored(_) => SessionStatus::Errored,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&AuthError> {
        match self {
            Self::Errored(err) | Self::Unauthenticated { reason: Some(err) } => Some(err),
            _ => None,
        }
    }

    /// Fold a fetch result into the next snapshot.
    ///
    /// `Ok(None)` means the server has no session for us. A session that is
    /// already past its expiry counts as expired even if the server sent it.
    #[must_use]
    pub fn from_fetch(result: Result<Option<Session>, AuthError>, now: i64) -> Self {
        match result {
            Ok(Some(session)) if session.is_expired(now) => Self::Unauthenticated { reason: Some(AuthError::Expired) },
            Ok(Some(session)) => Self::Authenticated(session),
            Ok(None) => Self::Unauthenticated { reason: None },
            Err(err) if err.is_transient() => Self::Errored(err),
            Err(err) => Self::Unauthenticated { reason: Some(err) },
        }
    }
}

// =============================================================================
// GATEWAY SEAM
// =============================================================================

/// What the store needs from the outside world. The browser implementation
/// talks to this app's `/api/auth/*` endpoints; tests use scripted mocks.
pub trait SessionGateway {
    /// Fetch the current session. `Ok(None)` when there is none.
    fn fetch_session(&self) -> LocalBoxFuture<'static, Result<Option<Session>, AuthError>>;

    /// Revoke the current session.
    fn sign_out(&self) -> LocalBoxFuture<'static, Result<(), AuthError>>;
}

// =============================================================================
// STORE
// =============================================================================

/// Resolves to the snapshot produced by the fetch it was joined to.
pub type InFlight = Shared<LocalBoxFuture<'static, SessionSnapshot>>;

type Subscriber = Rc<dyn Fn(&SessionSnapshot)>;

struct StoreInner {
    snapshot: SessionSnapshot,
    in_flight: Option<InFlight>,
    epoch: u64,
    disposed: bool,
    subscribers: Vec<Subscriber>,
}

/// Single-flight session store. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    gateway: Rc<dyn SessionGateway>,
    inner: Rc<RefCell<StoreInner>>,
    clock: fn() -> i64,
}

impl SessionStore {
    #[must_use]
    pub fn new(gateway: Rc<dyn SessionGateway>) -> Self {
        Self::with_clock(gateway, now_secs)
    }

    #[must_use]
    pub fn with_clock(gateway: Rc<dyn SessionGateway>, clock: fn() -> i64) -> Self {
        let inner = StoreInner {
            snapshot: SessionSnapshot::Loading,
            in_flight: None,
            epoch: 0,
            disposed: false,
            subscribers: Vec::new(),
        };
        Self { gateway, inner: Rc::new(RefCell::new(inner)), clock }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.borrow().snapshot.clone()
    }

    /// Called with every replacement snapshot, after it is stored.
    pub fn subscribe(&self, subscriber: impl Fn(&SessionSnapshot) + 'static) {
        self.inner.borrow_mut().subscribers.push(Rc::new(subscriber));
    }

    /// Start a fetch, or join the one already in flight.
    ///
    /// While a snapshot is already resolved it stays visible until the fetch
    /// lands; only a retry out of `Errored` passes through `Loading` again.
    pub fn refresh(&self) -> InFlight {
        let mut inner = self.inner.borrow_mut();
        if let Some(in_flight) = &inner.in_flight {
            return in_flight.clone();
        }

        let epoch = inner.epoch;
        let fetch = self.gateway.fetch_session();
        let store = self.clone();
        let in_flight = async move {
            let result = fetch.await;
            let next = SessionSnapshot::from_fetch(result, (store.clock)());
            store.settle(epoch, next)
        }
        .boxed_local()
        .shared();
        inner.in_flight = Some(in_flight.clone());

        let retrying = matches!(inner.snapshot, SessionSnapshot::Errored(_));
        drop(inner);
        if retrying {
            self.replace(SessionSnapshot::Loading);
        }
        in_flight
    }

    /// Sign out at the gateway, then go `Unauthenticated` no matter what the
    /// gateway said. Any refresh in flight is abandoned.
    pub async fn sign_out(&self) -> SessionSnapshot {
        self.invalidate_in_flight();
        let call = self.gateway.sign_out();
        if let Err(err) = call.await {
            log::warn!("gateway sign-out failed, clearing local session anyway: {err}");
        }
        // A refresh started while the sign-out call was pending is stale too.
        self.invalidate_in_flight();
        self.replace(SessionSnapshot::Unauthenticated { reason: None })
    }

    /// Tear down: drop subscribers and discard whatever is still in flight.
    pub fn dispose(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.disposed = true;
        inner.epoch += 1;
        inner.in_flight = None;
        inner.subscribers.clear();
    }

    fn invalidate_in_flight(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.epoch += 1;
        inner.in_flight = None;
    }

    /// Apply a fetch result if it still belongs to the current epoch.
    fn settle(&self, epoch: u64, next: SessionSnapshot) -> SessionSnapshot {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed || inner.epoch != epoch {
                log::debug!("discarding stale session fetch result");
                return inner.snapshot.clone();
            }
            inner.in_flight = None;
        }
        self.replace(next)
    }

    fn replace(&self, next: SessionSnapshot) -> SessionSnapshot {
        let subscribers = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return inner.snapshot.clone();
            }
            inner.snapshot = next.clone();
            inner.subscribers.clone()
        };
        for subscriber in subscribers {
            subscriber(&next);
        }
        next
    }
}

/// Seconds since the Unix epoch, from the browser clock when hydrated.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn now_secs() -> i64 {
    #[cfg(feature = "hydrate")]
    {
        (js_sys::Date::now() / 1000.0) as i64
    }
    #[cfg(not(feature = "hydrate"))]
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
    }
}

// =============================================================================
// LEPTOS CONTEXT
// =============================================================================

/// Reactive handle on the tab's session, provided via context.
///
/// On the server there is no store: the snapshot stays `Loading` and the
/// actions are no-ops, so SSR output matches the first hydrated render.
#[derive(Clone, Copy)]
pub struct SessionContext {
    snapshot: RwSignal<SessionSnapshot>,
    store: Option<StoredValue<SessionStore, LocalStorage>>,
}

impl SessionContext {
    /// Mirror `store` (when present) into a signal.
    pub fn new(store: Option<SessionStore>) -> Self {
        let snapshot = RwSignal::new(store.as_ref().map(SessionStore::snapshot).unwrap_or_default());
        if let Some(store) = &store {
            store.subscribe(move |next| {
                // The signal may already be disposed if the owner unmounted.
                let _ = snapshot.try_set(next.clone());
            });
        }
        Self { snapshot, store: store.map(StoredValue::new_local) }
    }

    /// Current snapshot; tracked.
    pub fn get(&self) -> SessionSnapshot {
        self.snapshot.get()
    }

    fn store(&self) -> Option<SessionStore> {
        self.store.and_then(|s| s.try_with_value(SessionStore::clone))
    }

    /// Revalidate in the background. Concurrent calls coalesce.
    pub fn refresh(&self) {
        if let Some(store) = self.store() {
            leptos::task::spawn_local(async move {
                store.refresh().await;
            });
        }
    }

    /// Sign out in the background; the snapshot goes `Unauthenticated`.
    pub fn sign_out(&self) {
        if let Some(store) = self.store() {
            leptos::task::spawn_local(async move {
                store.sign_out().await;
            });
        }
    }

    pub fn dispose(&self) {
        if let Some(store) = self.store() {
            store.dispose();
        }
    }
}

/// The tab's session. Panics outside the `App` tree.
pub fn use_session() -> SessionContext {
    expect_context::<SessionContext>()
}
