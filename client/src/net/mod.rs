//! Networking modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` handles the REST calls behind the session store and the sign-in
//! form. The session cookie itself is never visible here; the server owns it.

pub mod api;
