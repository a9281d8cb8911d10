//! Reusable UI component modules.
//!
//! SYSTEM CONTEXT
//! ==============
//! Components read the session from Leptos context and never write it.

pub mod auth_error_notice;
pub mod route_guard;
