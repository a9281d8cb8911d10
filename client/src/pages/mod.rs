//! Page modules for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page declares its access policy by wrapping its body in a guard and
//! delegates the rest to `components`.

pub mod admin;
pub mod dashboard;
pub mod login;
pub mod unauthorized;
