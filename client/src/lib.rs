//! # client
//!
//! Leptos frontend for the session gate: the per-tab session store, route
//! and role guards, the auth error banner and the pages they protect.
//!
//! Built twice: with `ssr` into the server binary for rendering, and with
//! `hydrate` into WASM for the browser.

pub mod app;
pub mod components;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// WASM entry point: install logging and hydrate the server-rendered body.
#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::hydrate_body(app::App);
}
