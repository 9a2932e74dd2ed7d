//! Platform abstraction layer
//!
//! Browser glue lives behind `wasm32`: the LocalStorage backend and the
//! `WebGame` handle the page script drives. Native builds use
//! `persistence::MemoryStorage` and call `Game` directly.

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{LocalStorage, WebGame};
