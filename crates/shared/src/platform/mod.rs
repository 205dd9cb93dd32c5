//! Implementations of the worker and reset seams
//!
//! `native` keeps everything in memory and backs the tests, `wasm` talks to the
//! browser through web-sys

pub mod native;

#[cfg(feature = "wasm")]
pub mod wasm;
