#[cfg(feature = "build")]
pub mod native;

#[cfg(feature = "wasm")]
pub mod tracing;
