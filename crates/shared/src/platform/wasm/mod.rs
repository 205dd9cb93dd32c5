mod cache_store;
pub use cache_store::*;

mod client_state;
pub use client_state::*;

mod network;
pub use network::*;
