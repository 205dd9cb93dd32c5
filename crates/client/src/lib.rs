use leptos::{mount_to_body, spawn_local, view};
use shared::utils::tracing::configure_tracing_once as configure_tracing;
use tracing::info;
use wasm_bindgen::prelude::wasm_bindgen;

mod components;
use components::App;

mod tabs;
pub use tabs::*;

pub mod utils;

use utils::{browser::register_service_worker, page_errors, touch};

#[wasm_bindgen]
pub fn start_client() {
    page_errors::set_panic_hook();
    configure_tracing(true);
    page_errors::capture_page_errors();
    touch::lock_viewport();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting client");
    spawn_local(register_service_worker());

    mount_to_body(move || view! { <App/> });
}
