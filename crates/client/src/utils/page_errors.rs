use std::panic;

use leptos::window;
use shared::diagnostics::with_mirror;
use tracing::warn;
use wasm_bindgen::{closure::Closure, convert::FromWasmAbi, JsCast};
use web_sys::{ErrorEvent, EventTarget, PromiseRejectionEvent};

/// Adds an event listener that stays for the lifetime of the page
///
/// The closure is forgotten, which leaks it, so only use this for listeners
/// that are never removed
fn listen_forever<T, F>(target: &EventTarget, event: &str, mut f: F)
where
    T: FromWasmAbi + 'static,
    F: FnMut(T) + 'static,
{
    let callback = Closure::wrap(Box::new(move |t: T| f(t)) as Box<dyn FnMut(_)>);

    match target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()) {
        // Prevent it from being dropped
        Ok(()) => callback.forget(),
        Err(e) => warn!("Failed to listen for {event}: {e:?}"),
    }
}

/// Records uncaught errors and unhandled rejections in the diagnostic mirror
///
/// The listeners never call `preventDefault`, so the browser still reports
/// them as usual
pub fn capture_page_errors() {
    let window = window();

    listen_forever(&window, "error", |event: ErrorEvent| {
        with_mirror(|m| m.uncaught_error(&event.message(), &event.filename(), event.lineno()))
    });

    listen_forever(&window, "unhandledrejection", |event: PromiseRejectionEvent| {
        let reason = event.reason();
        let reason = reason.as_string().unwrap_or_else(|| format!("{reason:?}"));
        with_mirror(|m| m.unhandled_rejection(&reason))
    });
}

/// Panics go to the console first, then to the mirror
pub fn set_panic_hook() {
    panic::set_hook(Box::new(|info| {
        console_error_panic_hook::hook(info);
        with_mirror(|m| m.error(info.to_string()));
    }));
}
