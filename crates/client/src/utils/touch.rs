use std::cell::Cell;

use gloo::events::{EventListener, EventListenerOptions};
use leptos::document;
use wasm_bindgen::JsCast;
use web_sys::{js_sys::Date, Element, Event};

/// Two taps closer together than this count as a double tap
const DOUBLE_TAP_MS: f64 = 300.0;

fn inside_main(event: &Event) -> bool {
    event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok())
        .and_then(|element| element.closest("main").ok().flatten())
        .is_some()
}

fn is_double_tap(last: f64, now: f64) -> bool {
    now - last <= DOUBLE_TAP_MS
}

/// Stops the page from panning outside `main` and from zooming on double tap
///
/// Listeners are registered as non-passive and live as long as the page
pub fn lock_viewport() {
    let document = document();

    EventListener::new_with_options(
        &document,
        "touchmove",
        EventListenerOptions::enable_prevent_default(),
        |event| {
            if !inside_main(event) {
                event.prevent_default();
            }
        },
    )
    .forget();

    let last_tap = Cell::new(0.0);
    EventListener::new_with_options(
        &document,
        "touchend",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            let now = Date::now();
            if is_double_tap(last_tap.get(), now) {
                event.prevent_default();
            }
            last_tap.set(now);
        },
    )
    .forget();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn double_tap_window() {
        assert!(is_double_tap(1_000.0, 1_300.0));
        assert!(!is_double_tap(1_000.0, 1_301.0));
        assert!(!is_double_tap(0.0, 1_000.0));
    }
}
