use gloo::events::EventListener;
use leptos::{component, create_signal, on_cleanup, view, window, IntoView, SignalGet, SignalSet};
use tracing::info;

pub fn status_text(online: bool) -> &'static str {
    if online {
        "You are online ✅"
    } else {
        "You are offline ❌ (using cached content)"
    }
}

#[component]
pub fn OnlineCheck() -> impl IntoView {
    let (online, set_online) = create_signal(window().navigator().on_line());

    let listeners = [("online", true), ("offline", false)].map(|(event, value)| {
        EventListener::new(&window(), event, move |_| {
            info!("{}", status_text(value));
            set_online.set(value);
        })
    });
    on_cleanup(move || drop(listeners));

    view! {
        <span id="offline-status">{ move || status_text(online.get()) }</span>
    }
}
