use leptos::{
    component, create_action, create_signal, event_target_value, view, window, IntoView,
    SignalGet, SignalGetUntracked, SignalSet,
};
use shared::{
    platform::wasm::BrowserState, reset::ClientState, worker::WorkerCommand, ASSET_MANIFEST,
};
use tracing::{debug, error, info};

use crate::utils::{
    browser::{controller_state, send_worker_command},
    fetch::{observed_fetch, observed_xhr},
};

fn check_sw() -> String {
    match controller_state() {
        Ok(Some(state)) => format!("Service Worker active: {state}"),
        Ok(None) => "No active Service Worker.".to_string(),
        Err(e) => format!("Failed to read the controller: {e}"),
    }
}

async fn check_cache() -> String {
    match BrowserState::new(window()).cache_names().await {
        Ok(names) => format!("Caches: {}", names.join(", ")),
        Err(e) => format!("Failed to list caches: {e}"),
    }
}

async fn skip_waiting() -> String {
    match send_worker_command(WorkerCommand::SkipWaiting).await {
        Ok(true) => format!("Sent {}", WorkerCommand::SkipWaiting),
        Ok(false) => "No worker to activate.".to_string(),
        Err(e) => format!("Failed to message the worker: {e}"),
    }
}

async fn test_fetch(url: String) -> String {
    match observed_fetch(&url).await {
        Ok(response) => format!("Fetch {url}: {} {}", response.status(), response.status_text()),
        Err(e) => format!("Fetch {url} failed: {e}"),
    }
}

/// Checks on the worker, the caches and network reporting
#[component]
pub fn Debug() -> impl IntoView {
    let (output, set_output) = create_signal(String::new());
    let (url, set_url) = create_signal(ASSET_MANIFEST[2].to_string());

    let cache_action = create_action(move |_: &()| async move { set_output.set(check_cache().await) });
    let skip_action =
        create_action(move |_: &()| async move { set_output.set(skip_waiting().await) });
    let fetch_action = create_action(move |url: &String| {
        let url = url.clone();
        async move { set_output.set(test_fetch(url).await) }
    });

    let xhr = move |_| {
        let url = url.get_untracked();
        match observed_xhr(&url) {
            Ok(_) => {
                debug!("XHR sent: {url}");
                set_output.set(format!("XHR sent: {url}"));
            }
            Err(e) => {
                error!("XHR {url} failed to send: {e}");
                set_output.set(format!("XHR {url} failed to send: {e}"));
            }
        }
    };

    view! {
        <h2>"Debug"</h2>
        <div class="debug-buttons">
            <button on:click=move |_| set_output.set(check_sw())>"Check Service Worker"</button>
            <button on:click=move |_| cache_action.dispatch(())>"Check Cache"</button>
            <button on:click=move |_| skip_action.dispatch(())>"Activate Update"</button>
        </div>
        <div class="debug-buttons">
            <input
                type="text"
                prop:value=move || url.get()
                on:input=move |ev| set_url.set(event_target_value(&ev))
            />
            <button on:click=move |_| fetch_action.dispatch(url.get_untracked())>"Test fetch"</button>
            <button on:click=xhr>"Test XHR"</button>
            <button on:click=move |_| info!("Test log from the debug tab")>"Test log"</button>
        </div>
        <pre id="test-output">{ move || output.get() }</pre>
    }
}
