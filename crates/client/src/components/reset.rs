use gloo::dialogs::alert;
use leptos::{
    component, create_rw_signal, spawn_local, view, window, IntoView, SignalGet, SignalUpdate,
    SignalWith,
};
use shared::{
    platform::wasm::BrowserState,
    reset::{factory_reset, ResetPrompt},
};
use tracing::{debug, info};

/// Clear cache button behind a confirm/cancel modal
#[component]
pub fn ResetButton() -> impl IntoView {
    let prompt = create_rw_signal(ResetPrompt::default());

    let confirm = move |_| {
        let mut confirmed = None;
        prompt.update(|p| confirmed = p.confirm());
        let Some(confirmed) = confirmed else {
            debug!("Reset already running");
            return;
        };

        spawn_local(async move {
            let client = BrowserState::new(window());
            match factory_reset(&client, confirmed).await {
                Ok(report) => info!(
                    caches = report.caches_deleted.len(),
                    workers = report.workers_unregistered.len(),
                    "App reset, reloading"
                ),
                Err(e) => alert(&e.to_string()),
            }
            prompt.update(|p| p.finish());
        });
    };

    view! {
        <button
            id="clearCacheBtn"
            prop:disabled=move || prompt.get() == ResetPrompt::Running
            on:click=move |_| prompt.update(|p| p.open())
        >
            "Clear cache & reset app"
        </button>
        <div
            id="confirmModal"
            class="modal"
            style:display=move || if prompt.with(|p| p.is_modal_visible()) { "flex" } else { "none" }
        >
            <div class="modal-content">
                <p>"This deletes every cached file, all stored data and the offline worker, then reloads the app. Continue?"</p>
                <button id="cancelBtn" on:click=move |_| prompt.update(|p| p.cancel())>"Cancel"</button>
                <button id="confirmBtn" class="danger" on:click=confirm>"Yes, clear everything"</button>
            </div>
        </div>
    }
}
