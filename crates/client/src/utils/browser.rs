use gloo::utils::format::JsValueSerdeExt;
use leptos::window;
use shared::{error::JsFailure, worker::WorkerCommand, SERVICE_WORKER_SCOPE, SERVICE_WORKER_URL};
use tracing::{error, info, warn};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{js_sys::Reflect, RegistrationOptions, ServiceWorkerRegistration};

pub async fn get_service_worker_registration() -> Result<ServiceWorkerRegistration, JsFailure> {
    let sw = window().navigator().service_worker();
    Ok(JsFuture::from(sw.ready()?).await?.into())
}

/// Registers the offline worker, logging the outcome
pub async fn register_service_worker() {
    let container = window().navigator().service_worker();

    let mut options = RegistrationOptions::new();
    options.scope(SERVICE_WORKER_SCOPE);

    match JsFuture::from(container.register_with_options(SERVICE_WORKER_URL, &options)).await {
        Ok(_) => info!("Service Worker Registered"),
        Err(e) => error!("Service Worker registration failed: {}", JsFailure::from(e)),
    }
}

/// State of the worker controlling this page, if there is one
pub fn controller_state() -> Result<Option<String>, JsFailure> {
    let Some(controller) = window().navigator().service_worker().controller() else {
        return Ok(None);
    };

    let state = Reflect::get(&controller, &JsValue::from_str("state"))?;
    Ok(Some(state.as_string().unwrap_or_else(|| format!("{state:?}"))))
}

/// Posts `command` to the waiting worker, or the active one if nothing is waiting
pub async fn send_worker_command(command: WorkerCommand) -> Result<bool, JsFailure> {
    let registration = get_service_worker_registration().await?;

    let Some(worker) = registration.waiting().or_else(|| registration.active()) else {
        warn!("No worker to send {command} to");
        return Ok(false);
    };

    let message = <JsValue as JsValueSerdeExt>::from_serde(&command)
        .map_err(|e| JsFailure::unexpected(e.to_string()))?;
    worker.post_message(&message)?;
    info!("Sent {command} to worker {}", worker.script_url());

    Ok(true)
}
