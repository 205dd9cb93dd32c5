use std::{cell::RefCell, rc::Rc};

use console_error_panic_hook::set_once as set_panic_hook;
use gloo::utils::format::JsValueSerdeExt;
use shared::{
    platform::wasm::{WebCacheStore, WorkerNetwork},
    utils::tracing::configure_tracing_once as configure_tracing,
    worker::{OfflineWorker, WorkerCommand},
    ShellPackage,
};
use tracing::{debug, error, info, warn};
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    js_sys::{Array, Promise},
    ExtendableMessageEvent, FetchEvent, NotificationEvent, NotificationOptions, PushEvent,
    ServiceWorkerGlobalScope, WindowClient,
};

type ShellWorker = OfflineWorker<WebCacheStore, WorkerNetwork>;

thread_local! {
    // The browser can stop and restart the worker at any time, so this is
    // rebuilt lazily from the embedded package
    static WORKER: RefCell<Option<Rc<ShellWorker>>> = const { RefCell::new(None) };
}

/// Matches the first argument as a result
/// If there is an error, the remaining arguments are passed to format_args!()
/// to be prepended to ": {e}". The error is logged and returned as a JsValue
macro_rules! log_err {
    ($f:expr, $($t:tt)*) => {
        match $f {
            Ok(v) => Ok(v),
            Err(e) => {
                let message = format!("{}: {e}", format_args!($($t)*));
                error!("{message}");
                Err(JsValue::from(message))
            }
        }
    };
}

fn parse_package(package: &JsValue) -> Result<ShellPackage, JsValue> {
    if package.is_undefined() || package.is_null() {
        warn!("No package embedded, using the builtin manifest");
        return Ok(ShellPackage::builtin());
    }

    log_err!(JsValueSerdeExt::into_serde::<ShellPackage>(package), "Invalid shell package")
}

fn worker(sw: &ServiceWorkerGlobalScope, package: &JsValue) -> Result<Rc<ShellWorker>, JsValue> {
    if let Some(worker) = WORKER.with(|w| w.borrow().clone()) {
        return Ok(worker);
    }

    let worker = Rc::new(OfflineWorker::new(
        parse_package(package)?,
        WebCacheStore::new(sw.caches()?),
        WorkerNetwork::new(sw.clone()),
    ));
    debug!(version = %worker.package().version, "Worker created");

    WORKER.with(|w| *w.borrow_mut() = Some(worker.clone()));
    Ok(worker)
}

fn init() {
    set_panic_hook();
    configure_tracing(false);
}

async fn install(worker: Rc<ShellWorker>) -> Result<JsValue, JsValue> {
    let generation = log_err!(worker.install().await, "install")?;
    Ok(JsValue::from_str(generation.as_str()))
}

#[wasm_bindgen]
pub fn worker_install(sw: ServiceWorkerGlobalScope, package: JsValue) -> Result<Promise, JsValue> {
    init();
    let worker = worker(&sw, &package)?;

    Ok(future_to_promise(install(worker)))
}

async fn activate(sw: ServiceWorkerGlobalScope, worker: Rc<ShellWorker>) -> Result<JsValue, JsValue> {
    let activation = log_err!(worker.activate().await, "activate")?;
    for pruned in activation.pruned.iter() {
        info!("Deleted stale cache {pruned}");
    }

    // Take control of pages loaded before this worker so they use the cache now
    log_err!(
        JsFuture::from(sw.clients().claim()).await.map_err(shared::error::JsFailure::from),
        "sw::clients::claim",
    )?;

    Ok(JsValue::undefined())
}

#[wasm_bindgen]
pub fn worker_activate(sw: ServiceWorkerGlobalScope, package: JsValue) -> Result<Promise, JsValue> {
    init();
    let worker = worker(&sw, &package)?;

    Ok(future_to_promise(activate(sw, worker)))
}

async fn fetch(worker: Rc<ShellWorker>, request: web_sys::Request) -> Result<JsValue, JsValue> {
    match worker.fetch(request).await {
        Ok(outcome) => {
            debug!(source = outcome.source(), "Responding");
            Ok(JsValue::from(outcome.into_response()))
        }
        // Rejected with whatever the network threw so the page sees the same error
        Err(failure) => Err(failure.into()),
    }
}

#[wasm_bindgen]
pub fn worker_fetch(
    sw: ServiceWorkerGlobalScope,
    package: JsValue,
    event: FetchEvent,
) -> Result<(), JsValue> {
    init();
    let worker = worker(&sw, &package)?;

    let response = future_to_promise(fetch(worker, event.request()));
    event.respond_with(&response)?;
    Ok(())
}

async fn message(sw: ServiceWorkerGlobalScope, event: ExtendableMessageEvent) -> Result<JsValue, JsValue> {
    match JsValueSerdeExt::into_serde::<WorkerCommand>(&event.data()) {
        Ok(WorkerCommand::SkipWaiting) => {
            info!("worker_message got {}", WorkerCommand::SkipWaiting);

            // MDN states the promise returned can be safely ignored
            let _ = sw.skip_waiting()?;
        }
        Err(e) => debug!("worker_message ignoring {:?}: {e}", event.data()),
    }

    Ok(JsValue::undefined())
}

#[wasm_bindgen]
pub fn worker_message(
    sw: ServiceWorkerGlobalScope,
    event: ExtendableMessageEvent,
) -> Result<Promise, JsValue> {
    init();
    Ok(future_to_promise(message(sw, event)))
}

async fn push(
    sw: ServiceWorkerGlobalScope,
    worker: Rc<ShellWorker>,
    event: PushEvent,
) -> Result<JsValue, JsValue> {
    let payload = event.data().map(|data| data.text());
    let notification = worker.notification(payload.as_deref());
    debug!(body = %notification.body, "Showing notification");

    let mut options = NotificationOptions::new();
    options.body(&notification.body).icon(&notification.icon);

    Ok(JsFuture::from(
        sw.registration()
            .show_notification_with_options(&notification.title, &options)?,
    )
    .await?)
}

#[wasm_bindgen]
pub fn worker_push(
    sw: ServiceWorkerGlobalScope,
    package: JsValue,
    event: PushEvent,
) -> Result<Promise, JsValue> {
    init();
    let worker = worker(&sw, &package)?;

    Ok(future_to_promise(push(sw, worker, event)))
}

async fn notification_click(
    sw: ServiceWorkerGlobalScope,
    event: NotificationEvent,
) -> Result<JsValue, JsValue> {
    // Close the notification (chrome doesn't do this by itself)
    event.notification().close();

    let clients: Array = JsFuture::from(sw.clients().match_all()).await?.into();

    let client: WindowClient = if clients.length() > 0 {
        clients.get(0).into()
    } else {
        let origin = sw.origin();
        debug!("Opening {origin}");

        log_err!(
            JsFuture::from(sw.clients().open_window(&origin))
                .await
                .map_err(shared::error::JsFailure::from),
            "sw::clients::open_window",
        )?
        .into()
    };

    debug!("Focusing tab");
    log_err!(
        JsFuture::from(client.focus()?).await.map_err(shared::error::JsFailure::from),
        "sw::clients[0]::focus",
    )
}

#[wasm_bindgen]
pub fn worker_notification_click(
    sw: ServiceWorkerGlobalScope,
    event: NotificationEvent,
) -> Result<Promise, JsValue> {
    init();
    Ok(future_to_promise(notification_click(sw, event)))
}
