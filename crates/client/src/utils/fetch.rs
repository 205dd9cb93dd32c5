//! Network calls made by the page, with failures reported to the diagnostic
//! mirror

use gloo::{
    events::EventListener,
    net::http::{Request, Response},
};
use shared::{
    diagnostics::{report_network_failure, NetworkFailure},
    error::JsFailure,
};
use wasm_bindgen::JsCast;
use web_sys::XmlHttpRequest;

/// GETs `url`, reporting non-success statuses and errors
///
/// The result is returned unchanged either way
pub async fn observed_fetch(url: &str) -> Result<Response, gloo::net::Error> {
    match Request::get(url).send().await {
        Ok(response) => {
            if !response.ok() {
                report_network_failure(&NetworkFailure::FetchStatus {
                    url: url.to_string(),
                    status: response.status(),
                    status_text: response.status_text(),
                });
            }
            Ok(response)
        }
        Err(e) => {
            report_network_failure(&NetworkFailure::FetchError {
                url: url.to_string(),
                error: e.to_string(),
            });
            Err(e)
        }
    }
}

/// Reports error, abort and failure status for a request
///
/// Must be called before `send`. The listeners live as long as the request
pub fn observe_xhr(xhr: &XmlHttpRequest, url: &str) {
    let url = url.to_string();

    let error_url = url.clone();
    EventListener::new(xhr, "error", move |_| {
        report_network_failure(&NetworkFailure::XhrError { url: error_url.clone() });
    })
    .forget();

    let abort_url = url.clone();
    EventListener::new(xhr, "abort", move |_| {
        report_network_failure(&NetworkFailure::XhrAborted { url: abort_url.clone() });
    })
    .forget();

    EventListener::new(xhr, "load", move |event| {
        let Some(xhr) = event.target().and_then(|t| t.dyn_into::<XmlHttpRequest>().ok()) else {
            return;
        };
        let status = xhr.status().unwrap_or(0);
        if NetworkFailure::is_xhr_failure_status(status) {
            report_network_failure(&NetworkFailure::XhrStatus {
                url: url.clone(),
                status,
                status_text: xhr.status_text().unwrap_or_default(),
            });
        }
    })
    .forget();
}

/// Sends an observed GET with the legacy request API
pub fn observed_xhr(url: &str) -> Result<XmlHttpRequest, JsFailure> {
    let xhr = XmlHttpRequest::new()?;
    xhr.open("GET", url)?;
    observe_xhr(&xhr, url);
    xhr.send()?;
    Ok(xhr)
}
