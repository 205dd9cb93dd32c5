use async_trait::async_trait;
use headers::{CacheControl, Header};
use http::header::CACHE_CONTROL;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Headers, Request, RequestCache, RequestInit, RequestMode, Response, ServiceWorkerGlobalScope,
};

use crate::{
    error::JsFailure,
    worker::{AssetRequest, AssetResponse, Network},
    HashedAsset,
};

impl AssetRequest for Request {
    fn url(&self) -> String {
        Request::url(self)
    }

    fn is_navigation(&self) -> bool {
        self.mode() == RequestMode::Navigate
    }
}

impl AssetResponse for Response {
    fn status(&self) -> u16 {
        Response::status(self)
    }

    fn is_success(&self) -> bool {
        self.ok()
    }
}

fn no_store_headers() -> Result<Headers, JsFailure> {
    let mut encoded = Vec::with_capacity(1);
    CacheControl::new().with_no_store().encode(&mut encoded);

    let headers = Headers::new()?;
    for value in encoded.iter().filter_map(|v| v.to_str().ok()) {
        headers.set(CACHE_CONTROL.as_str(), value)?;
    }
    Ok(headers)
}

/// Network access from inside the service worker
#[derive(Debug, Clone)]
pub struct WorkerNetwork {
    scope: ServiceWorkerGlobalScope,
}

impl WorkerNetwork {
    pub fn new(scope: ServiceWorkerGlobalScope) -> Self {
        Self { scope }
    }
}

#[async_trait(?Send)]
impl Network for WorkerNetwork {
    type Request = Request;
    type Response = Response;
    type Error = JsFailure;

    /// Install requests skip the http cache so the live file is stored
    fn request(&self, asset: &HashedAsset) -> Result<Self::Request, Self::Error> {
        let headers = no_store_headers()?;
        let mut init = RequestInit::new();
        init.method("GET").cache(RequestCache::NoStore).headers(&headers);

        if let Some(integrity) = asset.integrity.as_deref() {
            init.integrity(integrity);
        }

        Ok(Request::new_with_str_and_init(&asset.path, &init)?)
    }

    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, Self::Error> {
        let response = JsFuture::from(self.scope.fetch_with_request(request)).await?;

        if response.is_instance_of::<Response>() {
            Ok(response.into())
        } else {
            Err(JsFailure::unexpected(format!(
                "Fetch returned something other than a Response: {:?}",
                response
            )))
        }
    }
}
