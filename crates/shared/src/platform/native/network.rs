use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

use async_trait::async_trait;
use http::StatusCode;
use thiserror::Error;

use crate::{
    worker::{AssetRequest, AssetResponse, Network},
    HashedAsset,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    Navigate,
    SameOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRequest {
    pub url: String,
    pub mode: RequestMode,
}

impl MemoryRequest {
    /// Sub-resource request
    pub fn get<S: Into<String>>(url: S) -> Self {
        Self { url: url.into(), mode: RequestMode::SameOrigin }
    }

    pub fn navigate<S: Into<String>>(url: S) -> Self {
        Self { url: url.into(), mode: RequestMode::Navigate }
    }
}

impl AssetRequest for MemoryRequest {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl MemoryResponse {
    pub fn ok<B: Into<Vec<u8>>>(body: B) -> Self {
        Self { status: StatusCode::OK, body: body.into() }
    }

    pub fn not_found() -> Self {
        Self { status: StatusCode::NOT_FOUND, body: b"Not Found".to_vec() }
    }
}

impl AssetResponse for MemoryResponse {
    fn status(&self) -> u16 {
        self.status.as_u16()
    }

    fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("Network unreachable fetching {url}")]
    Offline { url: String },
}

#[derive(Debug, Default)]
struct Origin {
    resources: RefCell<HashMap<String, MemoryResponse>>,
    offline: Cell<bool>,
    fetched: RefCell<Vec<String>>,
}

/// An origin server held in memory
///
/// Unknown urls answer 404. Clones share the same origin
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    origin: Rc<Origin>,
}

impl MemoryNetwork {
    pub fn serve<B: Into<Vec<u8>>>(&self, url: &str, body: B) {
        self.serve_response(url, MemoryResponse::ok(body));
    }

    pub fn serve_response(&self, url: &str, response: MemoryResponse) {
        self.origin.resources.borrow_mut().insert(url.to_string(), response);
    }

    pub fn remove(&self, url: &str) {
        self.origin.resources.borrow_mut().remove(url);
    }

    pub fn set_online(&self, online: bool) {
        self.origin.offline.set(!online);
    }

    /// Every url fetched so far, including failed attempts
    pub fn fetched(&self) -> Vec<String> {
        self.origin.fetched.borrow().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.origin.fetched.borrow().len()
    }
}

#[async_trait(?Send)]
impl Network for MemoryNetwork {
    type Request = MemoryRequest;
    type Response = MemoryResponse;
    type Error = NetworkError;

    fn request(&self, asset: &HashedAsset) -> Result<Self::Request, Self::Error> {
        Ok(MemoryRequest::get(asset.path.as_str()))
    }

    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, Self::Error> {
        self.origin.fetched.borrow_mut().push(request.url.clone());

        if self.origin.offline.get() {
            return Err(NetworkError::Offline { url: request.url.clone() });
        }

        Ok(self
            .origin
            .resources
            .borrow()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(MemoryResponse::not_found))
    }
}
