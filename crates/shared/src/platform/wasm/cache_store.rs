use async_trait::async_trait;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{js_sys::Array, Cache, CacheStorage, CacheQueryOptions, Request, Response};

use crate::{
    error::{CacheError, JsError},
    worker::CacheStore,
    CacheName,
};

fn js_message(e: JsValue) -> String {
    JsError::from(e).to_string()
}

/// Response or undefined, as returned by the match functions
fn into_response(value: JsValue) -> Option<Response> {
    value.dyn_into::<Response>().ok()
}

/// The browser's CacheStorage
#[derive(Debug, Clone)]
pub struct WebCacheStore {
    caches: CacheStorage,
}

impl WebCacheStore {
    pub fn new(caches: CacheStorage) -> Self {
        Self { caches }
    }

    async fn open(&self, generation: &CacheName) -> Result<Cache, CacheError> {
        let cache = JsFuture::from(self.caches.open(generation.as_str())).await.map_err(|e| {
            CacheError::Open { name: generation.to_string(), message: js_message(e) }
        })?;
        Ok(cache.into())
    }

    // Matching through CacheStorage with a cache name doesn't create the cache
    // the way open() would
    fn options(generation: &CacheName) -> CacheQueryOptions {
        let options = CacheQueryOptions::new();
        options.set_cache_name(generation.as_str());
        options
    }
}

#[async_trait(?Send)]
impl CacheStore for WebCacheStore {
    type Request = Request;
    type Response = Response;

    async fn generations(&self) -> Result<Vec<CacheName>, CacheError> {
        let keys: Array = JsFuture::from(self.caches.keys())
            .await
            .map_err(|e| CacheError::Enumerate { message: js_message(e) })?
            .into();

        Ok(keys.iter().filter_map(|k| k.as_string()).map(CacheName::from).collect())
    }

    async fn store(
        &self,
        generation: &CacheName,
        entries: Vec<(Self::Request, Self::Response)>,
    ) -> Result<(), CacheError> {
        let cache = self.open(generation).await?;

        for (request, response) in entries {
            JsFuture::from(cache.put_with_request(&request, &response)).await.map_err(|e| {
                CacheError::Store {
                    name: generation.to_string(),
                    url: request.url(),
                    message: js_message(e),
                }
            })?;
        }

        Ok(())
    }

    async fn lookup(
        &self,
        generation: &CacheName,
        request: &Self::Request,
    ) -> Result<Option<Self::Response>, CacheError> {
        let options = Self::options(generation);
        let cached = JsFuture::from(self.caches.match_with_request_and_options(request, &options))
            .await
            .map_err(|e| CacheError::Lookup {
                name: generation.to_string(),
                url: request.url(),
                message: js_message(e),
            })?;

        Ok(into_response(cached))
    }

    async fn lookup_url(
        &self,
        generation: &CacheName,
        url: &str,
    ) -> Result<Option<Self::Response>, CacheError> {
        let options = Self::options(generation);
        let cached = JsFuture::from(self.caches.match_with_str_and_options(url, &options))
            .await
            .map_err(|e| CacheError::Lookup {
                name: generation.to_string(),
                url: url.to_string(),
                message: js_message(e),
            })?;

        Ok(into_response(cached))
    }

    async fn delete(&self, generation: &CacheName) -> Result<bool, CacheError> {
        let deleted = JsFuture::from(self.caches.delete(generation.as_str()))
            .await
            .map_err(|e| CacheError::Delete { name: generation.to_string(), message: js_message(e) })?;

        Ok(deleted.as_bool().unwrap_or(false))
    }
}
