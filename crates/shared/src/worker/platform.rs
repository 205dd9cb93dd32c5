use async_trait::async_trait;

use crate::{error::CacheError, CacheName, HashedAsset};

/// The parts of an intercepted request the worker makes decisions on
pub trait AssetRequest {
    /// Canonical address, used as the cache key
    fn url(&self) -> String;
    /// True when the request loads a full document
    fn is_navigation(&self) -> bool;
}

pub trait AssetResponse {
    fn status(&self) -> u16;

    fn is_success(&self) -> bool {
        (200..300).contains(&self.status())
    }
}

#[async_trait(?Send)]
pub trait Network {
    type Request: AssetRequest;
    type Response: AssetResponse;
    type Error: std::error::Error + 'static;

    /// Builds the install-time request for a manifest entry
    fn request(&self, asset: &HashedAsset) -> Result<Self::Request, Self::Error>;

    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, Self::Error>;
}

/// Persistent store of named cache generations
#[async_trait(?Send)]
pub trait CacheStore {
    type Request;
    type Response;

    async fn generations(&self) -> Result<Vec<CacheName>, CacheError>;

    /// Opens (creating if absent) the generation and stores every entry
    async fn store(
        &self,
        generation: &CacheName,
        entries: Vec<(Self::Request, Self::Response)>,
    ) -> Result<(), CacheError>;

    /// Exact match within one generation only
    async fn lookup(
        &self,
        generation: &CacheName,
        request: &Self::Request,
    ) -> Result<Option<Self::Response>, CacheError>;

    async fn lookup_url(
        &self,
        generation: &CacheName,
        url: &str,
    ) -> Result<Option<Self::Response>, CacheError>;

    /// Returns false if the generation didn't exist
    async fn delete(&self, generation: &CacheName) -> Result<bool, CacheError>;
}
