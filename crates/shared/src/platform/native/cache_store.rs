use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use async_trait::async_trait;

use super::{MemoryRequest, MemoryResponse};
use crate::{error::CacheError, worker::CacheStore, CacheName};

type Generation = BTreeMap<String, MemoryResponse>;

#[derive(Debug, Default)]
struct Storage {
    caches: RefCell<BTreeMap<String, Generation>>,
    fail_writes: Cell<bool>,
    fail_lookups: Cell<bool>,
    undeletable: RefCell<BTreeSet<String>>,
}

/// Cache storage held in memory
///
/// Clones share the same storage, so a reset routine and a worker can be
/// pointed at the same caches
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    storage: Rc<Storage>,
}

impl MemoryCacheStore {
    /// Makes every batch write fail after its first entry
    pub fn fail_writes(&self, fail: bool) {
        self.storage.fail_writes.set(fail);
    }

    /// Makes every lookup fail as if the cache couldn't be opened
    pub fn fail_lookups(&self, fail: bool) {
        self.storage.fail_lookups.set(fail);
    }

    /// Makes deleting the named cache fail
    pub fn fail_delete(&self, name: &str) {
        self.storage.undeletable.borrow_mut().insert(name.to_string());
    }

    pub fn insert(&self, generation: &str, url: &str, response: MemoryResponse) {
        self.storage
            .caches
            .borrow_mut()
            .entry(generation.to_string())
            .or_default()
            .insert(url.to_string(), response);
    }

    pub fn names(&self) -> Vec<String> {
        self.storage.caches.borrow().keys().cloned().collect()
    }

    pub fn keys(&self, generation: &str) -> Vec<String> {
        self.storage
            .caches
            .borrow()
            .get(generation)
            .map(|g| g.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn remove(&self, name: &str) -> bool {
        self.storage.caches.borrow_mut().remove(name).is_some()
    }

    fn get(&self, generation: &CacheName, url: &str) -> Result<Option<MemoryResponse>, CacheError> {
        if self.storage.fail_lookups.get() {
            return Err(CacheError::Lookup {
                name: generation.to_string(),
                url: url.to_string(),
                message: "InvalidStateError".to_string(),
            });
        }

        Ok(self
            .storage
            .caches
            .borrow()
            .get(generation.as_str())
            .and_then(|cache| cache.get(url))
            .cloned())
    }
}

#[async_trait(?Send)]
impl CacheStore for MemoryCacheStore {
    type Request = MemoryRequest;
    type Response = MemoryResponse;

    async fn generations(&self) -> Result<Vec<CacheName>, CacheError> {
        Ok(self.names().into_iter().map(CacheName::from).collect())
    }

    async fn store(
        &self,
        generation: &CacheName,
        entries: Vec<(Self::Request, Self::Response)>,
    ) -> Result<(), CacheError> {
        let mut caches = self.storage.caches.borrow_mut();
        let cache = caches.entry(generation.to_string()).or_default();

        for (i, (request, response)) in entries.into_iter().enumerate() {
            if i > 0 && self.storage.fail_writes.get() {
                return Err(CacheError::Store {
                    name: generation.to_string(),
                    url: request.url,
                    message: "QuotaExceededError".to_string(),
                });
            }
            cache.insert(request.url, response);
        }

        Ok(())
    }

    async fn lookup(
        &self,
        generation: &CacheName,
        request: &Self::Request,
    ) -> Result<Option<Self::Response>, CacheError> {
        self.get(generation, &request.url)
    }

    async fn lookup_url(
        &self,
        generation: &CacheName,
        url: &str,
    ) -> Result<Option<Self::Response>, CacheError> {
        self.get(generation, url)
    }

    async fn delete(&self, generation: &CacheName) -> Result<bool, CacheError> {
        if self.storage.undeletable.borrow().contains(generation.as_str()) {
            return Err(CacheError::Delete {
                name: generation.to_string(),
                message: "UnknownError".to_string(),
            });
        }
        Ok(self.remove(generation.as_str()))
    }
}
