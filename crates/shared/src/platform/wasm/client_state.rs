use async_trait::async_trait;
use tracing::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    js_sys::{Array, Function, Promise, Reflect},
    IdbFactory, ServiceWorkerRegistration, Storage, Window,
};

use crate::{
    error::JsFailure,
    reset::{ClientState, Registration},
};

impl Registration for ServiceWorkerRegistration {
    fn scope(&self) -> String {
        ServiceWorkerRegistration::scope(self)
    }
}

fn storage(storage: Result<Option<Storage>, JsValue>, which: &str) -> Result<Storage, JsFailure> {
    storage?.ok_or_else(|| JsFailure::unexpected(format!("{which} is unavailable")))
}

/// The page's view of the browser state a factory reset removes
#[derive(Debug, Clone)]
pub struct BrowserState {
    window: Window,
}

impl BrowserState {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn indexed_db(&self) -> Result<Option<IdbFactory>, JsFailure> {
        Ok(self.window.indexed_db()?)
    }
}

#[async_trait(?Send)]
impl ClientState for BrowserState {
    type Registration = ServiceWorkerRegistration;
    type Error = JsFailure;

    async fn cache_names(&self) -> Result<Vec<String>, Self::Error> {
        let keys: Array = JsFuture::from(self.window.caches()?.keys()).await?.into();
        Ok(keys.iter().filter_map(|k| k.as_string()).collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, Self::Error> {
        let deleted = JsFuture::from(self.window.caches()?.delete(name)).await?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    fn clear_local_storage(&self) -> Result<(), Self::Error> {
        Ok(storage(self.window.local_storage(), "localStorage")?.clear()?)
    }

    fn clear_session_storage(&self) -> Result<(), Self::Error> {
        Ok(storage(self.window.session_storage(), "sessionStorage")?.clear()?)
    }

    /// `indexedDB.databases()` is missing in some browsers
    async fn database_names(&self) -> Result<Option<Vec<String>>, Self::Error> {
        let Some(factory) = self.indexed_db()? else {
            return Ok(None);
        };

        let databases = Reflect::get(&factory, &JsValue::from_str("databases"))?;
        let Some(databases) = databases.dyn_ref::<Function>() else {
            return Ok(None);
        };

        let promise: Promise = databases.call0(&factory)?.dyn_into()?;
        let list: Array = JsFuture::from(promise).await?.dyn_into()?;

        let mut names = Vec::with_capacity(list.length() as usize);
        for info in list.iter() {
            if let Some(name) = Reflect::get(&info, &JsValue::from_str("name"))?.as_string() {
                names.push(name);
            }
        }
        Ok(Some(names))
    }

    /// Issues the delete without waiting for it to finish
    async fn delete_database(&self, name: &str) -> Result<(), Self::Error> {
        if let Some(factory) = self.indexed_db()? {
            factory.delete_database(name)?;
            debug!("Requested deletion of IndexedDB {name}");
        }
        Ok(())
    }

    async fn registrations(&self) -> Result<Vec<Self::Registration>, Self::Error> {
        let container = self.window.navigator().service_worker();
        let registrations: Array = JsFuture::from(container.get_registrations()).await?.dyn_into()?;

        registrations
            .iter()
            .map(|r| r.dyn_into::<ServiceWorkerRegistration>().map_err(JsFailure::from))
            .collect()
    }

    async fn unregister(&self, registration: &Self::Registration) -> Result<bool, Self::Error> {
        let unregistered = JsFuture::from(registration.unregister()?).await?;
        Ok(unregistered.as_bool().unwrap_or(false))
    }

    fn reload(&self) -> Result<(), Self::Error> {
        Ok(self.window.location().reload_with_forceget(true)?)
    }
}
