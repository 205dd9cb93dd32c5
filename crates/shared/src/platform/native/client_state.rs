use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, HashSet},
};

use async_trait::async_trait;
use thiserror::Error;

use super::MemoryCacheStore;
use crate::reset::{ClientState, Registration, ResetStep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegistration {
    scope: String,
}

impl Registration for MemoryRegistration {
    fn scope(&self) -> String {
        self.scope.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{step} failed (injected)")]
pub struct InjectedFailure {
    step: ResetStep,
}

/// Browser state held in memory, with per-step and per-item failure injection
#[derive(Debug, Default)]
pub struct MemoryClientState {
    caches: MemoryCacheStore,
    local: RefCell<HashMap<String, String>>,
    session: RefCell<HashMap<String, String>>,
    databases: RefCell<Option<Vec<String>>>,
    registrations: RefCell<Vec<MemoryRegistration>>,
    failing: RefCell<HashSet<ResetStep>>,
    failing_items: RefCell<HashSet<(ResetStep, String)>>,
    reloads: Cell<usize>,
}

impl MemoryClientState {
    pub fn with_caches(caches: MemoryCacheStore) -> Self {
        Self { caches, ..Default::default() }
    }

    pub fn caches(&self) -> &MemoryCacheStore {
        &self.caches
    }

    pub fn set_local(&self, key: &str, value: &str) {
        self.local.borrow_mut().insert(key.to_string(), value.to_string());
    }

    pub fn set_session(&self, key: &str, value: &str) {
        self.session.borrow_mut().insert(key.to_string(), value.to_string());
    }

    pub fn local_is_empty(&self) -> bool {
        self.local.borrow().is_empty()
    }

    pub fn session_is_empty(&self) -> bool {
        self.session.borrow().is_empty()
    }

    pub fn set_databases(&self, databases: Option<Vec<String>>) {
        *self.databases.borrow_mut() = databases;
    }

    pub fn register(&self, scope: &str) {
        self.registrations.borrow_mut().push(MemoryRegistration { scope: scope.to_string() });
    }

    pub fn fail_step(&self, step: ResetStep) {
        self.failing.borrow_mut().insert(step);
    }

    /// Fails a single cache, database or registration scope of a step
    pub fn fail_item(&self, step: ResetStep, item: &str) {
        self.failing_items.borrow_mut().insert((step, item.to_string()));
    }

    pub fn reloads(&self) -> usize {
        self.reloads.get()
    }

    fn check(&self, step: ResetStep) -> Result<(), InjectedFailure> {
        if self.failing.borrow().contains(&step) {
            Err(InjectedFailure { step })
        } else {
            Ok(())
        }
    }

    fn check_item(&self, step: ResetStep, item: &str) -> Result<(), InjectedFailure> {
        self.check(step)?;
        if self.failing_items.borrow().contains(&(step, item.to_string())) {
            Err(InjectedFailure { step })
        } else {
            Ok(())
        }
    }
}

#[async_trait(?Send)]
impl ClientState for MemoryClientState {
    type Registration = MemoryRegistration;
    type Error = InjectedFailure;

    async fn cache_names(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.caches.names())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, Self::Error> {
        self.check_item(ResetStep::DeleteCaches, name)?;
        Ok(self.caches.remove(name))
    }

    fn clear_local_storage(&self) -> Result<(), Self::Error> {
        self.check(ResetStep::ClearStorage)?;
        self.local.borrow_mut().clear();
        Ok(())
    }

    fn clear_session_storage(&self) -> Result<(), Self::Error> {
        self.check(ResetStep::ClearStorage)?;
        self.session.borrow_mut().clear();
        Ok(())
    }

    async fn database_names(&self) -> Result<Option<Vec<String>>, Self::Error> {
        Ok(self.databases.borrow().clone())
    }

    async fn delete_database(&self, name: &str) -> Result<(), Self::Error> {
        self.check_item(ResetStep::DeleteDatabases, name)?;
        if let Some(databases) = self.databases.borrow_mut().as_mut() {
            databases.retain(|d| d != name);
        }
        Ok(())
    }

    async fn registrations(&self) -> Result<Vec<Self::Registration>, Self::Error> {
        Ok(self.registrations.borrow().clone())
    }

    async fn unregister(&self, registration: &Self::Registration) -> Result<bool, Self::Error> {
        self.check_item(ResetStep::UnregisterWorkers, &registration.scope)?;
        let mut registrations = self.registrations.borrow_mut();
        let before = registrations.len();
        registrations.retain(|r| r != registration);
        Ok(registrations.len() != before)
    }

    fn reload(&self) -> Result<(), Self::Error> {
        self.check(ResetStep::Reload)?;
        self.reloads.set(self.reloads.get() + 1);
        Ok(())
    }
}
