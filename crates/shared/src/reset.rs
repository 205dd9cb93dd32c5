//! Factory reset of everything the app keeps in the browser
//!
//! Every step is best effort: a failure is logged and recorded, and the
//! remaining steps still run. Nothing is rolled back.

use std::fmt::Display;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info};

/// Shown to the user when any step fails
pub const RESET_FAILURE_NOTICE: &str = "Failed to clear cache. Check console for details.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetStep {
    DeleteCaches,
    ClearStorage,
    DeleteDatabases,
    UnregisterWorkers,
    Reload,
}

impl Display for ResetStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ResetStep::*;
        f.write_str(match self {
            DeleteCaches => "delete caches",
            ClearStorage => "clear storage",
            DeleteDatabases => "delete databases",
            UnregisterWorkers => "unregister workers",
            Reload => "reload",
        })
    }
}

pub trait Registration {
    fn scope(&self) -> String;
}

/// Client side state the reset tears down
#[async_trait(?Send)]
pub trait ClientState {
    type Registration: Registration;
    type Error: Display;

    async fn cache_names(&self) -> Result<Vec<String>, Self::Error>;
    async fn delete_cache(&self, name: &str) -> Result<bool, Self::Error>;

    fn clear_local_storage(&self) -> Result<(), Self::Error>;
    fn clear_session_storage(&self) -> Result<(), Self::Error>;

    /// `None` when the platform can't enumerate databases
    async fn database_names(&self) -> Result<Option<Vec<String>>, Self::Error>;
    async fn delete_database(&self, name: &str) -> Result<(), Self::Error>;

    async fn registrations(&self) -> Result<Vec<Self::Registration>, Self::Error>;
    async fn unregister(&self, registration: &Self::Registration) -> Result<bool, Self::Error>;

    /// Reloads the page, bypassing the http cache where possible
    fn reload(&self) -> Result<(), Self::Error>;
}

/// Confirmation guard in front of the reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetPrompt {
    #[default]
    Hidden,
    Confirming,
    Running,
}

/// Proof that the user confirmed the reset
///
/// Only [ResetPrompt::confirm] hands these out
#[derive(Debug)]
pub struct ConfirmedReset(());

impl ResetPrompt {
    pub fn open(&mut self) {
        if *self == Self::Hidden {
            *self = Self::Confirming;
        }
    }

    pub fn cancel(&mut self) {
        if *self == Self::Confirming {
            *self = Self::Hidden;
        }
    }

    pub fn confirm(&mut self) -> Option<ConfirmedReset> {
        if *self == Self::Confirming {
            *self = Self::Running;
            Some(ConfirmedReset(()))
        } else {
            None
        }
    }

    pub fn finish(&mut self) {
        *self = Self::Hidden;
    }

    pub fn is_modal_visible(&self) -> bool {
        *self == Self::Confirming
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: ResetStep,
    pub message: String,
}

impl Display for StepFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub caches_deleted: Vec<String>,
    /// False when the platform couldn't list databases
    pub databases_enumerated: bool,
    pub databases_deleted: Vec<String>,
    pub workers_unregistered: Vec<String>,
    pub failures: Vec<StepFailure>,
    pub reloaded: bool,
}

impl ResetReport {
    fn step_failed(&self, step: ResetStep) -> bool {
        self.failures.iter().any(|f| f.step == step)
    }

    fn fail<E: Display>(&mut self, step: ResetStep, e: E) {
        let failure = StepFailure { step, message: e.to_string() };
        error!("Error clearing app cache: {failure}");
        self.failures.push(failure);
    }
}

#[derive(Debug, Clone, Error)]
pub enum ResetError {
    #[error("Failed to clear cache. Check console for details.")]
    Incomplete { report: ResetReport },
}

/// Deletes caches, storage, databases and worker registrations, then reloads
///
/// The reload only happens when every earlier step succeeded, so the failure
/// notice stays on screen otherwise
pub async fn factory_reset<C: ClientState>(
    client: &C,
    _confirmed: ConfirmedReset,
) -> Result<ResetReport, ResetError> {
    let mut report = ResetReport::default();

    delete_caches(client, &mut report).await;
    clear_storage(client, &mut report);
    delete_databases(client, &mut report).await;
    unregister_workers(client, &mut report).await;

    if !report.failures.is_empty() {
        return Err(ResetError::Incomplete { report });
    }

    if let Err(e) = client.reload() {
        report.fail(ResetStep::Reload, e);
        return Err(ResetError::Incomplete { report });
    }
    report.reloaded = true;

    Ok(report)
}

async fn delete_caches<C: ClientState>(client: &C, report: &mut ResetReport) {
    let names = match client.cache_names().await {
        Ok(names) => names,
        Err(e) => return report.fail(ResetStep::DeleteCaches, e),
    };

    for name in names {
        match client.delete_cache(&name).await {
            Ok(_) => report.caches_deleted.push(name),
            Err(e) => report.fail(ResetStep::DeleteCaches, format!("{name}: {e}")),
        }
    }
    if !report.step_failed(ResetStep::DeleteCaches) {
        info!("All CacheStorage cleared");
    }
}

fn clear_storage<C: ClientState>(client: &C, report: &mut ResetReport) {
    if let Err(e) = client.clear_local_storage() {
        report.fail(ResetStep::ClearStorage, format!("localStorage: {e}"));
    }
    if let Err(e) = client.clear_session_storage() {
        report.fail(ResetStep::ClearStorage, format!("sessionStorage: {e}"));
    }
    if !report.step_failed(ResetStep::ClearStorage) {
        info!("localStorage & sessionStorage cleared");
    }
}

async fn delete_databases<C: ClientState>(client: &C, report: &mut ResetReport) {
    let names = match client.database_names().await {
        Ok(Some(names)) => names,
        Ok(None) => {
            debug!("Database enumeration unsupported, skipping");
            return;
        }
        Err(e) => return report.fail(ResetStep::DeleteDatabases, e),
    };
    report.databases_enumerated = true;

    for name in names {
        match client.delete_database(&name).await {
            Ok(()) => report.databases_deleted.push(name),
            Err(e) => report.fail(ResetStep::DeleteDatabases, format!("{name}: {e}")),
        }
    }
    if !report.step_failed(ResetStep::DeleteDatabases) {
        info!("IndexedDB cleared");
    }
}

async fn unregister_workers<C: ClientState>(client: &C, report: &mut ResetReport) {
    let registrations = match client.registrations().await {
        Ok(registrations) => registrations,
        Err(e) => return report.fail(ResetStep::UnregisterWorkers, e),
    };

    for registration in registrations {
        let scope = registration.scope();
        match client.unregister(&registration).await {
            Ok(_) => {
                info!("Service Worker unregistered: {scope}");
                report.workers_unregistered.push(scope);
            }
            Err(e) => report.fail(ResetStep::UnregisterWorkers, format!("{scope}: {e}")),
        }
    }
}
