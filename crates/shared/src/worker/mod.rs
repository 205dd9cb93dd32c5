//! Offline cache worker lifecycle
//!
//! Install populates one cache generation named after the package version,
//! activate makes it the current generation (optionally pruning older ones) and
//! fetch answers requests from the current generation before falling back to
//! the network, and then to the cached shell document for navigations.

use std::cell::RefCell;

use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::{error::CacheError, CacheName, PackageError, ShellPackage};

mod command;
pub use command::*;

mod platform;
pub use platform::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activated { current: CacheName },
    /// Install failed, the platform will discard this worker
    Redundant,
}

#[derive(Debug, Error)]
pub enum InstallError<E: std::error::Error + 'static> {
    #[error("Invalid package: {0}")]
    Package(#[from] PackageError),
    #[error("Failed to fetch {path}: {source}")]
    Network {
        path: String,
        #[source]
        source: E,
    },
    #[error("Fetching {path} returned status {status}")]
    Status { path: String, status: u16 },
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Error)]
pub enum ActivateError {
    #[error("Generation {0} was never installed")]
    MissingGeneration(CacheName),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub current: CacheName,
    pub pruned: Vec<CacheName>,
}

/// Where a fetch response came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<R> {
    Cached(R),
    Network(R),
    /// The network failed for a navigation and the shell document was served
    ShellFallback(R),
}

impl<R> FetchOutcome<R> {
    pub fn into_response(self) -> R {
        match self {
            Self::Cached(r) | Self::Network(r) | Self::ShellFallback(r) => r,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Self::Cached(_) => "cache",
            Self::Network(_) => "network",
            Self::ShellFallback(_) => "shell",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSpec {
    pub title: String,
    pub body: String,
    pub icon: String,
}

pub struct OfflineWorker<S, N> {
    package: ShellPackage,
    store: S,
    network: N,
    state: RefCell<WorkerState>,
}

impl<S, N> OfflineWorker<S, N>
where
    N: Network,
    S: CacheStore<Request = N::Request, Response = N::Response>,
{
    pub fn new(package: ShellPackage, store: S, network: N) -> Self {
        Self { package, store, network, state: RefCell::new(WorkerState::Parsed) }
    }

    pub fn package(&self) -> &ShellPackage {
        &self.package
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn state(&self) -> WorkerState {
        self.state.borrow().clone()
    }

    fn set_state(&self, state: WorkerState) {
        trace!(?state, "Worker state");
        *self.state.borrow_mut() = state;
    }

    /// The generation fetches are answered from, once activated
    pub fn current_generation(&self) -> Option<CacheName> {
        match &*self.state.borrow() {
            WorkerState::Activated { current } => Some(current.clone()),
            _ => None,
        }
    }

    /// Fetches every manifest entry and stores them as one batch
    ///
    /// Any failure deletes the partially written generation and leaves the
    /// worker redundant
    pub async fn install(&self) -> Result<CacheName, InstallError<N::Error>> {
        if let Err(e) = self.package.validate() {
            self.set_state(WorkerState::Redundant);
            error!("Install failed: {e}");
            return Err(e.into());
        }

        let generation = self.package.cache_name();
        self.set_state(WorkerState::Installing);
        debug!(%generation, assets = self.package.assets.len(), "Installing");

        match self.populate(&generation).await {
            Ok(()) => {
                self.set_state(WorkerState::Installed);
                info!(%generation, "Install successful");
                Ok(generation)
            }
            Err(e) => {
                self.set_state(WorkerState::Redundant);
                error!(%generation, "Install failed: {e}");
                Err(e)
            }
        }
    }

    async fn populate(&self, generation: &CacheName) -> Result<(), InstallError<N::Error>> {
        let mut entries = Vec::with_capacity(self.package.assets.len());

        for asset in self.package.assets.iter() {
            let request = self
                .network
                .request(asset)
                .map_err(|source| InstallError::Network { path: asset.path.clone(), source })?;

            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|source| InstallError::Network { path: asset.path.clone(), source })?;

            if !response.is_success() {
                return Err(InstallError::Status {
                    path: asset.path.clone(),
                    status: response.status(),
                });
            }

            trace!(path = %asset.path, "Fetched");
            entries.push((request, response));
        }

        if let Err(e) = self.store.store(generation, entries).await {
            if let Err(delete_error) = self.store.delete(generation).await {
                warn!(%generation, "Failed to delete partial generation: {delete_error}");
            }
            return Err(e.into());
        }

        Ok(())
    }

    /// Makes the installed generation current and prunes stale ones
    pub async fn activate(&self) -> Result<Activation, ActivateError> {
        let current = self.package.cache_name();
        let generations = self.store.generations().await?;

        if !generations.contains(&current) {
            return Err(ActivateError::MissingGeneration(current));
        }

        self.set_state(WorkerState::Activated { current: current.clone() });

        let mut pruned = Vec::new();
        if self.package.prune_stale_generations {
            for stale in generations.into_iter().filter(|g| g.is_generation() && *g != current) {
                match self.store.delete(&stale).await {
                    Ok(_) => {
                        debug!(generation = %stale, "Pruned");
                        pruned.push(stale);
                    }
                    Err(e) => warn!(generation = %stale, "Failed to prune: {e}"),
                }
            }
        }

        info!(%current, pruned = pruned.len(), "Activated");
        Ok(Activation { current, pruned })
    }

    /// Adopts the package generation without pruning
    ///
    /// Used when the platform restarts an already active worker, which loses
    /// all in-memory state
    pub fn resume(&self) -> CacheName {
        if let Some(current) = self.current_generation() {
            return current;
        }

        let current = self.package.cache_name();
        debug!(%current, "Resuming");
        self.set_state(WorkerState::Activated { current: current.clone() });
        current
    }

    /// Cache first, then network, then the shell document for navigations
    ///
    /// Network failures for anything but a navigation are returned unchanged
    pub async fn fetch(&self, request: N::Request) -> Result<FetchOutcome<N::Response>, N::Error> {
        let generation = self.resume();
        let url = request.url();

        match self.store.lookup(&generation, &request).await {
            Ok(Some(cached)) => {
                debug!("HIT: {url}");
                return Ok(FetchOutcome::Cached(cached));
            }
            Ok(None) => debug!("MISS: {url}"),
            Err(e) => warn!("Cache lookup failed, trying network: {e}"),
        }

        let error = match self.network.fetch(&request).await {
            Ok(response) => return Ok(FetchOutcome::Network(response)),
            Err(e) => e,
        };

        if !request.is_navigation() {
            debug!("Network failed for {url}: {error}");
            return Err(error);
        }

        match self.store.lookup_url(&generation, &self.package.shell).await {
            Ok(Some(shell)) => {
                info!("Offline navigation to {url}, serving {}", self.package.shell);
                Ok(FetchOutcome::ShellFallback(shell))
            }
            Ok(None) => {
                error!("Shell {} missing from {generation}", self.package.shell);
                Err(error)
            }
            Err(e) => {
                error!("Shell lookup failed: {e}");
                Err(error)
            }
        }
    }

    /// Builds the notification for a push payload
    pub fn notification(&self, payload: Option<&str>) -> NotificationSpec {
        let defaults = &self.package.notification;
        let body = payload
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(&defaults.default_body)
            .to_string();

        NotificationSpec { title: defaults.title.clone(), body, icon: defaults.icon.clone() }
    }
}

#[cfg(test)]
mod test {
    use tokio_test::block_on;

    use super::*;
    use crate::platform::native::{
        MemoryCacheStore, MemoryNetwork, MemoryRequest, MemoryResponse, NetworkError,
    };

    type TestWorker = OfflineWorker<MemoryCacheStore, MemoryNetwork>;

    fn serve_package(network: &MemoryNetwork, package: &ShellPackage) {
        for asset in package.assets.iter() {
            network.serve(&asset.path, format!("body of {}", asset.path));
        }
    }

    fn installed_worker(version: &str, assets: &[&str]) -> TestWorker {
        let package = ShellPackage::new(version, assets.iter().copied());
        let network = MemoryNetwork::default();
        serve_package(&network, &package);

        let worker = OfflineWorker::new(package, MemoryCacheStore::default(), network);
        block_on(worker.install()).unwrap();
        block_on(worker.activate()).unwrap();
        worker
    }

    #[test]
    fn install_caches_every_manifest_asset() {
        let worker = installed_worker("1.0.0", ASSETS);
        let fetches_after_install = worker.network().fetch_count();

        for path in ASSETS {
            let outcome = block_on(worker.fetch(MemoryRequest::get(*path))).unwrap();
            assert!(matches!(outcome, FetchOutcome::Cached(_)), "{path} not cached");
        }

        assert_eq!(worker.network().fetch_count(), fetches_after_install);
        assert_eq!(worker.store().keys("pwa-1.0.0"), ASSETS);
    }

    #[test]
    fn offline_asset_is_byte_identical() {
        let stylesheet = MemoryResponse::ok(vec![0x00, 0xff, 0x10, b'c', b's', b's']);
        let network = MemoryNetwork::default();
        network.serve("/", "root");
        network.serve("/index.html", "shell");
        network.serve_response("/style.css", stylesheet.clone());

        let package = ShellPackage::new("1.0.0", ["/", "/index.html", "/style.css"]);
        let worker = OfflineWorker::new(package, MemoryCacheStore::default(), network);
        block_on(worker.install()).unwrap();
        block_on(worker.activate()).unwrap();

        worker.network().set_online(false);
        let response = block_on(worker.fetch(MemoryRequest::get("/style.css")))
            .unwrap()
            .into_response();
        assert_eq!(response.body, stylesheet.body);
    }

    #[test]
    fn offline_navigation_falls_back_to_shell() {
        let worker = installed_worker("1.0.0", ASSETS);
        worker.network().set_online(false);

        let outcome = block_on(worker.fetch(MemoryRequest::navigate("/settings"))).unwrap();
        let shell = block_on(worker.store().lookup_url(&worker.package().cache_name(), SHELL))
            .unwrap()
            .unwrap();

        assert_eq!(outcome, FetchOutcome::ShellFallback(shell));
        assert_eq!(worker.network().fetched().last().map(String::as_str), Some("/settings"));
    }

    #[test]
    fn missing_shell_returns_network_error() {
        let worker = installed_worker("1.0.0", ASSETS);
        worker.store().remove("pwa-1.0.0");
        worker.network().set_online(false);

        let result = block_on(worker.fetch(MemoryRequest::navigate("/x")));
        assert_eq!(result, Err(NetworkError::Offline { url: "/x".to_string() }));
    }

    #[test]
    fn failing_lookup_is_a_miss() {
        let worker = installed_worker("1.0.0", ASSETS);
        worker.store().fail_lookups(true);
        let fetches_before = worker.network().fetch_count();

        let outcome = block_on(worker.fetch(MemoryRequest::get("/style.css"))).unwrap();
        assert_eq!(outcome.source(), "network");
        assert_eq!(worker.network().fetch_count(), fetches_before + 1);

        // The shell can't be read either, so the network error comes back
        worker.network().set_online(false);
        let result = block_on(worker.fetch(MemoryRequest::navigate("/settings")));
        assert_eq!(result, Err(NetworkError::Offline { url: "/settings".to_string() }));
    }

    #[test]
    fn offline_subresource_failure_propagates() {
        let worker = installed_worker("1.0.0", ASSETS);
        worker.network().set_online(false);

        let result = block_on(worker.fetch(MemoryRequest::get("/api/data.json")));
        assert_eq!(result, Err(NetworkError::Offline { url: "/api/data.json".to_string() }));
    }

    #[test]
    fn online_miss_goes_to_network() {
        let worker = installed_worker("1.0.0", ASSETS);
        worker.network().serve("/fresh.json", "{}");

        let outcome = block_on(worker.fetch(MemoryRequest::get("/fresh.json"))).unwrap();
        assert_eq!(outcome.source(), "network");

        // Error statuses are passed through, not replaced by the shell
        let outcome = block_on(worker.fetch(MemoryRequest::navigate("/missing"))).unwrap();
        assert_eq!(outcome.source(), "network");
        assert_eq!(outcome.into_response().status, http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn failed_install_leaves_no_generation() {
        let package = ShellPackage::new("1.0.0", ASSETS.iter().copied());
        let network = MemoryNetwork::default();
        serve_package(&network, &package);
        network.remove("/style.css");

        let worker = OfflineWorker::new(package, MemoryCacheStore::default(), network);
        let result = block_on(worker.install());

        assert!(matches!(result, Err(InstallError::Status { status: 404, .. })));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(block_on(worker.store().generations()).unwrap().is_empty());
    }

    #[test]
    fn invalid_package_makes_worker_redundant() {
        let package = ShellPackage::new("1.0.0", ["/", "/style.css"]);
        let network = MemoryNetwork::default();
        serve_package(&network, &package);

        let worker = OfflineWorker::new(package, MemoryCacheStore::default(), network);
        let result = block_on(worker.install());

        assert!(matches!(result, Err(InstallError::Package(PackageError::ShellNotInManifest(_)))));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert_eq!(worker.network().fetch_count(), 0);
    }

    #[test]
    fn partial_store_is_rolled_back() {
        let package = ShellPackage::new("1.0.0", ASSETS.iter().copied());
        let network = MemoryNetwork::default();
        serve_package(&network, &package);

        let store = MemoryCacheStore::default();
        store.fail_writes(true);

        let worker = OfflineWorker::new(package, store, network);
        assert!(matches!(block_on(worker.install()), Err(InstallError::Cache(_))));
        assert!(block_on(worker.store().generations()).unwrap().is_empty());
    }

    #[test]
    fn offline_install_fails() {
        let package = ShellPackage::new("1.0.0", ASSETS.iter().copied());
        let network = MemoryNetwork::default();
        serve_package(&network, &package);
        network.set_online(false);

        let worker = OfflineWorker::new(package, MemoryCacheStore::default(), network);
        assert!(matches!(block_on(worker.install()), Err(InstallError::Network { .. })));
    }

    #[test]
    fn activate_requires_installed_generation() {
        let package = ShellPackage::new("1.0.0", ASSETS.iter().copied());
        let worker =
            OfflineWorker::new(package, MemoryCacheStore::default(), MemoryNetwork::default());

        assert!(matches!(block_on(worker.activate()), Err(ActivateError::MissingGeneration(_))));
        assert_eq!(worker.current_generation(), None);
    }

    #[test]
    fn activation_prunes_only_stale_generations() {
        let store = MemoryCacheStore::default();
        store.insert("pwa-0.9.0", "/old.css", MemoryResponse::ok("old"));
        store.insert("thumbnails", "/a.png", MemoryResponse::ok("png"));

        let package = ShellPackage::new("1.0.0", ASSETS.iter().copied());
        let network = MemoryNetwork::default();
        serve_package(&network, &package);

        let worker = OfflineWorker::new(package, store, network);
        block_on(worker.install()).unwrap();
        let activation = block_on(worker.activate()).unwrap();

        assert_eq!(activation.current, CacheName::from("pwa-1.0.0"));
        assert_eq!(activation.pruned, vec![CacheName::from("pwa-0.9.0")]);
        assert_eq!(
            block_on(worker.store().generations()).unwrap(),
            vec![CacheName::from("pwa-1.0.0"), CacheName::from("thumbnails")]
        );
    }

    #[test]
    fn failed_prune_still_activates() {
        let store = MemoryCacheStore::default();
        store.insert("pwa-0.8.0", "/old.css", MemoryResponse::ok("older"));
        store.insert("pwa-0.9.0", "/old.css", MemoryResponse::ok("old"));
        store.fail_delete("pwa-0.8.0");

        let package = ShellPackage::new("1.0.0", ASSETS.iter().copied());
        let network = MemoryNetwork::default();
        serve_package(&network, &package);

        let worker = OfflineWorker::new(package, store, network);
        block_on(worker.install()).unwrap();
        let activation = block_on(worker.activate()).unwrap();

        assert_eq!(activation.pruned, vec![CacheName::from("pwa-0.9.0")]);
        assert_eq!(worker.current_generation(), Some(CacheName::from("pwa-1.0.0")));
        assert_eq!(worker.store().names(), vec!["pwa-0.8.0", "pwa-1.0.0"]);
    }

    #[test]
    fn pruning_can_be_disabled() {
        let store = MemoryCacheStore::default();
        store.insert("pwa-0.9.0", "/old.css", MemoryResponse::ok("old"));

        let mut package = ShellPackage::new("1.0.0", ASSETS.iter().copied());
        package.prune_stale_generations = false;
        let network = MemoryNetwork::default();
        serve_package(&network, &package);

        let worker = OfflineWorker::new(package, store, network);
        block_on(worker.install()).unwrap();
        assert!(block_on(worker.activate()).unwrap().pruned.is_empty());
        assert_eq!(block_on(worker.store().generations()).unwrap().len(), 2);
    }

    #[test]
    fn never_answers_from_another_generation() {
        let store = MemoryCacheStore::default();
        store.insert("pwa-0.9.0", "/legacy.js", MemoryResponse::ok("legacy"));

        let mut package = ShellPackage::new("1.0.0", ASSETS.iter().copied());
        package.prune_stale_generations = false;
        let network = MemoryNetwork::default();
        serve_package(&network, &package);

        let worker = OfflineWorker::new(package, store, network);
        block_on(worker.install()).unwrap();
        block_on(worker.activate()).unwrap();
        worker.network().set_online(false);

        assert!(block_on(worker.fetch(MemoryRequest::get("/legacy.js"))).is_err());
    }

    #[test]
    fn restarted_worker_resumes_current_generation() {
        let worker = installed_worker("1.0.0", ASSETS);
        let restarted = OfflineWorker::new(
            worker.package().clone(),
            worker.store().clone(),
            worker.network().clone(),
        );
        assert_eq!(restarted.current_generation(), None);

        let outcome = block_on(restarted.fetch(MemoryRequest::get("/style.css"))).unwrap();
        assert_eq!(outcome.source(), "cache");
        assert_eq!(restarted.current_generation(), Some(CacheName::from("pwa-1.0.0")));
    }

    #[test]
    fn push_notification_body() {
        let worker = installed_worker("1.0.0", ASSETS);

        let spec = worker.notification(Some("Workout in 5 minutes"));
        assert_eq!(spec.body, "Workout in 5 minutes");
        assert_eq!(spec.icon, crate::NOTIFICATION_ICON);
        assert_eq!(spec.title, crate::NOTIFICATION_TITLE);

        assert_eq!(worker.notification(None).body, crate::DEFAULT_NOTIFICATION_BODY);
        assert_eq!(worker.notification(Some("")).body, crate::DEFAULT_NOTIFICATION_BODY);
    }

    const SHELL: &str = crate::SHELL_PATH;
    const ASSETS: &[&str] = &["/", "/index.html", "/style.css", "/wasm/client.js"];
}
