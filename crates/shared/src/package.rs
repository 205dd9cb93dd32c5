use std::{collections::HashSet, fmt::Display};

use const_format::concatcp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix shared by every cache generation this app creates
pub const CACHE_PREFIX: &str = "pwa-";
/// Version baked into the builtin package
pub const CACHE_VERSION: &str = "0.8.1";
pub const CACHE_NAME: &str = concatcp!(CACHE_PREFIX, CACHE_VERSION);

/// Document served to navigations when the network is unavailable
pub const SHELL_PATH: &str = "/index.html";

pub const ASSET_MANIFEST: &[&str] = &[
    "/",
    SHELL_PATH,
    "/style.css",
    "/manifest.json",
    "/wasm/client.js",
    "/wasm/client_bg.wasm",
    "/icons/icon-192.png",
    "/icons/icon-512.png",
];

pub const NOTIFICATION_TITLE: &str = "PWA Shell";
pub const NOTIFICATION_ICON: &str = "/icons/icon-192.png";
pub const DEFAULT_NOTIFICATION_BODY: &str = "You have a new notification";

pub const SERVICE_WORKER_URL: &str = "/service_worker.js";
pub const SERVICE_WORKER_SCOPE: &str = "/";
pub const SHELL_PACKAGE_FILENAME: &str = "shell_package.json";

/// Name of one cache generation, `pwa-<version>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheName(String);

impl CacheName {
    pub fn for_version(version: &str) -> Self {
        Self(format!("{CACHE_PREFIX}{version}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The version tag, if this name belongs to one of our generations
    pub fn version(&self) -> Option<&str> {
        self.0.strip_prefix(CACHE_PREFIX)
    }

    pub fn is_generation(&self) -> bool {
        self.version().is_some()
    }
}

impl Display for CacheName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CacheName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CacheName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedAsset {
    pub path: String,
    /// Subresource integrity string (`sha384-<base64>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
}

impl HashedAsset {
    pub fn unhashed<S: Into<String>>(path: S) -> Self {
        Self { path: path.into(), integrity: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDefaults {
    pub title: String,
    pub icon: String,
    pub default_body: String,
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            icon: NOTIFICATION_ICON.to_string(),
            default_body: DEFAULT_NOTIFICATION_BODY.to_string(),
        }
    }
}

fn default_shell() -> String {
    SHELL_PATH.to_string()
}

fn default_true() -> bool {
    true
}

/// Everything the worker needs to know about one deployed version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellPackage {
    pub version: String,
    pub assets: Vec<HashedAsset>,
    #[serde(default = "default_shell")]
    pub shell: String,
    #[serde(default)]
    pub notification: NotificationDefaults,
    /// Delete older `pwa-` generations when this version activates
    #[serde(default = "default_true")]
    pub prune_stale_generations: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    #[error("Package version is empty")]
    EmptyVersion,
    #[error("Package has no assets")]
    NoAssets,
    #[error("Asset {0} is listed more than once")]
    DuplicateAsset(String),
    #[error("Shell document {0} is not in the asset manifest")]
    ShellNotInManifest(String),
}

impl ShellPackage {
    /// The package compiled into the worker
    pub fn builtin() -> Self {
        Self::new(CACHE_VERSION, ASSET_MANIFEST.iter().copied())
    }

    pub fn new<'a, I: IntoIterator<Item = &'a str>>(version: &str, assets: I) -> Self {
        Self {
            version: version.to_string(),
            assets: assets.into_iter().map(HashedAsset::unhashed).collect(),
            shell: default_shell(),
            notification: NotificationDefaults::default(),
            prune_stale_generations: true,
        }
    }

    pub fn cache_name(&self) -> CacheName {
        CacheName::for_version(&self.version)
    }

    pub fn asset(&self, path: &str) -> Option<&HashedAsset> {
        self.assets.iter().find(|a| a.path == path)
    }

    pub fn validate(&self) -> Result<(), PackageError> {
        if self.version.trim().is_empty() {
            return Err(PackageError::EmptyVersion);
        }
        if self.assets.is_empty() {
            return Err(PackageError::NoAssets);
        }

        let mut seen = HashSet::with_capacity(self.assets.len());
        for asset in self.assets.iter() {
            if !seen.insert(asset.path.as_str()) {
                return Err(PackageError::DuplicateAsset(asset.path.clone()));
            }
        }

        if self.asset(&self.shell).is_none() {
            return Err(PackageError::ShellNotInManifest(self.shell.clone()));
        }

        Ok(())
    }
}

impl Default for ShellPackage {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builtin_package_is_valid() {
        let package = ShellPackage::builtin();
        assert_eq!(package.validate(), Ok(()));
        assert_eq!(package.cache_name().as_str(), CACHE_NAME);
        assert_eq!(package.assets.len(), ASSET_MANIFEST.len());
    }

    #[test]
    fn cache_name_version() {
        let name = CacheName::for_version("1.2.3");
        assert_eq!(name.as_str(), "pwa-1.2.3");
        assert_eq!(name.version(), Some("1.2.3"));
        assert!(!CacheName::from("other-cache").is_generation());
    }

    #[test]
    fn validate_rejects_duplicates_and_missing_shell() {
        let package = ShellPackage::new("1", ["/", "/style.css", "/style.css"]);
        assert_eq!(package.validate(), Err(PackageError::DuplicateAsset("/style.css".into())));

        let package = ShellPackage::new("1", ["/", "/style.css"]);
        assert_eq!(package.validate(), Err(PackageError::ShellNotInManifest(SHELL_PATH.into())));

        let package = ShellPackage::new(" ", ["/index.html"]);
        assert_eq!(package.validate(), Err(PackageError::EmptyVersion));
    }

    #[test]
    fn package_json_defaults() {
        let package: ShellPackage = serde_json::from_str(
            r#"{ "version": "2.0.0", "assets": [ { "path": "/index.html", "integrity": "sha384-abc" } ] }"#,
        )
        .unwrap();

        assert_eq!(package.shell, SHELL_PATH);
        assert!(package.prune_stale_generations);
        assert_eq!(package.notification, NotificationDefaults::default());
        assert_eq!(package.asset("/index.html").and_then(|a| a.integrity.as_deref()), Some("sha384-abc"));
    }
}
