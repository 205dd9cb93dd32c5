use std::path::PathBuf;

use clap::Parser;
use shared::CACHE_VERSION;

#[derive(Debug, Clone, Parser)]
#[clap(name = "pwa shell packager")]
pub struct Cli {
    /// Static files: index.html, style.css, manifest.json, icons
    #[clap(long, env, default_value = "assets")]
    pub assets_dir: PathBuf,
    /// wasm-bindgen (`--target no-modules`) output for the service worker
    #[clap(long, env)]
    pub worker_js: PathBuf,
    #[clap(long, env)]
    pub worker_wasm: PathBuf,
    /// wasm-bindgen output for the client, copied to `/wasm`
    #[clap(long, env)]
    pub client_dir: Option<PathBuf>,
    #[clap(long, env, default_value = "dist")]
    pub out_dir: PathBuf,
    /// Names the cache generation. Bump it to roll out an update
    #[clap(long, env = "SHELL_VERSION", default_value = CACHE_VERSION)]
    pub version: String,
    /// Appends the build time to the version so every build is a new generation
    #[clap(long, env, default_value = "false")]
    pub timestamp_version: bool,
    /// Worker event wiring appended to the bindings
    #[clap(long, env, default_value = "crates/service-worker/register_listeners.js")]
    pub glue: PathBuf,
}
