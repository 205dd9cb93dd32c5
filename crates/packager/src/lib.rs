//! Assembles the deployable bundle
//!
//! Static assets and the client bindings are copied into the output directory,
//! every manifest entry is hashed into a [ShellPackage], and the worker script
//! is written with its wasm embedded as base64 and the package inlined, so the
//! installed worker needs nothing but the script itself.

use std::{
    fs::{self, copy, create_dir_all, read, read_to_string, File},
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use base64::{display::Base64Display, engine::general_purpose::STANDARD};
use chrono::Utc;
use glob::glob;
use sha2::{Digest, Sha384};
use shared::{
    HashedAsset, ShellPackage, ASSET_MANIFEST, SERVICE_WORKER_URL, SHELL_PACKAGE_FILENAME,
    SHELL_PATH,
};
use tracing::{debug, info};

pub mod cli;
use cli::Cli;

/// Where the client bindings land in the bundle
pub const WASM_DIR: &str = "wasm";

pub const WASM_PLACEHOLDER: &str = "SERVICE_WORKER_BASE64";
pub const VERSION_PLACEHOLDER: &str = "SERVICE_WORKER_VERSION";
pub const PACKAGE_PLACEHOLDER: &str = "SHELL_PACKAGE_JSON";

fn path_to_str(path: &Path) -> Result<&str, anyhow::Error> {
    path.to_str()
        .with_context(|| format!("Path \"{:?}\" cannot be converted to utf8", path))
}

/// Subresource integrity string, `sha384-<base64>`
pub fn integrity<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha384::new();
    io::copy(reader, &mut hasher)?;

    let hash_bytes = hasher.finalize();
    Ok(format!("sha384-{}", Base64Display::new(&hash_bytes, &STANDARD)))
}

/// File behind a manifest path. The root is served by the shell document
pub fn manifest_file(bundle_dir: &Path, path: &str) -> PathBuf {
    match path.trim_start_matches('/') {
        "" => bundle_dir.join(SHELL_PATH.trim_start_matches('/')),
        relative => bundle_dir.join(relative),
    }
}

/// Copies every file under `from` into `to`, keeping the layout
pub fn copy_tree(from: &Path, to: &Path) -> Result<usize, anyhow::Error> {
    let mut copied = 0;

    for f in glob(&format!("{}/**/*", path_to_str(from)?))?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|f| f.is_file())
    {
        let target = to.join(f.strip_prefix(from)?);
        if let Some(parent) = target.parent() {
            create_dir_all(parent).with_context(|| format!("create_dir_all[{parent:?}]"))?;
        }

        debug!("   Copying {:?}", f.strip_prefix(from)?);
        copy(&f, &target).with_context(|| format!("copy[{f:?}]"))?;
        copied += 1;
    }

    Ok(copied)
}

/// Hashes every manifest entry, failing if any of them is missing
pub fn hash_manifest(bundle_dir: &Path, manifest: &[&str]) -> Result<Vec<HashedAsset>, anyhow::Error> {
    let missing = manifest
        .iter()
        .filter(|path| !manifest_file(bundle_dir, path).is_file())
        .copied()
        .collect::<Vec<_>>();

    if !missing.is_empty() {
        bail!("Manifest entries missing from the bundle: {}", missing.join(", "));
    }

    let mut assets = Vec::with_capacity(manifest.len());
    for path in manifest {
        let file = manifest_file(bundle_dir, path);
        debug!("   Hashing {path}");

        let mut reader = File::open(&file).with_context(|| format!("open[{file:?}]"))?;
        assets.push(HashedAsset {
            path: path.to_string(),
            integrity: Some(integrity(&mut reader)?),
        });
    }

    Ok(assets)
}

/// Worker script: the bindings followed by the glue with the wasm, version and
/// package filled in
pub fn render_worker_script(
    bindings: &str,
    glue: &str,
    wasm: &[u8],
    package: &ShellPackage,
) -> Result<String, anyhow::Error> {
    for placeholder in [WASM_PLACEHOLDER, VERSION_PLACEHOLDER, PACKAGE_PLACEHOLDER] {
        if !glue.contains(placeholder) {
            bail!("Worker glue is missing the {placeholder} placeholder");
        }
    }

    let wasm_base64 = Base64Display::new(wasm, &STANDARD).to_string();
    let package_json = serde_json::to_string(package)?;

    let snippet = glue
        .replace(WASM_PLACEHOLDER, &wasm_base64)
        // Include the version so a changed package is a changed script, which
        // is what makes the browser install an update
        .replace(VERSION_PLACEHOLDER, &package.version)
        .replace(PACKAGE_PLACEHOLDER, &package_json);

    Ok(format!("{bindings}\n{snippet}"))
}

pub fn package_version(args: &Cli) -> String {
    if args.timestamp_version {
        format!("{}-{}", args.version, Utc::now().format("%Y%m%d%H%M%S"))
    } else {
        args.version.clone()
    }
}

/// Builds the bundle in `args.out_dir`
pub fn package(args: &Cli) -> Result<ShellPackage, anyhow::Error> {
    if args.out_dir.exists() {
        fs::remove_dir_all(&args.out_dir).context("remove_dir_all[out_dir]")?;
    }
    create_dir_all(&args.out_dir).context("create_dir_all[out_dir]")?;

    let copied = copy_tree(&args.assets_dir, &args.out_dir).context("copy_tree[assets_dir]")?;
    info!("Copied {copied} static files from {:?}", args.assets_dir);

    if let Some(client_dir) = args.client_dir.as_ref() {
        let copied = copy_tree(client_dir, &args.out_dir.join(WASM_DIR))
            .context("copy_tree[client_dir]")?;
        info!("Copied {copied} client files from {client_dir:?}");
    }

    let version = package_version(args);
    info!("Hashing manifest for version {version}");
    let package = ShellPackage {
        version,
        assets: hash_manifest(&args.out_dir, ASSET_MANIFEST)?,
        ..ShellPackage::builtin()
    };
    package.validate()?;

    let package_path = args.out_dir.join(SHELL_PACKAGE_FILENAME);
    fs::write(&package_path, serde_json::to_string_pretty(&package)?)
        .with_context(|| format!("write[{package_path:?}]"))?;

    let bindings = read_to_string(&args.worker_js).context("read[worker_js]")?;
    let glue = read_to_string(&args.glue).context("read[glue]")?;
    let wasm = read(&args.worker_wasm).context("read[worker_wasm]")?;
    debug!("Embedding {} bytes of worker wasm", wasm.len());

    let script = render_worker_script(&bindings, &glue, &wasm, &package)?;
    let script_path = manifest_file(&args.out_dir, SERVICE_WORKER_URL);
    fs::write(&script_path, script).with_context(|| format!("write[{script_path:?}]"))?;

    info!(
        "Packaged {} ({} assets) into {:?}",
        package.cache_name(),
        package.assets.len(),
        args.out_dir
    );

    Ok(package)
}

#[cfg(test)]
mod test {
    use std::{env, process};

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("packager-{name}-{}", process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        create_dir_all(&dir).unwrap();
        dir
    }

    fn write_file(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn integrity_is_sha384_base64() {
        let hash = integrity(&mut "abc".as_bytes()).unwrap();
        assert_eq!(hash, "sha384-ywB1P0WjXou1oD1pmsZQBycsMqsO3tFjGotgWkP/W+2AhgcroefMI1i67KE0yCWn");
    }

    #[test]
    fn root_is_served_by_the_shell() {
        let dir = Path::new("dist");
        assert_eq!(manifest_file(dir, "/"), dir.join("index.html"));
        assert_eq!(manifest_file(dir, "/icons/icon-192.png"), dir.join("icons/icon-192.png"));
    }

    #[test]
    fn hash_manifest_reports_every_missing_entry() {
        let dir = scratch_dir("missing");
        write_file(&dir, "index.html", "<html></html>");

        let err = hash_manifest(&dir, &["/", "/index.html", "/style.css", "/manifest.json"])
            .unwrap_err()
            .to_string();
        assert!(err.contains("/style.css, /manifest.json"), "{err}");

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn hash_manifest_keeps_manifest_order() {
        let dir = scratch_dir("order");
        write_file(&dir, "index.html", "<html></html>");
        write_file(&dir, "style.css", "body {}");

        let assets = hash_manifest(&dir, &["/", "/index.html", "/style.css"]).unwrap();
        let paths = assets.iter().map(|a| a.path.as_str()).collect::<Vec<_>>();
        assert_eq!(paths, vec!["/", "/index.html", "/style.css"]);
        // "/" and "/index.html" are the same file
        assert_eq!(assets[0].integrity, assets[1].integrity);
        assert_ne!(assets[1].integrity, assets[2].integrity);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn copy_tree_keeps_layout() {
        let from = scratch_dir("copy-from");
        let to = scratch_dir("copy-to");
        write_file(&from, "index.html", "<html></html>");
        write_file(&from, "icons/icon-192.png", "png");

        assert_eq!(copy_tree(&from, &to).unwrap(), 2);
        assert_eq!(fs::read_to_string(to.join("icons/icon-192.png")).unwrap(), "png");

        fs::remove_dir_all(from).unwrap();
        fs::remove_dir_all(to).unwrap();
    }

    #[test]
    fn worker_script_embeds_wasm_and_package() {
        let glue = format!(
            "const PACKAGE = {PACKAGE_PLACEHOLDER};\nconst VERSION = \"{VERSION_PLACEHOLDER}\";\nconst WASM = \"{WASM_PLACEHOLDER}\";"
        );
        let package = ShellPackage::new("2.0.0", ["/index.html"]);

        let script = render_worker_script("// bindings", &glue, b"abc", &package).unwrap();

        assert!(script.starts_with("// bindings\n"));
        assert!(script.contains("const WASM = \"YWJj\";"));
        assert!(script.contains("const VERSION = \"2.0.0\";"));
        assert!(script.contains(&serde_json::to_string(&package).unwrap()));
    }

    #[test]
    fn worker_glue_needs_every_placeholder() {
        let package = ShellPackage::builtin();
        let err = render_worker_script("", WASM_PLACEHOLDER, b"", &package).unwrap_err();
        assert!(err.to_string().contains(VERSION_PLACEHOLDER));
    }
}
