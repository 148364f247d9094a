//! Lock file discovery.
//!
//! Lookup order inside the project directory:
//! 1. `npm-shrinkwrap.json`
//! 2. `package-lock.json`
//! 3. a shrinkwrap generated on the fly with `npm shrinkwrap`, read and then
//!    deleted so the project is left as it was found
//!
//! The npm executable is taken from `ALLOW_SCRIPTS_NPM` when set, otherwise
//! looked up in `PATH`.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::PackageLock;
use crate::constants::{NPM_ENV_VAR, PACKAGE_LOCK_FILE, SHRINKWRAP_FILE};

/// Load the project's lock file, generating a temporary one if none exists.
pub async fn find_or_generate(project_dir: &Path) -> Result<PackageLock> {
    for file in [SHRINKWRAP_FILE, PACKAGE_LOCK_FILE] {
        let path = project_dir.join(file);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!("Using lock file {}", path.display());
            return load(&path).await;
        }
    }

    debug!("No lock file in {}, generating a shrinkwrap", project_dir.display());
    generate_shrinkwrap(project_dir).await
}

/// Read and parse a lock file.
pub async fn load(path: &Path) -> Result<PackageLock> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    PackageLock::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn generate_shrinkwrap(project_dir: &Path) -> Result<PackageLock> {
    let npm = npm_command()?;
    debug!("Running {} shrinkwrap in {}", npm.display(), project_dir.display());

    let output = Command::new(&npm)
        .arg("shrinkwrap")
        .current_dir(project_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .with_context(|| format!("Failed to run {} shrinkwrap", npm.display()))?;

    let path = project_dir.join(SHRINKWRAP_FILE);
    if !output.status.success() {
        let _ = tokio::fs::remove_file(&path).await;
        bail!("npm shrinkwrap failed: {}", String::from_utf8_lossy(&output.stderr).trim());
    }

    let lock = load(&path).await;
    tokio::fs::remove_file(&path)
        .await
        .with_context(|| format!("Failed to remove generated {}", path.display()))?;
    lock
}

fn npm_command() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(NPM_ENV_VAR)
        && !path.is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    which::which("npm").with_context(|| {
        format!("npm was not found in PATH; set {NPM_ENV_VAR} or add a {PACKAGE_LOCK_FILE}")
    })
}
