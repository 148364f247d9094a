//! Test utilities for allow-scripts
//!
//! Shared helpers for unit and integration tests:
//! - [`init_test_logging`] to see `tracing` output while debugging a test
//! - [`RecordingSink`] and [`RecordingRunner`], in-memory stand-ins for the
//!   terminal and the shell
//! - [`ProjectFixture`] and [`PackageFixture`] to lay out a project with a
//!   `package.json`, installed packages and a lock file in a temporary
//!   directory
//!
//! # Example
//!
//! ```rust,no_run
//! use allow_scripts::test_utils::{PackageFixture, ProjectFixture};
//! use serde_json::json;
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut project = ProjectFixture::new()?;
//! project.write_root(&json!({
//!     "name": "@example/basic",
//!     "dependencies": { "@example/with-install-script": "*" },
//!     "allowScripts": { "@example/with-install-script": true }
//! }))?;
//! project.install(PackageFixture::new("@example/with-install-script", "0.0.0").recording("install"))?;
//! project.write_lock()?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::constants::{LOG_PREFIX, MANIFEST_FILE, NODE_MODULES, PACKAGE_LOCK_FILE};
use crate::core::{AllowScriptsError, ErrorContext, SkippedPackage};
use crate::installer::{LifecycleStage, ScriptInvocation, ScriptRunner};
use crate::utils::console::{ConsoleSink, announcement, skip_line};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, logging stays off.
///
/// ```bash
/// RUST_LOG=allow_scripts=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// A [`ConsoleSink`] that keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
    fatals: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip notices and announcements, in emission order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    /// Skip notices only.
    #[must_use]
    pub fn skips(&self) -> Vec<String> {
        self.lines().into_iter().filter(|line| line.starts_with(&format!("{LOG_PREFIX}skip "))).collect()
    }

    /// Stage announcements only.
    #[must_use]
    pub fn announcements(&self) -> Vec<String> {
        self.lines().into_iter().filter(|line| !line.starts_with(&format!("{LOG_PREFIX}skip "))).collect()
    }

    /// Fatal errors reported to the sink.
    #[must_use]
    pub fn fatals(&self) -> Vec<String> {
        self.fatals.lock().map(|fatals| fatals.clone()).unwrap_or_default()
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl ConsoleSink for RecordingSink {
    fn skipped(&self, skip: &SkippedPackage) {
        self.push(skip_line(skip));
    }

    fn stage_starting(&self, stage: LifecycleStage, label: &str, dry_run: bool) {
        self.push(announcement(stage, label, dry_run));
    }

    fn fatal(&self, error: &ErrorContext) {
        if let Ok(mut fatals) = self.fatals.lock() {
            fatals.push(error.error.to_string());
        }
    }
}

/// An owned copy of a [`ScriptInvocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedInvocation {
    /// Stage run
    pub stage: LifecycleStage,
    /// Install path or root name
    pub label: String,
    /// Command that would have run
    pub command: String,
    /// Working directory
    pub package_dir: PathBuf,
    /// Whether `unsafe_perm` was set
    pub unsafe_perm: bool,
}

/// A [`ScriptRunner`] that records invocations instead of spawning processes.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    invocations: Mutex<Vec<RecordedInvocation>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    /// Create a runner where every script succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner where the script `"<stage> <label>"` fails with exit
    /// code 1.
    #[must_use]
    pub fn failing_on(call: &str) -> Self {
        Self {
            invocations: Mutex::new(Vec::new()),
            fail_on: Some(call.to_string()),
        }
    }

    /// Everything run so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.lock().map(|invocations| invocations.clone()).unwrap_or_default()
    }

    /// `"<stage> <label>"` for everything run so far.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .map(|invocation| format!("{} {}", invocation.stage, invocation.label))
            .collect()
    }
}

impl ScriptRunner for RecordingRunner {
    async fn run_script(&self, invocation: &ScriptInvocation<'_>) -> Result<()> {
        let call = format!("{} {}", invocation.stage, invocation.label);
        if let Ok(mut invocations) = self.invocations.lock() {
            invocations.push(RecordedInvocation {
                stage: invocation.stage,
                label: invocation.label.to_string(),
                command: invocation.command.to_string(),
                package_dir: invocation.package_dir.clone(),
                unsafe_perm: invocation.unsafe_perm,
            });
        }

        if self.fail_on.as_deref() == Some(call.as_str()) {
            return Err(AllowScriptsError::ScriptFailed {
                stage: invocation.stage.to_string(),
                package: invocation.label.to_string(),
                status: "exit code 1".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// An installed package for a [`ProjectFixture`].
#[derive(Debug, Clone)]
pub struct PackageFixture {
    name: String,
    version: String,
    scripts: Map<String, Value>,
    dependencies: Vec<String>,
}

impl PackageFixture {
    /// A package without scripts or dependencies.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            scripts: Map::new(),
            dependencies: Vec::new(),
        }
    }

    /// Add a script.
    #[must_use]
    pub fn script(mut self, stage: &str, command: &str) -> Self {
        self.scripts.insert(stage.to_string(), Value::String(command.to_string()));
        self
    }

    /// Add a `stage` script appending `<stage> from <unscoped name>` to
    /// `res.txt` in the project root.
    #[must_use]
    pub fn recording(self, stage: &str) -> Self {
        let short_name = self.name.rsplit('/').next().unwrap_or(&self.name).to_string();
        let command = format!("echo '{stage} from {short_name}' >> \"$INIT_CWD/res.txt\"");
        self.script(stage, &command)
    }

    /// Add a dependency on another package.
    #[must_use]
    pub fn depends_on(mut self, name: &str) -> Self {
        self.dependencies.push(name.to_string());
        self
    }

    fn dependency_map(&self) -> Map<String, Value> {
        self.dependencies.iter().map(|name| (name.clone(), Value::String("*".to_string()))).collect()
    }

    fn manifest(&self) -> Value {
        json!({
            "name": self.name,
            "version": self.version,
            "scripts": self.scripts,
            "dependencies": self.dependency_map(),
        })
    }
}

/// A throwaway npm project in a temporary directory.
pub struct ProjectFixture {
    dir: TempDir,
    installed: Vec<(String, PackageFixture)>,
}

impl ProjectFixture {
    /// Create an empty project directory.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("Failed to create temporary project")?,
            installed: Vec::new(),
        })
    }

    /// Project root.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the root `package.json`.
    pub fn write_root(&self, manifest: &Value) -> Result<()> {
        let content = serde_json::to_string_pretty(manifest)?;
        std::fs::write(self.path().join(MANIFEST_FILE), content)?;
        Ok(())
    }

    /// Install `package` at `node_modules/<name>`.
    pub fn install(&mut self, package: PackageFixture) -> Result<()> {
        let path = format!("{NODE_MODULES}/{}", package.name);
        self.install_at(&path, package)
    }

    /// Install `package` at an explicit path, e.g. a nested
    /// `node_modules/a/node_modules/b`.
    pub fn install_at(&mut self, path: &str, package: PackageFixture) -> Result<()> {
        let dir = self.path().join(path);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(MANIFEST_FILE), serde_json::to_string_pretty(&package.manifest())?)?;
        self.installed.push((path.to_string(), package));
        Ok(())
    }

    /// Write a v3 `package-lock.json` describing every installed package.
    pub fn write_lock(&self) -> Result<()> {
        self.write_lock_file(PACKAGE_LOCK_FILE)
    }

    /// Write the v3 lock file under another name, e.g. `npm-shrinkwrap.json`.
    pub fn write_lock_file(&self, file_name: &str) -> Result<()> {
        let mut packages = Map::new();
        for (path, package) in &self.installed {
            packages.insert(
                path.clone(),
                json!({
                    "version": package.version,
                    "dependencies": package.dependency_map(),
                }),
            );
        }

        let lock = json!({
            "name": "fixture",
            "lockfileVersion": 3,
            "requires": true,
            "packages": packages,
        });
        std::fs::write(self.path().join(file_name), serde_json::to_string_pretty(&lock)?)?;
        Ok(())
    }

    /// Lines written to `res.txt` by recording scripts; empty when nothing ran.
    #[must_use]
    pub fn output(&self) -> Vec<String> {
        std::fs::read_to_string(self.path().join("res.txt"))
            .map(|content| content.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
