//! Running a single lifecycle script.
//!
//! The executor decides *what* runs and in which order; a [`ScriptRunner`]
//! only knows how to run one command. [`ShellScriptRunner`] does what npm does:
//! it hands the command to the platform shell inside the package directory,
//! with the `node_modules/.bin` shims on `PATH` and npm's lifecycle variables
//! in the environment. Script output goes straight to the terminal.

use anyhow::Result;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, trace};

use super::LifecycleStage;
use crate::constants::{BIN_DIR, NODE_MODULES};
use crate::core::AllowScriptsError;
use crate::utils::platform::{get_shell_command, prepend_to_path};

/// Everything needed to run one lifecycle script.
#[derive(Debug, Clone)]
pub struct ScriptInvocation<'a> {
    /// Stage being run
    pub stage: LifecycleStage,
    /// Install path, or the root package's name; used in messages
    pub label: &'a str,
    /// Package name
    pub package_name: &'a str,
    /// Package version
    pub package_version: &'a str,
    /// Shell command from `scripts`
    pub command: &'a str,
    /// Directory the script runs in
    pub package_dir: PathBuf,
    /// Project root
    pub project_dir: &'a Path,
    /// Root package stages run with npm's `unsafe-perm`
    pub unsafe_perm: bool,
}

/// Runs lifecycle scripts.
pub trait ScriptRunner {
    /// Run one script to completion. A script that cannot be started or exits
    /// unsuccessfully is an error.
    fn run_script(&self, invocation: &ScriptInvocation<'_>) -> impl Future<Output = Result<()>>;
}

/// Runs scripts through `sh -c` (`cmd /C` on Windows) the way npm does.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellScriptRunner;

impl ShellScriptRunner {
    /// Create a runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn build_command(invocation: &ScriptInvocation<'_>) -> Result<Command> {
        let (shell, flag) = get_shell_command();
        let path = prepend_to_path(&[
            invocation.package_dir.join(NODE_MODULES).join(BIN_DIR),
            invocation.project_dir.join(NODE_MODULES).join(BIN_DIR),
        ])?;

        let mut cmd = Command::new(shell);
        cmd.arg(flag)
            .arg(invocation.command)
            .current_dir(&invocation.package_dir)
            .env("PATH", path)
            .env("npm_lifecycle_event", invocation.stage.as_str())
            .env("npm_lifecycle_script", invocation.command)
            .env("npm_package_name", invocation.package_name)
            .env("npm_package_version", invocation.package_version)
            .env("INIT_CWD", invocation.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if invocation.unsafe_perm {
            cmd.env("npm_config_unsafe_perm", "true");
        }

        Ok(cmd)
    }
}

impl ScriptRunner for ShellScriptRunner {
    async fn run_script(&self, invocation: &ScriptInvocation<'_>) -> Result<()> {
        debug!(
            "Running {} script of {} in {}",
            invocation.stage,
            invocation.label,
            invocation.package_dir.display()
        );
        trace!("Command: {}", invocation.command);

        let mut cmd = Self::build_command(invocation)?;
        let status = cmd.status().await.map_err(|e| AllowScriptsError::ScriptSpawnFailed {
            stage: invocation.stage.to_string(),
            package: invocation.label.to_string(),
            reason: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(AllowScriptsError::ScriptFailed {
                stage: invocation.stage.to_string(),
                package: invocation.label.to_string(),
                status: describe_status(status),
            }
            .into())
        }
    }
}

fn describe_status(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit code {code}");
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("terminated by signal {signal}");
        }
    }

    status.to_string()
}
