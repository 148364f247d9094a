//! Platform-specific helpers for running lifecycle scripts.
//!
//! npm runs every lifecycle script through the platform shell with the
//! package's `node_modules/.bin` directories in front of `PATH`. The helpers
//! here hide the Windows/Unix differences involved.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::PathBuf;

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Shell executable and the flag that makes it run one command string.
///
/// - Windows: `("cmd", "/C")`
/// - Unix-like: `("sh", "-c")`
///
/// ```rust,no_run
/// use allow_scripts::utils::platform::get_shell_command;
///
/// let (shell, flag) = get_shell_command();
/// let status = std::process::Command::new(shell).arg(flag).arg("echo hi").status();
/// ```
#[must_use]
pub const fn get_shell_command() -> (&'static str, &'static str) {
    if is_windows() {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// The current `PATH` with `dirs` prepended, in the given order.
///
/// Directories are added even when they do not exist yet; the shell skips
/// them during lookup.
pub fn prepend_to_path(dirs: &[PathBuf]) -> Result<OsString> {
    let existing = std::env::var_os("PATH").unwrap_or_default();
    let mut paths: Vec<PathBuf> = dirs.to_vec();
    paths.extend(std::env::split_paths(&existing));
    std::env::join_paths(paths).context("Failed to build PATH for lifecycle script")
}
