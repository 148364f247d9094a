//! Integration test suite for allow-scripts
//!
//! End-to-end tests that lay out real npm projects in temporary directories
//! (root `package.json`, installed packages under `node_modules`, a lock file)
//! and run allow-scripts against them, either through the library or through
//! the compiled binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! cargo nextest run --test integration
//! ```
//!
//! # Test Organization
//!
//! - **run**: library runs with the shell runner: ordering, cycles,
//!   allow-list decisions, dry runs, lock file handling
//! - **cli**: the `allow-scripts` binary: exit codes, stdout/stderr split,
//!   `--quiet` and `--project-dir`
//!
//! Fixture scripts are POSIX shell one-liners, so both suites are Unix-only.

#[cfg(unix)]
mod cli;
#[cfg(unix)]
mod fixtures;
#[cfg(unix)]
mod run;
