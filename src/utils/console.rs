//! User-facing console output.
//!
//! Everything the operator is meant to read goes through a [`ConsoleSink`]:
//! skip notices, stage announcements and the final fatal error. Diagnostic
//! logging uses `tracing` instead and is off by default.
//!
//! The line formats are stable:
//!
//! ```text
//! ==========> skip node_modules/core-js (because it is not allowed)
//! ==========> install node_modules/fsevents...
//! DRY RUN ==> install node_modules/fsevents
//! ```

use std::io::Write;

use crate::constants::{DRY_RUN_PREFIX, LOG_PREFIX};
use crate::core::{ErrorContext, SkippedPackage};
use crate::installer::LifecycleStage;

/// Receives the user-facing events of a run.
pub trait ConsoleSink {
    /// A package's scripts will not run.
    fn skipped(&self, skip: &SkippedPackage);

    /// A lifecycle script is about to run, or would run in dry-run mode.
    /// `label` is the package's install path, or the root package's name.
    fn stage_starting(&self, stage: LifecycleStage, label: &str, dry_run: bool);

    /// The run is aborting.
    fn fatal(&self, error: &ErrorContext);
}

/// Render a skip notice line.
#[must_use]
pub fn skip_line(skip: &SkippedPackage) -> String {
    format!("{LOG_PREFIX}{skip}")
}

/// Render a stage announcement line.
#[must_use]
pub fn announcement(stage: LifecycleStage, label: &str, dry_run: bool) -> String {
    if dry_run {
        format!("{DRY_RUN_PREFIX}{stage} {label}")
    } else {
        format!("{LOG_PREFIX}{stage} {label}...")
    }
}

/// Writes announcements to stdout and skip notices and errors to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalSink {
    quiet: bool,
}

impl TerminalSink {
    /// Create a sink. A quiet sink drops skip notices but still prints stage
    /// announcements and errors.
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self {
            quiet,
        }
    }
}

impl ConsoleSink for TerminalSink {
    fn skipped(&self, skip: &SkippedPackage) {
        if !self.quiet {
            eprintln!("{}", skip_line(skip));
        }
    }

    fn stage_starting(&self, stage: LifecycleStage, label: &str, dry_run: bool) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout);
        let _ = writeln!(stdout, "{}", announcement(stage, label, dry_run));
        let _ = stdout.flush();
    }

    fn fatal(&self, error: &ErrorContext) {
        error.display();
    }
}
