//! The `run` command.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::debug;

use crate::installer::{RunOptions, ShellScriptRunner, run};
use crate::utils::console::TerminalSink;

/// Run the allowed lifecycle scripts of a project.
///
/// Takes no options of its own; `--dry-run`, `--quiet` and `--project-dir`
/// are global.
#[derive(Args, Debug, Clone, Default)]
pub struct RunCommand {}

impl RunCommand {
    /// Execute against `project_dir`.
    pub async fn execute(self, project_dir: PathBuf, dry_run: bool, quiet: bool) -> Result<()> {
        let options = RunOptions {
            project_dir,
            dry_run,
        };
        debug!("Running allow-scripts in {} (dry run: {})", options.project_dir.display(), dry_run);

        let report = run(&options, &ShellScriptRunner::new(), &TerminalSink::new(quiet)).await?;
        debug!(
            "Done: {} scheduled, {} approved, {} skipped, {} scripts",
            report.scheduled, report.approved, report.skipped, report.scripts
        );
        Ok(())
    }
}
