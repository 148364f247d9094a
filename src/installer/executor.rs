//! Phased execution of approved lifecycle scripts.
//!
//! Scripts run strictly one after another in five phases:
//!
//! 1. root `preinstall`
//! 2. `preinstall` of every approved dependency, in execution order
//! 3. `install` of every approved dependency
//! 4. `postinstall` of every approved dependency
//! 5. root `install`, `postinstall`, `prepublish`, `prepare`
//!
//! A package without a script for a stage is silently passed over. Every
//! script that does run is announced on the console sink first; in dry-run
//! mode only the announcement happens. The first failing script ends the run.

use anyhow::Result;
use std::path::PathBuf;
use tracing::debug;

use super::runner::{ScriptInvocation, ScriptRunner};
use super::{DEPENDENCY_STAGES, LifecycleStage, ROOT_TRAILING_STAGES};
use crate::manifest::script_for;
use crate::resolver::ExecutionEntry;
use crate::utils::console::ConsoleSink;

/// How scripts are executed.
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Announce scripts without running them
    pub dry_run: bool,
    /// Project root; package paths are relative to it
    pub project_dir: PathBuf,
}

/// What an execution did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Scripts run, or announced in dry-run mode
    pub scripts: usize,
}

/// Runs the five phases for one project.
pub struct PhasedExecutor<'a, R: ScriptRunner, S: ConsoleSink + ?Sized> {
    runner: &'a R,
    sink: &'a S,
    options: &'a ExecutionOptions,
}

impl<'a, R: ScriptRunner, S: ConsoleSink + ?Sized> PhasedExecutor<'a, R, S> {
    /// Create an executor.
    pub const fn new(runner: &'a R, sink: &'a S, options: &'a ExecutionOptions) -> Self {
        Self {
            runner,
            sink,
            options,
        }
    }

    /// Run the root package's and the approved dependencies' scripts.
    ///
    /// `root` is the root package with an empty path; its stages run with
    /// `unsafe_perm`.
    pub async fn execute(
        &self,
        approved: &[ExecutionEntry],
        root: &ExecutionEntry,
    ) -> Result<ExecutionSummary> {
        let mut summary = ExecutionSummary::default();

        self.run_stage(LifecycleStage::Preinstall, root, true, &mut summary).await?;

        for stage in DEPENDENCY_STAGES {
            debug!("Phase: dependency {}", stage);
            for entry in approved {
                self.run_stage(stage, entry, false, &mut summary).await?;
            }
        }

        for stage in ROOT_TRAILING_STAGES {
            self.run_stage(stage, root, true, &mut summary).await?;
        }

        debug!(
            "{} {} lifecycle scripts",
            if self.options.dry_run { "Announced" } else { "Ran" },
            summary.scripts
        );
        Ok(summary)
    }

    async fn run_stage(
        &self,
        stage: LifecycleStage,
        entry: &ExecutionEntry,
        unsafe_perm: bool,
        summary: &mut ExecutionSummary,
    ) -> Result<()> {
        let Some(command) = script_for(&entry.scripts, stage) else {
            return Ok(());
        };

        let label = if entry.path.is_empty() { &entry.package_name } else { &entry.path };
        self.sink.stage_starting(stage, label, self.options.dry_run);
        summary.scripts += 1;

        if self.options.dry_run {
            return Ok(());
        }

        let invocation = ScriptInvocation {
            stage,
            label,
            package_name: &entry.package_name,
            package_version: &entry.package_version,
            command,
            package_dir: self.options.project_dir.join(&entry.path),
            project_dir: &self.options.project_dir,
            unsafe_perm,
        };
        self.runner.run_script(&invocation).await
    }
}
