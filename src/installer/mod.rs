//! Running the allow-listed lifecycle scripts of a project.
//!
//! This is the top of the pipeline. One [`run`] goes through these steps:
//!
//! 1. **Load**: read the root `package.json` and build the logical dependency
//!    tree from the lock file and `node_modules`
//! 2. **Order**: collect ordering constraints (pruning cycles) and sort them
//!    topologically ([`crate::resolver`])
//! 3. **Judge**: check every package with install scripts against
//!    `allowScripts` ([`crate::policy`]); any undecidable package aborts the
//!    run here, before a single script has started
//! 4. **Execute**: run the approved scripts in phases ([`executor`])
//!
//! Everything up to step 4 is free of side effects, which is what makes a dry
//! run report exactly the decisions a real run would act on.
//!
//! # Example
//!
//! ```rust,no_run
//! use allow_scripts::installer::{RunOptions, ShellScriptRunner, run};
//! use allow_scripts::utils::console::TerminalSink;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let options = RunOptions {
//!     project_dir: std::env::current_dir()?,
//!     dry_run: true,
//! };
//! let report = run(&options, &ShellScriptRunner::new(), &TerminalSink::new(false)).await?;
//! println!("{} scripts would run", report.scripts);
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::manifest::{AllowMap, PackageManifest, find_manifest};
use crate::policy;
use crate::resolver::{ExecutionEntry, execution_order};
use crate::tree::{PackageTree, load_tree};
use crate::utils::console::ConsoleSink;

pub mod executor;
pub mod runner;
pub mod stage;

pub use executor::{ExecutionOptions, ExecutionSummary, PhasedExecutor};
pub use runner::{ScriptInvocation, ScriptRunner, ShellScriptRunner};
pub use stage::{DEPENDENCY_STAGES, LifecycleStage, ROOT_TRAILING_STAGES};

/// Options of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory containing the root `package.json`
    pub project_dir: PathBuf,
    /// Announce scripts without running them
    pub dry_run: bool,
}

/// What a run decided and did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Package locations in the execution order (cyclic ones excluded)
    pub scheduled: usize,
    /// Packages whose scripts were approved
    pub approved: usize,
    /// Packages skipped by the allow-list
    pub skipped: usize,
    /// Scripts run, or announced in dry-run mode
    pub scripts: usize,
}

/// Load the project at `options.project_dir` and run its allowed scripts.
pub async fn run<R, S>(options: &RunOptions, runner: &R, sink: &S) -> Result<RunReport>
where
    R: ScriptRunner,
    S: ConsoleSink + ?Sized,
{
    let manifest_path = find_manifest(&options.project_dir)?;
    debug!("Using manifest {}", manifest_path.display());

    let root = PackageManifest::load(&manifest_path).await?;
    let tree = load_tree(&options.project_dir, &root).await?;

    run_tree(&tree, &root.allow_scripts, options, runner, sink).await
}

/// Run the allowed scripts of an already built tree.
pub async fn run_tree<R, S>(
    tree: &PackageTree,
    allow_map: &AllowMap,
    options: &RunOptions,
    runner: &R,
    sink: &S,
) -> Result<RunReport>
where
    R: ScriptRunner,
    S: ConsoleSink + ?Sized,
{
    let entries = execution_order(tree, sink)?;

    let outcome = policy::evaluate(&entries, allow_map)?;
    outcome.ensure_configured()?;
    for skip in &outcome.warnings {
        sink.skipped(skip);
    }

    let root_node = tree.root();
    let root = ExecutionEntry {
        path: root_node.path.clone(),
        package_name: root_node.name.clone(),
        package_version: root_node.version.clone(),
        scripts: root_node.scripts.clone(),
    };

    let execution_options = ExecutionOptions {
        dry_run: options.dry_run,
        project_dir: options.project_dir.clone(),
    };
    let summary = PhasedExecutor::new(runner, sink, &execution_options)
        .execute(&outcome.approved, &root)
        .await?;

    let report = RunReport {
        scheduled: entries.len(),
        approved: outcome.approved.len(),
        skipped: outcome.warnings.len(),
        scripts: summary.scripts,
    };
    info!(
        "{} packages scheduled, {} approved, {} skipped, {} scripts",
        report.scheduled, report.approved, report.skipped, report.scripts
    );
    Ok(report)
}
