//! Command-line interface for allow-scripts.
//!
//! ```bash
//! # Run the allowed lifecycle scripts of the project in the current directory
//! allow-scripts
//!
//! # Show what would run without running anything
//! allow-scripts --dry-run
//!
//! # Same, explicit subcommand and another project
//! allow-scripts run --dry-run --project-dir ../app
//! ```
//!
//! The usual workflow is `npm install --ignore-scripts` followed by
//! `allow-scripts`, often wired up as the project's own `postinstall`.
//!
//! # Logging
//!
//! Diagnostic logging goes to stderr and is limited to warnings by default.
//! `--verbose` raises it to `debug`, `--quiet` turns it off and `RUST_LOG`
//! overrides both. The skip notices and stage announcements are regular
//! output, not logging.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod run;

pub use run::RunCommand;

/// Logging configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can build one without parsing
/// arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// `tracing` filter directive; `None` disables logging.
    ///
    /// Ignored when `RUST_LOG` is set.
    pub log_level: Option<String>,
}

impl CliConfig {
    /// Create a configuration with logging disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global `tracing` subscriber, writing to stderr.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = &self.log_level {
            EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
        } else {
            return;
        };

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init();
    }
}

/// Run npm lifecycle scripts only for allow-listed dependencies.
#[derive(Parser, Debug)]
#[command(
    name = "allow-scripts",
    about = "Run npm lifecycle scripts only for allow-listed dependencies",
    version,
    long_about = "Runs the preinstall, install and postinstall scripts of the dependencies listed in the \
                  \"allowScripts\" section of package.json, in dependency order, followed by the root \
                  package's own lifecycle scripts. Install with `npm install --ignore-scripts` first."
)]
pub struct Cli {
    /// Command to run; defaults to `run`
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print which scripts would run without running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress skip notices and logging; errors are still shown
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Directory containing package.json (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    project_dir: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the allowed lifecycle scripts (the default)
    Run(RunCommand),
}

impl Cli {
    /// Build the configuration and execute the selected command.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();

        let project_dir = match &self.project_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        match self.command.unwrap_or(Commands::Run(RunCommand::default())) {
            Commands::Run(cmd) => cmd.execute(project_dir, self.dry_run, self.quiet).await,
        }
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
        }
    }

    /// Whether skip notices are suppressed.
    #[must_use]
    pub const fn is_quiet(&self) -> bool {
        self.quiet
    }
}
