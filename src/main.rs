//! allow-scripts CLI entry point
//!
//! Parses arguments, runs the command and turns any failure into a colored
//! error message with exit code 1.

use allow_scripts::cli;
use allow_scripts::core::error::user_friendly_error;
use allow_scripts::utils::console::{ConsoleSink, TerminalSink};
use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let quiet = cli.is_quiet();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            TerminalSink::new(quiet).fatal(&error_ctx);
            std::process::exit(1);
        }
    }
}
