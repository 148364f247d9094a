//! Error handling for allow-scripts
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** ([`AllowScriptsError`]) for precise handling in code
//! 2. **User-friendly messages** ([`ErrorContext`]) with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Fatal before execution**: [`AllowScriptsError::ManifestNotFound`],
//!   [`AllowScriptsError::ManifestParseError`], [`AllowScriptsError::TreeUnreadable`],
//!   [`AllowScriptsError::MisconfiguredAllowScripts`]
//! - **Fatal during execution**: [`AllowScriptsError::ScriptFailed`],
//!   [`AllowScriptsError::ScriptSpawnFailed`]
//! - **Internal invariants**: [`AllowScriptsError::CircularDependency`],
//!   [`AllowScriptsError::PolicyCountMismatch`]
//!
//! Allow-list problems are collected and reported together in a single
//! [`AllowScriptsError::MisconfiguredAllowScripts`]; script failures stop the run
//! at the first failing script.
//!
//! # Examples
//!
//! ```rust,no_run
//! use allow_scripts::core::{AllowScriptsError, user_friendly_error};
//!
//! let error = AllowScriptsError::MisconfiguredAllowScripts {
//!     entries: vec!["left-pad (no entry)".to_string()],
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with a suggestion
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::constants::{MISCONFIGURED_PREFIX, TREE_UNREADABLE_MESSAGE};

/// All failure cases of an allow-scripts run.
#[derive(Error, Debug, Clone)]
pub enum AllowScriptsError {
    /// No `package.json` in the project directory
    #[error("No package.json found in {path}")]
    ManifestNotFound {
        /// Directory that was searched
        path: String,
    },

    /// A `package.json` exists but cannot be used
    #[error("Invalid manifest file {file}: {reason}")]
    ManifestParseError {
        /// Manifest file path
        file: String,
        /// Parser or validation message
        reason: String,
    },

    /// The logical dependency tree could not be built from the lock file and
    /// the installed packages
    #[error("{}", TREE_UNREADABLE_MESSAGE)]
    TreeUnreadable {
        /// Underlying cause, shown as details
        reason: String,
    },

    /// One or more packages with lifecycle scripts have no usable `allowScripts` entry
    #[error("{}: {}", MISCONFIGURED_PREFIX, .entries.join(", "))]
    MisconfiguredAllowScripts {
        /// One `<name> (<problem>)` item per offending package, in scheduler order
        entries: Vec<String>,
    },

    /// The ordering constraints contain a cycle
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// Paths participating in the cycle
        chain: String,
    },

    /// Policy evaluation lost or duplicated an entry
    #[error(
        "Package count does not match: {relevant} packages with install scripts but {decided} decisions"
    )]
    PolicyCountMismatch {
        /// Entries declaring at least one install-time script
        relevant: usize,
        /// Approved + warned + errored entries
        decided: usize,
    },

    /// A lifecycle script exited unsuccessfully
    #[error("{stage} script of {package} failed: {status}")]
    ScriptFailed {
        /// Lifecycle stage name
        stage: String,
        /// Path of the package, or the root package name
        package: String,
        /// Exit code or signal description
        status: String,
    },

    /// A lifecycle script could not be started at all
    #[error("Failed to start {stage} script of {package}: {reason}")]
    ScriptSpawnFailed {
        /// Lifecycle stage name
        stage: String,
        /// Path of the package, or the root package name
        package: String,
        /// OS error message
        reason: String,
    },

    /// Anything else
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// An [`AllowScriptsError`] with optional details and a suggestion for the user.
///
/// ```rust,no_run
/// use allow_scripts::core::{AllowScriptsError, ErrorContext};
///
/// let context = ErrorContext::new(AllowScriptsError::ManifestNotFound {
///     path: ".".to_string(),
/// })
/// .with_suggestion("Run allow-scripts from the directory containing package.json");
///
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: AllowScriptsError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: AllowScriptsError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Recognizes [`AllowScriptsError`] variants, IO errors and JSON errors; anything
/// else is shown with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(typed) = error.downcast_ref::<AllowScriptsError>() {
        return create_error_context(typed.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(AllowScriptsError::Other {
                    message: format!("Permission denied: {io_error}"),
                })
                .with_suggestion("Check the ownership and permissions of the project directory and node_modules");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(AllowScriptsError::Other {
                    message: format!("File not found: {io_error}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(json_error) = error.downcast_ref::<serde_json::Error>() {
        return ErrorContext::new(AllowScriptsError::Other {
            message: format!("JSON parsing error: {json_error}"),
        })
        .with_suggestion("Check the JSON syntax of package.json and the lock file");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(AllowScriptsError::Other {
        message,
    })
}

fn create_error_context(error: AllowScriptsError) -> ErrorContext {
    match &error {
        AllowScriptsError::ManifestNotFound { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Run allow-scripts from your project root or pass --project-dir"),

        AllowScriptsError::ManifestParseError { file, .. } => {
            let suggestion = format!(
                "Check {file}: \"allowScripts\" values must be true, false or a semver range string"
            );
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }

        AllowScriptsError::TreeUnreadable { reason } => {
            let details = reason.clone();
            ErrorContext::new(error.clone())
                .with_details(details)
                .with_suggestion("Reinstall without running scripts, then run allow-scripts again")
        }

        AllowScriptsError::MisconfiguredAllowScripts { entries } => {
            let details = format!(
                "{} package(s) with install scripts need an \"allowScripts\" entry in package.json",
                entries.len()
            );
            ErrorContext::new(error.clone())
                .with_details(details)
                .with_suggestion(
                    "Add each package to \"allowScripts\": true to run its scripts, false to skip them, or a semver range",
                )
        }

        AllowScriptsError::ScriptFailed { .. } | AllowScriptsError::ScriptSpawnFailed { .. } => {
            ErrorContext::new(error.clone())
                .with_details("Scripts after the failing one were not run; node_modules may be partially built")
                .with_suggestion("Fix the failing script or set its package to false in \"allowScripts\"")
        }

        AllowScriptsError::CircularDependency { .. } | AllowScriptsError::PolicyCountMismatch { .. } => {
            ErrorContext::new(error.clone()).with_details(
                "This is an internal error. Please report it together with your package-lock.json",
            )
        }

        _ => ErrorContext::new(error.clone()),
    }
}
