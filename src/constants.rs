//! Shared constants for file names, environment variables and console output.
//!
//! The console prefixes are a compatibility surface: tooling greps the output of
//! `allow-scripts` for `skip <path> (because ...)` and `<stage> <path-or-name>...`
//! lines, so changing these strings is a breaking change.

/// Root and installed package manifest file name.
pub const MANIFEST_FILE: &str = "package.json";

/// Lock file preferred when present (published with the package).
pub const SHRINKWRAP_FILE: &str = "npm-shrinkwrap.json";

/// Lock file used when no shrinkwrap exists.
pub const PACKAGE_LOCK_FILE: &str = "package-lock.json";

/// Directory npm installs dependencies into.
pub const NODE_MODULES: &str = "node_modules";

/// Executable shims directory inside `node_modules`.
pub const BIN_DIR: &str = ".bin";

/// Overrides the `npm` executable used to generate a temporary shrinkwrap.
pub const NPM_ENV_VAR: &str = "ALLOW_SCRIPTS_NPM";

/// Prefix of every skip and stage announcement line.
pub const LOG_PREFIX: &str = "==========> ";

/// Prefix of stage announcements in dry-run mode.
pub const DRY_RUN_PREFIX: &str = "DRY RUN ==> ";

/// Message of the fatal "tree unreadable" condition.
pub const TREE_UNREADABLE_MESSAGE: &str = "Failed to read the installed tree - you might want to `rm -rf node_modules && npm i --ignore-scripts`.";

/// Prefix of the aggregated allow-list error.
pub const MISCONFIGURED_PREFIX: &str = "Mis-configured allowedScripts";
