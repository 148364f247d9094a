//! Core types shared across allow-scripts: the error model and skip notices.

pub mod error;
pub mod skip;

pub use error::{AllowScriptsError, ErrorContext, user_friendly_error};
pub use skip::{SkipReason, SkippedPackage};
