//! Non-fatal skip notices shared by the graph builder and the policy evaluator.

use std::fmt;

/// Why a package's scripts will not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The package can reach itself through its dependencies
    Cycle,
    /// `allowScripts` maps the package name to `false`
    NotAllowed,
    /// The installed version does not satisfy the allowed range
    OutsideRange {
        /// Installed version
        version: String,
        /// Range from `allowScripts`
        range: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle => write!(f, "it has a cycle in dependencies"),
            Self::NotAllowed => write!(f, "it is not allowed"),
            Self::OutsideRange {
                version,
                range,
            } => write!(f, "{version} is outside of allowed range: {range}"),
        }
    }
}

/// A package location whose scripts are skipped, rendered as
/// `skip <path> (because <reason>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPackage {
    /// Install path of the skipped package
    pub path: String,
    /// Why it is skipped
    pub reason: SkipReason,
}

impl SkippedPackage {
    /// Create a skip notice for `path`.
    pub fn new(path: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }
}

impl fmt::Display for SkippedPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skip {} (because {})", self.path, self.reason)
    }
}
