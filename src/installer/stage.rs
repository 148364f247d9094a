//! npm lifecycle stages handled by allow-scripts.

use std::fmt;

/// A lifecycle script name from `package.json` `scripts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    /// Runs before the package is installed
    Preinstall,
    /// Runs after the package is installed (native builds usually live here)
    Install,
    /// Runs after `install`
    Postinstall,
    /// Legacy root-only stage
    Prepublish,
    /// Root-only stage run after installation
    Prepare,
}

/// Stages run for approved dependencies, in order. A dependency declaring any
/// of these needs an `allowScripts` entry.
pub const DEPENDENCY_STAGES: [LifecycleStage; 3] =
    [LifecycleStage::Preinstall, LifecycleStage::Install, LifecycleStage::Postinstall];

/// Root stages run after every dependency has finished, in order.
pub const ROOT_TRAILING_STAGES: [LifecycleStage; 4] = [
    LifecycleStage::Install,
    LifecycleStage::Postinstall,
    LifecycleStage::Prepublish,
    LifecycleStage::Prepare,
];

impl LifecycleStage {
    /// Key of the stage in `package.json` `scripts`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preinstall => "preinstall",
            Self::Install => "install",
            Self::Postinstall => "postinstall",
            Self::Prepublish => "prepublish",
            Self::Prepare => "prepare",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
