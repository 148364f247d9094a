//! `package.json` handling.
//!
//! The same [`PackageManifest`] type describes the project's root manifest and
//! every installed dependency's manifest. Only the root's `allowScripts`
//! section is ever consulted.
//!
//! # The `allowScripts` Section
//!
//! ```json
//! {
//!   "allowScripts": {
//!     "fsevents": true,
//!     "core-js": false,
//!     "node-sass": "4.x"
//!   }
//! }
//! ```
//!
//! Each value is one of:
//! - `true` - the package's install scripts run ([`AllowRule::Allowed`])
//! - `false` - they are skipped with a warning ([`AllowRule::Forbidden`])
//! - a version range - they run only for installed versions inside the range
//!   ([`AllowRule::RangeConstrained`])
//!
//! A package that has install scripts but no entry at all is a configuration
//! error; absence is deliberately distinct from `false`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::MANIFEST_FILE;
use crate::core::AllowScriptsError;
use crate::installer::LifecycleStage;

/// Lifecycle stage name to shell command.
pub type Scripts = BTreeMap<String, String>;

/// The `allowScripts` section: package name to rule.
pub type AllowMap = BTreeMap<String, AllowRule>;

/// A dependency section, package name to requested range, in declaration
/// order. The order decides which independent packages run first.
pub type DependencyMap = serde_json::Map<String, serde_json::Value>;

/// Trust decision declared for one package name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawAllowRule")]
pub enum AllowRule {
    /// `true`
    Allowed,
    /// `false`
    Forbidden,
    /// A version range string; validated when the policy is evaluated so that
    /// every invalid range is reported together
    RangeConstrained(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAllowRule {
    Flag(bool),
    Range(String),
}

impl From<RawAllowRule> for AllowRule {
    fn from(raw: RawAllowRule) -> Self {
        match raw {
            RawAllowRule::Flag(true) => Self::Allowed,
            RawAllowRule::Flag(false) => Self::Forbidden,
            RawAllowRule::Range(range) => Self::RangeConstrained(range),
        }
    }
}

/// The subset of `package.json` allow-scripts reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,
    /// Package version
    #[serde(default)]
    pub version: Option<String>,
    /// Lifecycle scripts
    #[serde(default)]
    pub scripts: Scripts,
    /// Runtime dependencies
    #[serde(default)]
    pub dependencies: DependencyMap,
    /// Development dependencies (installed for the root only)
    #[serde(default)]
    pub dev_dependencies: DependencyMap,
    /// Optional dependencies; a missing install is not an error
    #[serde(default)]
    pub optional_dependencies: DependencyMap,
    /// Allow-list of packages trusted to run install scripts
    #[serde(default)]
    pub allow_scripts: AllowMap,
}

impl PackageManifest {
    /// Load and parse a `package.json`.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).map_err(|e| {
            AllowScriptsError::ManifestParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Parse `package.json` content.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Command declared for `stage`, if any.
    #[must_use]
    pub fn script(&self, stage: LifecycleStage) -> Option<&str> {
        script_for(&self.scripts, stage)
    }

    /// Name shown in console output for the root package.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(root)")
    }

    /// Every dependency the root package installs, without duplicates: dev
    /// dependencies, then optional ones, then regular ones, each section in
    /// declaration order. The flag marks optional dependencies.
    #[must_use]
    pub fn root_requirements(&self) -> Vec<(String, bool)> {
        let mut seen = std::collections::HashSet::new();
        let mut requirements = Vec::new();

        let sections = [
            (&self.dev_dependencies, false),
            (&self.optional_dependencies, true),
            (&self.dependencies, false),
        ];
        for (section, optional) in sections {
            for name in section.keys() {
                if seen.insert(name.as_str()) {
                    requirements.push((name.clone(), optional));
                }
            }
        }
        requirements
    }
}

/// Command declared for `stage` in `scripts`. An empty command counts as no
/// script, as it does for npm.
#[must_use]
pub fn script_for(scripts: &Scripts, stage: LifecycleStage) -> Option<&str> {
    scripts.get(stage.as_str()).map(String::as_str).filter(|command| !command.is_empty())
}

/// Locate `package.json` in `project_dir`.
pub fn find_manifest(project_dir: &Path) -> Result<PathBuf> {
    let manifest_path = project_dir.join(MANIFEST_FILE);
    if manifest_path.is_file() {
        Ok(manifest_path)
    } else {
        Err(AllowScriptsError::ManifestNotFound {
            path: project_dir.display().to_string(),
        }
        .into())
    }
}
