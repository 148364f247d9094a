//! npm lock file model.
//!
//! Both lock file generations are normalised into one flat map from install
//! path (`node_modules/a/node_modules/b`) to [`LockedPackage`]:
//!
//! - **v1** (`lockfileVersion: 1`, npm 5-6): a nested `dependencies` object
//!   where each entry lists what it `requires` and nests its own private
//!   installs under `dependencies`.
//! - **v2 / v3** (npm 7+): a flat `packages` object keyed by install path, each
//!   entry listing its `dependencies` and `optionalDependencies`. Workspace
//!   members appear as `link` entries pointing at their real location.
//!
//! When a lock file carries both shapes (v2), the `packages` map wins.
//!
//! Producing a lock file is npm's job; [`io::find_or_generate`] only locates an
//! existing one or asks npm for a temporary shrinkwrap.

use anyhow::{Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::constants::NODE_MODULES;
use crate::manifest::DependencyMap;

pub mod io;

pub use io::find_or_generate;

/// One installed package location as recorded in the lock file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockedPackage {
    /// Package name when it differs from the install directory name
    pub name: Option<String>,
    /// Installed version
    pub version: Option<String>,
    /// Names this package requires, in lookup order
    pub requires: Vec<String>,
    /// Names this package may go without
    pub optional_requires: Vec<String>,
    /// Whether the package itself is optional (may be absent on disk)
    pub optional: bool,
    /// For workspace links: path of the real package
    pub link_target: Option<String>,
}

/// A lock file normalised to install path → package.
#[derive(Debug, Clone, Default)]
pub struct PackageLock {
    /// Declared `lockfileVersion`
    pub lockfile_version: u32,
    /// Installed packages keyed by path relative to the project root
    pub packages: BTreeMap<String, LockedPackage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLockfile {
    #[serde(default)]
    lockfile_version: Option<u32>,
    #[serde(default)]
    packages: Option<BTreeMap<String, RawPackageEntry>>,
    #[serde(default)]
    dependencies: Option<BTreeMap<String, RawV1Entry>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPackageEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dependencies: DependencyMap,
    #[serde(default)]
    optional_dependencies: DependencyMap,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    link: bool,
    #[serde(default)]
    resolved: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawV1Entry {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    requires: DependencyMap,
    #[serde(default)]
    dependencies: BTreeMap<String, RawV1Entry>,
    #[serde(default)]
    optional: bool,
}

impl PackageLock {
    /// Parse lock file content.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawLockfile = serde_json::from_str(content)?;
        let lockfile_version = raw.lockfile_version.unwrap_or(1);

        let packages = if let Some(packages) = raw.packages {
            from_packages_map(packages)
        } else if let Some(dependencies) = raw.dependencies {
            let mut packages = BTreeMap::new();
            flatten_v1("", dependencies, &mut packages);
            packages
        } else if lockfile_version >= 2 {
            bail!("lock file version {lockfile_version} has no \"packages\" section");
        } else {
            BTreeMap::new()
        };

        tracing::debug!(
            "Parsed lock file v{} with {} installed packages",
            lockfile_version,
            packages.len()
        );

        Ok(Self {
            lockfile_version,
            packages,
        })
    }

    /// Entry installed at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&LockedPackage> {
        self.packages.get(path)
    }

    /// Resolve `name` as required from the package at `from`, using Node's
    /// module lookup: the package's own `node_modules`, then each enclosing
    /// `node_modules` up to the project root. Workspace links are followed.
    ///
    /// `from` is `""` for the root package.
    #[must_use]
    pub fn resolve(&self, from: &str, name: &str) -> Option<String> {
        let mut base = from;
        loop {
            let candidate = if base.is_empty() {
                format!("{NODE_MODULES}/{name}")
            } else {
                format!("{base}/{NODE_MODULES}/{name}")
            };

            if let Some(entry) = self.packages.get(&candidate) {
                return Some(entry.link_target.clone().unwrap_or(candidate));
            }

            if base.is_empty() {
                return None;
            }
            base = parent_install_dir(base);
        }
    }
}

/// The directory whose `node_modules` contains `path`, or `""` for top-level
/// installs and workspace members.
fn parent_install_dir(path: &str) -> &str {
    let marker = format!("/{NODE_MODULES}/");
    match path.rfind(&marker) {
        Some(index) => &path[..index],
        None => "",
    }
}

/// Keys of a dependency section in declaration order.
fn names(section: DependencyMap) -> Vec<String> {
    section.into_iter().map(|(name, _)| name).collect()
}

fn from_packages_map(packages: BTreeMap<String, RawPackageEntry>) -> BTreeMap<String, LockedPackage> {
    packages
        .into_iter()
        .filter(|(path, _)| !path.is_empty())
        .map(|(path, entry)| {
            let link_target = if entry.link {
                entry.resolved.clone()
            } else {
                None
            };
            let mut requires = names(entry.dependencies);
            let optional_requires = names(entry.optional_dependencies);
            for name in &optional_requires {
                if !requires.contains(name) {
                    requires.push(name.clone());
                }
            }

            let package = LockedPackage {
                name: entry.name,
                version: entry.version,
                requires,
                optional_requires,
                optional: entry.optional,
                link_target,
            };
            (path, package)
        })
        .collect()
}

fn flatten_v1(
    parent: &str,
    dependencies: BTreeMap<String, RawV1Entry>,
    out: &mut BTreeMap<String, LockedPackage>,
) {
    for (name, entry) in dependencies {
        let path = if parent.is_empty() {
            format!("{NODE_MODULES}/{name}")
        } else {
            format!("{parent}/{NODE_MODULES}/{name}")
        };

        out.insert(
            path.clone(),
            LockedPackage {
                name: Some(name),
                version: entry.version,
                requires: names(entry.requires),
                optional_requires: Vec::new(),
                optional: entry.optional,
                link_target: None,
            },
        );

        flatten_v1(&path, entry.dependencies, out);
    }
}
