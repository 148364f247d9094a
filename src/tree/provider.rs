//! Builds the logical dependency tree of a project.
//!
//! Edges come from the lock file; names, versions and scripts come from each
//! installed `package.json`, since that is what npm would actually execute.
//! A required package that cannot be resolved, or that the lock file lists
//! but is missing from disk, makes the whole tree unreadable. Optional
//! dependencies are the exception: when they are absent the edge is dropped.

use anyhow::{Context, Result, bail};
use std::collections::VecDeque;
use std::path::Path;
use tracing::{debug, trace};

use super::{PackageTree, TreeBuilder};
use crate::constants::MANIFEST_FILE;
use crate::core::AllowScriptsError;
use crate::lockfile::{self, PackageLock};
use crate::manifest::PackageManifest;

/// Load the lock file of `project_dir` and build its logical tree.
///
/// Any failure is reported as [`AllowScriptsError::TreeUnreadable`] with the
/// underlying cause as its reason.
pub async fn load_tree(project_dir: &Path, root: &PackageManifest) -> Result<PackageTree> {
    let tree = match lockfile::find_or_generate(project_dir).await {
        Ok(lock) => build_logical_tree(project_dir, root, &lock).await,
        Err(e) => Err(e),
    };

    tree.map_err(|e| {
        AllowScriptsError::TreeUnreadable {
            reason: format!("{e:#}"),
        }
        .into()
    })
}

/// Build the logical tree from an already parsed lock file.
pub async fn build_logical_tree(
    project_dir: &Path,
    root: &PackageManifest,
    lock: &PackageLock,
) -> Result<PackageTree> {
    let mut builder =
        TreeBuilder::new(root.display_name(), root.version.clone().unwrap_or_default());
    builder.set_root_scripts(root.scripts.clone());

    let mut pending = VecDeque::from([(builder.root(), String::new())]);

    while let Some((id, path)) = pending.pop_front() {
        let requirements: Vec<(String, bool)> = if path.is_empty() {
            root.root_requirements()
        } else {
            lock.get(&path)
                .map(|entry| {
                    entry
                        .requires
                        .iter()
                        .map(|name| (name.clone(), entry.optional_requires.contains(name)))
                        .collect()
                })
                .unwrap_or_default()
        };

        for (name, optional) in requirements {
            let Some(dep_path) = lock.resolve(&path, &name) else {
                if optional {
                    debug!("Optional dependency {} of {} is not installed", name, describe(&path));
                    continue;
                }
                bail!("{} requires {}, which is missing from the lock file", describe(&path), name);
            };

            let child = if let Some(existing) = builder.get(&dep_path) {
                existing
            } else {
                let entry = lock.get(&dep_path);
                let Some(installed) = read_installed(project_dir, &dep_path).await? else {
                    if optional || entry.is_some_and(|entry| entry.optional) {
                        debug!("Optional package {} is not installed", dep_path);
                        continue;
                    }
                    bail!("{} is in the lock file but not installed", dep_path);
                };

                let package_name = installed
                    .name
                    .clone()
                    .or_else(|| entry.and_then(|entry| entry.name.clone()))
                    .unwrap_or_else(|| name.clone());
                let version = installed
                    .version
                    .clone()
                    .or_else(|| entry.and_then(|entry| entry.version.clone()))
                    .unwrap_or_default();

                trace!("Found {}@{} at {}", package_name, version, dep_path);
                let child = builder.add_package(package_name, version, dep_path.clone(), installed.scripts);
                pending.push_back((child, dep_path));
                child
            };

            builder.add_dependency(id, child);
        }
    }

    let tree = builder.build();
    debug!("Logical tree has {} installed packages", tree.len() - 1);
    Ok(tree)
}

fn describe(path: &str) -> &str {
    if path.is_empty() { "the root package" } else { path }
}

async fn read_installed(project_dir: &Path, path: &str) -> Result<Option<PackageManifest>> {
    let manifest_path = project_dir.join(path).join(MANIFEST_FILE);
    if !tokio::fs::try_exists(&manifest_path).await.unwrap_or(false) {
        return Ok(None);
    }

    PackageManifest::load(&manifest_path)
        .await
        .map(Some)
        .with_context(|| format!("Failed to read installed package {path}"))
}
