//! Execution ordering for lifecycle scripts.
//!
//! Turning a logical dependency tree into a script order happens in two steps:
//!
//! 1. **Constraint collection** ([`dependency_graph::scan`]): a depth-first walk
//!    records, for every install path, which packages depend on it. Packages
//!    inside a dependency cycle are pruned here with a skip notice.
//! 2. **Scheduling** ([`scheduler::order`]): a stable topological sort puts
//!    every dependency before the packages requiring it, breaking ties by
//!    discovery order.
//!
//! [`execution_order`] runs both steps and pairs each scheduled path with the
//! package installed there.
//!
//! # Example
//!
//! ```rust,no_run
//! use allow_scripts::resolver::execution_order;
//! use allow_scripts::tree::TreeBuilder;
//! use allow_scripts::utils::console::TerminalSink;
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut builder = TreeBuilder::new("app", "1.0.0");
//! let root = builder.root();
//! let a = builder.add_package("a", "1.0.0", "node_modules/a", Default::default());
//! builder.add_dependency(root, a);
//!
//! let entries = execution_order(&builder.build(), &TerminalSink::new(false))?;
//! assert_eq!(entries[0].path, "node_modules/a");
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use tracing::debug;

use crate::manifest::Scripts;
use crate::tree::PackageTree;
use crate::utils::console::ConsoleSink;

pub mod dependency_graph;
pub mod scheduler;

pub use dependency_graph::{OrderingConstraint, OrderingConstraints, scan};
pub use scheduler::order;

/// One scheduled package location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionEntry {
    /// Install path
    pub path: String,
    /// Name from the installed manifest
    pub package_name: String,
    /// Installed version
    pub package_version: String,
    /// Lifecycle scripts declared by the package
    pub scripts: Scripts,
}

/// Scan `tree` and return its packages in script execution order.
pub fn execution_order<S: ConsoleSink + ?Sized>(
    tree: &PackageTree,
    sink: &S,
) -> Result<Vec<ExecutionEntry>> {
    let constraints = scan(tree, sink);
    let ordered = order(&constraints)?;

    let entries = ordered
        .into_iter()
        .map(|path| {
            let node = tree
                .find_by_path(&path)
                .with_context(|| format!("Scheduled path {path} is not in the tree"))?;
            Ok(ExecutionEntry {
                package_name: node.name.clone(),
                package_version: node.version.clone(),
                scripts: node.scripts.clone(),
                path,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("Execution order: {:?}", entries.iter().map(|e| e.path.as_str()).collect::<Vec<_>>());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingSink;
    use crate::tree::TreeBuilder;

    #[test]
    fn test_execution_order_carries_package_data() {
        let mut builder = TreeBuilder::new("app", "1.0.0");
        let root = builder.root();
        let mut scripts = Scripts::new();
        scripts.insert("install".to_string(), "node build.js".to_string());
        let a = builder.add_package("a", "1.2.3", "node_modules/a", Scripts::new());
        let b = builder.add_package("b", "0.1.0", "node_modules/a/node_modules/b", scripts);
        builder.add_dependency(root, a);
        builder.add_dependency(a, b);

        let entries = execution_order(&builder.build(), &RecordingSink::new()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "node_modules/a/node_modules/b");
        assert_eq!(entries[0].package_name, "b");
        assert_eq!(entries[0].scripts.get("install").map(String::as_str), Some("node build.js"));
        assert_eq!(entries[1].package_version, "1.2.3");
    }

    #[test]
    fn test_root_is_never_scheduled() {
        let builder = TreeBuilder::new("app", "1.0.0");
        let entries = execution_order(&builder.build(), &RecordingSink::new()).unwrap();
        assert!(entries.is_empty());
    }
}
