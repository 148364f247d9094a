//! Version handling for `allowScripts` entries.
//!
//! An `allowScripts` value may be a version range in npm syntax (`"2.x"`,
//! `"^1.4.0"`, `">=1.2 <3 || 4.0.0"`). [`VersionRange`] parses that syntax into
//! a set of [`semver::VersionReq`] alternatives, and [`matches_requirement`]
//! tests an installed version against it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use allow_scripts::version::{VersionRange, matches_requirement};
//!
//! let range = VersionRange::parse("2.x")?;
//! assert!(matches_requirement("2.1.0", &range));
//! assert!(!matches_requirement("1.9.9", &range));
//! # Ok::<(), anyhow::Error>(())
//! ```

use semver::Version;

pub mod range;

pub use range::VersionRange;

/// Parse an installed package version.
///
/// npm accepts a leading `v` or `=` on published versions; both are stripped.
/// Returns `None` for anything that is not a valid semantic version.
#[must_use]
pub fn parse_installed_version(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let cleaned = trimmed.trim_start_matches('=').trim_start_matches(['v', 'V']);
    Version::parse(cleaned).ok()
}

/// Check whether an installed version satisfies an allowed range.
///
/// A version that cannot be parsed never satisfies any range.
#[must_use]
pub fn matches_requirement(version: &str, range: &VersionRange) -> bool {
    match parse_installed_version(version) {
        Some(parsed) => range.matches(&parsed),
        None => {
            tracing::debug!("Installed version '{}' is not valid semver", version);
            false
        }
    }
}
