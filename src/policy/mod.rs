//! Allow-list policy evaluation.
//!
//! Every scheduled package that declares a `preinstall`, `install` or
//! `postinstall` script must be covered by the root manifest's `allowScripts`
//! section. Each such package location gets exactly one [`AllowDecision`]:
//!
//! | `allowScripts[name]`      | Decision                                  |
//! |---------------------------|-------------------------------------------|
//! | absent                    | error `<name> (no entry)`                 |
//! | `false`                   | warning, scripts skipped                  |
//! | `true`                    | approved                                  |
//! | range, version inside     | approved                                  |
//! | range, version outside    | warning, scripts skipped                  |
//! | unparsable range          | error `<name> (invalid semver range: ..)` |
//!
//! Decisions are made per install path, so two copies of one package at
//! different versions are judged separately. Errors never short-circuit:
//! [`evaluate`] looks at every entry so the operator sees every problem at
//! once, and [`PolicyOutcome::ensure_configured`] turns them into a single
//! aggregated error.

use tracing::{debug, trace};

use crate::core::{AllowScriptsError, SkipReason, SkippedPackage};
use crate::installer::DEPENDENCY_STAGES;
use crate::manifest::{AllowMap, AllowRule, Scripts, script_for};
use crate::resolver::ExecutionEntry;
use crate::version::{VersionRange, matches_requirement};

/// Outcome of checking one package location against the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowDecision {
    /// Scripts run
    Approved,
    /// `allowScripts` maps the name to `false`
    SkippedForbidden,
    /// The installed version is outside the allowed range
    SkippedVersionMismatch {
        /// Installed version
        version: String,
        /// Allowed range as written
        range: String,
    },
    /// The allow-list cannot decide; the run must abort
    Misconfigured(String),
}

/// Decisions for a whole execution order.
#[derive(Debug, Clone, Default)]
pub struct PolicyOutcome {
    /// Entries whose scripts run, in execution order
    pub approved: Vec<ExecutionEntry>,
    /// Entries skipped with a warning
    pub warnings: Vec<SkippedPackage>,
    /// `<name> (<problem>)` items for entries the allow-list cannot decide
    pub errors: Vec<String>,
}

impl PolicyOutcome {
    /// Fail with [`AllowScriptsError::MisconfiguredAllowScripts`] if any entry
    /// could not be decided.
    pub fn ensure_configured(&self) -> Result<(), AllowScriptsError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AllowScriptsError::MisconfiguredAllowScripts {
                entries: self.errors.clone(),
            })
        }
    }
}

/// Whether `scripts` declares a non-empty command for any stage run for
/// dependencies.
#[must_use]
pub fn has_install_scripts(scripts: &Scripts) -> bool {
    DEPENDENCY_STAGES.iter().any(|&stage| script_for(scripts, stage).is_some())
}

/// Decide one package location.
#[must_use]
pub fn decide(entry: &ExecutionEntry, allow_map: &AllowMap) -> AllowDecision {
    match allow_map.get(&entry.package_name) {
        None => AllowDecision::Misconfigured("no entry".to_string()),
        Some(AllowRule::Forbidden) => AllowDecision::SkippedForbidden,
        Some(AllowRule::Allowed) => AllowDecision::Approved,
        Some(AllowRule::RangeConstrained(raw)) => {
            let Ok(range) = VersionRange::parse(raw) else {
                return AllowDecision::Misconfigured(format!("invalid semver range: {raw}"));
            };

            if matches_requirement(&entry.package_version, &range) {
                AllowDecision::Approved
            } else {
                AllowDecision::SkippedVersionMismatch {
                    version: entry.package_version.clone(),
                    range: raw.clone(),
                }
            }
        }
    }
}

/// Evaluate every entry against `allow_map`.
///
/// Entries without install-time scripts are dropped without a decision. The
/// only error returned is [`AllowScriptsError::PolicyCountMismatch`], raised
/// if decisions were lost; configuration problems are collected in
/// [`PolicyOutcome::errors`].
pub fn evaluate(
    entries: &[ExecutionEntry],
    allow_map: &AllowMap,
) -> Result<PolicyOutcome, AllowScriptsError> {
    let mut outcome = PolicyOutcome::default();
    let mut relevant = 0;

    for entry in entries.iter().filter(|entry| has_install_scripts(&entry.scripts)) {
        relevant += 1;
        let decision = decide(entry, allow_map);
        trace!("{} ({}@{}): {:?}", entry.path, entry.package_name, entry.package_version, decision);

        match decision {
            AllowDecision::Approved => outcome.approved.push(entry.clone()),
            AllowDecision::SkippedForbidden => outcome
                .warnings
                .push(SkippedPackage::new(entry.path.clone(), SkipReason::NotAllowed)),
            AllowDecision::SkippedVersionMismatch {
                version,
                range,
            } => outcome.warnings.push(SkippedPackage::new(
                entry.path.clone(),
                SkipReason::OutsideRange {
                    version,
                    range,
                },
            )),
            AllowDecision::Misconfigured(reason) => {
                outcome.errors.push(format!("{} ({reason})", entry.package_name));
            }
        }
    }

    let decided = outcome.approved.len() + outcome.warnings.len() + outcome.errors.len();
    if decided != relevant {
        return Err(AllowScriptsError::PolicyCountMismatch {
            relevant,
            decided,
        });
    }

    debug!(
        "Allow-list: {} approved, {} skipped, {} misconfigured",
        outcome.approved.len(),
        outcome.warnings.len(),
        outcome.errors.len()
    );
    Ok(outcome)
}
