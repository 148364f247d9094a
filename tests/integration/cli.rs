//! Tests of the `allow-scripts` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use crate::fixtures::{self, WITH_INSTALL, WITH_POSTINSTALL};

fn allow_scripts() -> Command {
    let mut cmd = Command::cargo_bin("allow-scripts").unwrap();
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_dry_run_prints_announcements() {
    let project = fixtures::basic();
    project.write_lock().unwrap();

    allow_scripts()
        .arg("--dry-run")
        .current_dir(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN ==> preinstall @example/basic"))
        .stdout(predicate::str::contains(
            "DRY RUN ==> install node_modules/@example/with-install-script",
        ))
        .stdout(predicate::str::contains("DRY RUN ==> prepare @example/basic"))
        .stdout(predicate::str::contains("without-scripts").not());

    assert!(project.output().is_empty());
}

#[test]
fn test_runs_scripts_and_announces_them() {
    let project = fixtures::basic();
    project.write_lock().unwrap();

    allow_scripts()
        .current_dir(project.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "==========> postinstall node_modules/@example/with-postinstall-script...",
        ));

    assert_eq!(project.output(), fixtures::basic_full());
}

#[test]
fn test_misconfiguration_exits_with_error() {
    let project = fixtures::with_allow_scripts(Some(json!({ WITH_POSTINSTALL: true })));

    allow_scripts()
        .current_dir(project.path())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "Mis-configured allowedScripts: @example/with-install-script (no entry)",
        ));

    assert!(project.output().is_empty());
}

#[test]
fn test_forbidden_package_is_reported_on_stderr() {
    let project = fixtures::with_allow_scripts(Some(json!({
        WITH_INSTALL: false,
        WITH_POSTINSTALL: true
    })));

    allow_scripts()
        .current_dir(project.path())
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "==========> skip node_modules/@example/with-install-script (because it is not allowed)",
        ))
        .stdout(predicate::str::contains("with-install-script").not());

    assert_eq!(project.output(), vec!["postinstall from with-postinstall-script"]);
}

#[test]
fn test_quiet_hides_skip_notices() {
    let project = fixtures::with_allow_scripts(Some(json!({
        WITH_INSTALL: false,
        WITH_POSTINSTALL: true
    })));

    allow_scripts()
        .arg("--quiet")
        .current_dir(project.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("skip").not());

    assert_eq!(project.output(), vec!["postinstall from with-postinstall-script"]);
}

#[test]
fn test_missing_manifest() {
    let temp = TempDir::new().unwrap();

    allow_scripts()
        .current_dir(temp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No package.json found"));
}

#[test]
fn test_run_subcommand_with_project_dir() {
    let project = fixtures::deep();

    allow_scripts()
        .args(["run", "--project-dir"])
        .arg(project.path())
        .assert()
        .success();

    assert_eq!(
        project.output(),
        vec![
            "preinstall from with-preinstall-script",
            "install from with-install-script",
            "postinstall from with-postinstall-script",
            "postinstall from basic",
        ]
    );
}

#[test]
fn test_verbose_conflicts_with_quiet() {
    allow_scripts()
        .args(["--verbose", "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
