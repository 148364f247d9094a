//! End-to-end runs of the library against fixture projects, with real shell
//! scripts.

use allow_scripts::core::AllowScriptsError;
use allow_scripts::installer::{RunOptions, ShellScriptRunner, run};
use allow_scripts::test_utils::{PackageFixture, ProjectFixture, RecordingSink};
use serde_json::json;

use crate::fixtures::{self, WITH_INSTALL, WITH_POSTINSTALL};

fn options(project: &ProjectFixture, dry_run: bool) -> RunOptions {
    RunOptions {
        project_dir: project.path().to_path_buf(),
        dry_run,
    }
}

async fn run_project(project: &ProjectFixture, dry_run: bool) -> (anyhow::Result<()>, RecordingSink) {
    let sink = RecordingSink::new();
    let result = run(&options(project, dry_run), &ShellScriptRunner::new(), &sink).await.map(|_| ());
    (result, sink)
}

fn misconfigured_entries(err: &anyhow::Error) -> Vec<String> {
    match err.downcast_ref::<AllowScriptsError>() {
        Some(AllowScriptsError::MisconfiguredAllowScripts {
            entries,
        }) => entries.clone(),
        other => panic!("Expected MisconfiguredAllowScripts, got {other:?}"),
    }
}

#[tokio::test]
async fn test_executes_allowed_scripts() {
    let project = fixtures::basic();
    project.write_lock().unwrap();

    let (result, sink) = run_project(&project, false).await;
    result.unwrap();

    assert_eq!(project.output(), fixtures::basic_full());
    let log = sink.lines().join("\n");
    assert!(!log.contains("without-scripts"));
    assert!(!log.contains("without-install-scripts"));
    assert!(!project.path().join("npm-shrinkwrap.json").exists());
}

#[tokio::test]
async fn test_dry_run_reports_allowed_scripts() {
    let project = fixtures::basic();
    project.write_lock().unwrap();

    let (result, sink) = run_project(&project, true).await;
    result.unwrap();

    assert!(project.output().is_empty());
    assert_eq!(sink.lines(), fixtures::basic_dry_run());
}

#[tokio::test]
async fn test_executes_allowed_scripts_of_subdependencies_first() {
    let project = fixtures::deep();

    let (result, sink) = run_project(&project, false).await;
    result.unwrap();

    assert_eq!(
        project.output(),
        vec![
            "preinstall from with-preinstall-script",
            "install from with-install-script",
            "postinstall from with-postinstall-script",
            "postinstall from basic",
        ]
    );
    let log = sink.lines().join("\n");
    assert!(!log.contains("without-scripts"));
    assert!(!log.contains("install @example/deep"));
}

#[tokio::test]
async fn test_skips_cycles() {
    let project = fixtures::with_cycles();

    let (result, sink) = run_project(&project, false).await;
    result.unwrap();

    assert_eq!(project.output(), vec!["install from with-install-script"]);
    assert_eq!(
        sink.skips(),
        vec![
            "==========> skip node_modules/@example/cycle-a (because it has a cycle in dependencies)",
            "==========> skip node_modules/@example/cycle-b (because it has a cycle in dependencies)",
        ]
    );
}

#[tokio::test]
async fn test_uses_existing_shrinkwrap() {
    let project = fixtures::basic();
    project.write_lock_file("npm-shrinkwrap.json").unwrap();

    let (result, _) = run_project(&project, false).await;
    result.unwrap();

    assert_eq!(project.output(), fixtures::basic_full());
    assert!(project.path().join("npm-shrinkwrap.json").exists());
    assert!(!project.path().join("package-lock.json").exists());
}

#[tokio::test]
async fn test_uses_existing_package_lock() {
    let project = fixtures::basic();
    project.write_lock().unwrap();

    let (result, _) = run_project(&project, false).await;
    result.unwrap();

    assert_eq!(project.output(), fixtures::basic_full());
    assert!(project.path().join("package-lock.json").exists());
    assert!(!project.path().join("npm-shrinkwrap.json").exists());
}

#[tokio::test]
async fn test_crashes_on_script_not_in_allow_list() {
    let project = fixtures::with_allow_scripts(Some(json!({ WITH_POSTINSTALL: true })));

    let (result, sink) = run_project(&project, false).await;
    let err = result.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Mis-configured allowedScripts: @example/with-install-script (no entry)"
    );
    assert!(project.output().is_empty());
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_skips_forbidden_scripts() {
    let project = fixtures::with_allow_scripts(Some(json!({
        WITH_INSTALL: false,
        WITH_POSTINSTALL: true
    })));

    let (result, sink) = run_project(&project, false).await;
    result.unwrap();

    assert_eq!(project.output(), vec!["postinstall from with-postinstall-script"]);
    assert!(sink.skips().contains(
        &"==========> skip node_modules/@example/with-install-script (because it is not allowed)"
            .to_string()
    ));
}

#[tokio::test]
async fn test_skips_scripts_outside_allowed_range() {
    let project = fixtures::with_allow_scripts(Some(json!({
        WITH_INSTALL: "1.x.x",
        WITH_POSTINSTALL: true
    })));

    let (result, sink) = run_project(&project, false).await;
    result.unwrap();

    assert_eq!(project.output(), vec!["postinstall from with-postinstall-script"]);
    assert!(sink.skips().contains(
        &"==========> skip node_modules/@example/with-install-script (because 0.0.0 is outside of allowed range: 1.x.x)"
            .to_string()
    ));
}

#[tokio::test]
async fn test_crashes_on_invalid_semver_range() {
    let project = fixtures::with_allow_scripts(Some(json!({
        WITH_INSTALL: "not-a-semver-range",
        WITH_POSTINSTALL: true
    })));

    let (result, sink) = run_project(&project, false).await;
    let err = result.unwrap_err();

    assert_eq!(
        misconfigured_entries(&err),
        vec!["@example/with-install-script (invalid semver range: not-a-semver-range)"]
    );
    assert!(project.output().is_empty());
    assert!(sink.lines().is_empty());
}

#[tokio::test]
async fn test_crashes_on_missing_allow_scripts_section() {
    let project = fixtures::with_allow_scripts(None);

    let (result, _) = run_project(&project, false).await;
    let err = result.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Mis-configured allowedScripts: @example/with-install-script (no entry), @example/with-postinstall-script (no entry)"
    );
    assert!(project.output().is_empty());
}

#[tokio::test]
async fn test_dry_run_decides_like_a_real_run() {
    let allow_scripts = json!({ WITH_INSTALL: false, WITH_POSTINSTALL: "0.0.x" });

    let dry = fixtures::with_allow_scripts(Some(allow_scripts.clone()));
    let (result, dry_sink) = run_project(&dry, true).await;
    result.unwrap();

    let real = fixtures::with_allow_scripts(Some(allow_scripts));
    let (result, real_sink) = run_project(&real, false).await;
    result.unwrap();

    assert_eq!(dry_sink.skips(), real_sink.skips());
    let dry_announcements: Vec<String> = dry_sink
        .announcements()
        .iter()
        .map(|line| line.replacen("DRY RUN ==> ", "==========> ", 1) + "...")
        .collect();
    assert_eq!(dry_announcements, real_sink.announcements());
    assert!(dry.output().is_empty());
    assert_eq!(real.output(), vec!["postinstall from with-postinstall-script"]);
}

#[tokio::test]
async fn test_failing_script_stops_the_run() {
    let mut project = ProjectFixture::new().unwrap();
    project
        .write_root(&json!({
            "name": "@example/failing",
            "version": "0.0.0",
            "scripts": { "postinstall": "echo 'postinstall from failing' >> res.txt" },
            "dependencies": { "@example/broken": "*", WITH_POSTINSTALL: "*" },
            "allowScripts": { "@example/broken": true, WITH_POSTINSTALL: true }
        }))
        .unwrap();
    project
        .install(PackageFixture::new("@example/broken", "1.0.0").script("install", "exit 7"))
        .unwrap();
    project.install(fixtures::with_postinstall()).unwrap();
    project.write_lock().unwrap();

    let (result, _) = run_project(&project, false).await;
    let err = result.unwrap_err();

    assert_eq!(
        err.to_string(),
        "install script of node_modules/@example/broken failed: exit code 7"
    );
    assert!(project.output().is_empty());
}

#[tokio::test]
async fn test_unreadable_tree_is_fatal() {
    let mut project = ProjectFixture::new().unwrap();
    project
        .write_root(&json!({
            "name": "@example/broken-tree",
            "dependencies": { WITH_INSTALL: "*" },
            "allowScripts": { WITH_INSTALL: true }
        }))
        .unwrap();
    project.install(fixtures::with_install()).unwrap();
    project.write_lock().unwrap();
    std::fs::remove_dir_all(project.path().join("node_modules")).unwrap();

    let (result, _) = run_project(&project, false).await;
    let err = result.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AllowScriptsError>(),
        Some(AllowScriptsError::TreeUnreadable { .. })
    ));
    assert!(err.to_string().starts_with("Failed to read the installed tree"));
}

#[tokio::test]
async fn test_missing_manifest_is_fatal() {
    let project = ProjectFixture::new().unwrap();

    let (result, _) = run_project(&project, false).await;
    assert!(matches!(
        result.unwrap_err().downcast_ref::<AllowScriptsError>(),
        Some(AllowScriptsError::ManifestNotFound { .. })
    ));
}

#[tokio::test]
async fn test_judges_each_install_location_separately() {
    let mut project = ProjectFixture::new().unwrap();
    project
        .write_root(&json!({
            "name": "@example/nested",
            "version": "0.0.0",
            "dependencies": { WITH_INSTALL: "*", "@example/wrapper": "*" },
            "allowScripts": { WITH_INSTALL: "1.x" }
        }))
        .unwrap();
    project.install(fixtures::with_install()).unwrap();
    project
        .install(PackageFixture::new("@example/wrapper", "0.0.0").depends_on(WITH_INSTALL))
        .unwrap();
    project
        .install_at(
            &format!("node_modules/@example/wrapper/node_modules/{WITH_INSTALL}"),
            PackageFixture::new(WITH_INSTALL, "1.0.0")
                .script("install", "echo 'install from nested copy' >> \"$INIT_CWD/res.txt\""),
        )
        .unwrap();
    project.write_lock().unwrap();

    let (result, sink) = run_project(&project, false).await;
    result.unwrap();

    assert_eq!(project.output(), vec!["install from nested copy"]);
    assert_eq!(
        sink.skips(),
        vec![
            "==========> skip node_modules/@example/with-install-script (because 0.0.0 is outside of allowed range: 1.x)"
        ]
    );
    assert_eq!(
        sink.announcements(),
        vec![
            "==========> install node_modules/@example/wrapper/node_modules/@example/with-install-script..."
        ]
    );
}
