//! Fixture projects shared by the integration tests.
//!
//! Every package script appends `<stage> from <name>` to `res.txt` in the
//! project root, so a test can read back exactly which scripts ran and in
//! which order.

use allow_scripts::test_utils::{PackageFixture, ProjectFixture};
use serde_json::{Value, json};

pub const WITH_PREINSTALL: &str = "@example/with-preinstall-script";
pub const WITH_INSTALL: &str = "@example/with-install-script";
pub const WITH_POSTINSTALL: &str = "@example/with-postinstall-script";
pub const WITHOUT_SCRIPTS: &str = "@example/without-scripts";
pub const WITHOUT_INSTALL_SCRIPTS: &str = "@example/without-install-scripts";

pub fn with_preinstall() -> PackageFixture {
    PackageFixture::new(WITH_PREINSTALL, "0.0.0").recording("preinstall")
}

pub fn with_install() -> PackageFixture {
    PackageFixture::new(WITH_INSTALL, "0.0.0").recording("install")
}

pub fn with_postinstall() -> PackageFixture {
    PackageFixture::new(WITH_POSTINSTALL, "0.0.0").recording("postinstall")
}

pub fn without_scripts() -> PackageFixture {
    PackageFixture::new(WITHOUT_SCRIPTS, "0.0.0")
}

pub fn without_install_scripts() -> PackageFixture {
    PackageFixture::new(WITHOUT_INSTALL_SCRIPTS, "0.0.0")
        .recording("test")
        .recording("prepublish")
}

fn dependencies(names: &[&str]) -> Value {
    names.iter().map(|name| ((*name).to_string(), json!("*"))).collect::<serde_json::Map<_, _>>().into()
}

fn root_scripts(short_name: &str) -> Value {
    ["preinstall", "install", "postinstall", "prepublish", "prepare", "test"]
        .iter()
        .map(|stage| {
            ((*stage).to_string(), json!(format!("echo '{stage} from {short_name}' >> res.txt")))
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

/// Root `@example/basic` depending on the five leaf packages, all three
/// scripted ones allowed.
pub fn basic() -> ProjectFixture {
    let mut project = ProjectFixture::new().unwrap();
    project
        .write_root(&json!({
            "name": "@example/basic",
            "version": "0.0.0",
            "scripts": root_scripts("basic"),
            "dependencies": dependencies(&[
                WITH_PREINSTALL,
                WITH_INSTALL,
                WITH_POSTINSTALL,
                WITHOUT_SCRIPTS,
                WITHOUT_INSTALL_SCRIPTS,
            ]),
            "allowScripts": {
                WITH_PREINSTALL: "*",
                WITH_INSTALL: true,
                WITH_POSTINSTALL: "0.x"
            }
        }))
        .unwrap();

    for package in [
        with_preinstall(),
        with_install(),
        with_postinstall(),
        without_scripts(),
        without_install_scripts(),
    ] {
        project.install(package).unwrap();
    }
    project
}

/// Lines written by a full run of [`basic`].
pub fn basic_full() -> Vec<String> {
    [
        "preinstall from basic",
        "preinstall from with-preinstall-script",
        "install from with-install-script",
        "postinstall from with-postinstall-script",
        "install from basic",
        "postinstall from basic",
        "prepublish from basic",
        "prepare from basic",
    ]
    .iter()
    .map(|line| (*line).to_string())
    .collect()
}

/// Announcements of a dry run of [`basic`].
pub fn basic_dry_run() -> Vec<String> {
    vec![
        "DRY RUN ==> preinstall @example/basic".to_string(),
        format!("DRY RUN ==> preinstall node_modules/{WITH_PREINSTALL}"),
        format!("DRY RUN ==> install node_modules/{WITH_INSTALL}"),
        format!("DRY RUN ==> postinstall node_modules/{WITH_POSTINSTALL}"),
        "DRY RUN ==> install @example/basic".to_string(),
        "DRY RUN ==> postinstall @example/basic".to_string(),
        "DRY RUN ==> prepublish @example/basic".to_string(),
        "DRY RUN ==> prepare @example/basic".to_string(),
    ]
}

/// Root without scripts depending on `@example/basic`, which depends on the
/// leaf packages and has a `postinstall` of its own.
pub fn deep() -> ProjectFixture {
    let mut project = ProjectFixture::new().unwrap();
    project
        .write_root(&json!({
            "name": "@example/deep",
            "version": "0.0.0",
            "dependencies": dependencies(&["@example/basic"]),
            "allowScripts": {
                "@example/basic": true,
                WITH_PREINSTALL: true,
                WITH_INSTALL: true,
                WITH_POSTINSTALL: true
            }
        }))
        .unwrap();

    project
        .install(
            PackageFixture::new("@example/basic", "0.0.0")
                .recording("postinstall")
                .depends_on(WITH_PREINSTALL)
                .depends_on(WITH_INSTALL)
                .depends_on(WITH_POSTINSTALL)
                .depends_on(WITHOUT_SCRIPTS)
                .depends_on(WITHOUT_INSTALL_SCRIPTS),
        )
        .unwrap();
    for package in [
        with_preinstall(),
        with_install(),
        with_postinstall(),
        without_scripts(),
        without_install_scripts(),
    ] {
        project.install(package).unwrap();
    }
    project.write_lock().unwrap();
    project
}

/// Two packages depending on each other next to an allowed leaf package.
pub fn with_cycles() -> ProjectFixture {
    let mut project = ProjectFixture::new().unwrap();
    project
        .write_root(&json!({
            "name": "@example/with-cycles",
            "version": "0.0.0",
            "dependencies": dependencies(&["@example/cycle-a", "@example/cycle-b", WITH_INSTALL]),
            "allowScripts": {
                "@example/cycle-a": true,
                "@example/cycle-b": true,
                WITH_INSTALL: true
            }
        }))
        .unwrap();

    project
        .install(
            PackageFixture::new("@example/cycle-a", "0.0.0")
                .recording("install")
                .depends_on("@example/cycle-b"),
        )
        .unwrap();
    project
        .install(
            PackageFixture::new("@example/cycle-b", "0.0.0")
                .recording("install")
                .depends_on("@example/cycle-a")
                .depends_on(WITH_INSTALL),
        )
        .unwrap();
    project.install(with_install()).unwrap();
    project.write_lock().unwrap();
    project
}

/// Root with `with-install-script`, `with-postinstall-script` and
/// `without-scripts`, using the given `allowScripts` section (or none).
pub fn with_allow_scripts(allow_scripts: Option<Value>) -> ProjectFixture {
    let mut project = ProjectFixture::new().unwrap();
    let mut root = json!({
        "name": "@example/allow-test",
        "version": "0.0.0",
        "dependencies": dependencies(&[WITH_INSTALL, WITH_POSTINSTALL, WITHOUT_SCRIPTS]),
    });
    if let Some(allow_scripts) = allow_scripts {
        root["allowScripts"] = allow_scripts;
    }
    project.write_root(&root).unwrap();

    for package in [with_install(), with_postinstall(), without_scripts()] {
        project.install(package).unwrap();
    }
    project.write_lock().unwrap();
    project
}
