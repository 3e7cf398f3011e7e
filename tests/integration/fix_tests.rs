//! Fix applier tests on real files: only the targeted statements change.

use moduleaudit::analysis::{Finding, FindingName, FixAction};
use moduleaudit::error::Error;
use moduleaudit::graph::{ConfiguredDependency, DependencyTarget, PlatformKind, Project};
use moduleaudit::refactor::{FixOptions, FixPass};
use std::path::PathBuf;
use tempfile::TempDir;

const APP_BUILD_FILE: &str = r#"// Application module
plugins {
  id("com.android.application")
  kotlin("android")
}

android {
  namespace = "com.example.app"
  defaultConfig {
    minSdk = 24
  }
}

dependencies {
  // networking
  implementation(project(":lib1")) // used by the api client
  implementation(project(":lib2"))

  testImplementation("junit:junit:4.13.2")
}
"#;

fn project() -> Project {
    Project::new(":app", PlatformKind::AndroidApplication, "app/build.gradle.kts")
}

fn dep(configuration: &str, target: &str) -> ConfiguredDependency {
    ConfiguredDependency::new(configuration, DependencyTarget::project(target))
}

fn finding(name: FindingName, action: FixAction) -> Finding {
    Finding::new(name, &project()).with_fix(action)
}

fn write_build_file(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("build.gradle.kts");
    std::fs::write(&path, text).unwrap();
    path
}

fn apply(text: &str, findings: &[Finding], options: &FixOptions) -> Result<String, Error> {
    FixPass::from_text("app/build.gradle.kts", text)
        .plan(findings, options)
        .apply()
        .map(|pass| pass.text().to_string())
}

#[test]
fn test_unrelated_text_is_preserved() {
    let findings = [
        finding(
            FindingName::UnusedDependency,
            FixAction::Remove {
                dependency: dep("implementation", ":lib2"),
            },
        ),
        finding(
            FindingName::MustBeApi,
            FixAction::Retarget {
                dependency: dep("implementation", ":lib1"),
                configuration: "api".into(),
            },
        ),
    ];
    let out = apply(APP_BUILD_FILE, &findings, &FixOptions::default()).unwrap();

    assert!(out.starts_with("// Application module\nplugins {\n  id(\"com.android.application\")\n  kotlin(\"android\")\n}\n"));
    assert!(out.contains("android {\n  namespace = \"com.example.app\"\n  defaultConfig {\n    minSdk = 24\n  }\n}\n"));
    assert!(out.contains("  // networking\n  api(project(\":lib1\")) // used by the api client\n"));
    assert!(out.contains("  // implementation(project(\":lib2\"))  // ModuleAudit finding [unused-dependency]\n"));
    assert!(out.contains("\n\n  testImplementation(\"junit:junit:4.13.2\")\n}\n"));
    assert_eq!(out.lines().count(), APP_BUILD_FILE.lines().count());
}

#[test]
fn test_write_only_touches_changed_files() {
    let dir = TempDir::new().unwrap();
    let path = write_build_file(&dir, APP_BUILD_FILE);

    let unchanged = FixPass::load(&path)
        .unwrap()
        .plan(&[], &FixOptions::default())
        .apply()
        .unwrap()
        .write()
        .unwrap();
    assert!(!unchanged.changed());
    assert_eq!(unchanged.edit_count(), 0);

    let findings = [finding(
        FindingName::UnusedDependency,
        FixAction::Remove {
            dependency: dep("implementation", ":lib2"),
        },
    )];
    let options = FixOptions {
        delete_unused: true,
        ..FixOptions::default()
    };
    let written = FixPass::load(&path)
        .unwrap()
        .plan(&findings, &options)
        .apply()
        .unwrap()
        .write()
        .unwrap();
    assert!(written.changed());

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains(":lib2"));
    assert!(text.contains("implementation(project(\":lib1\")) // used by the api client"));
}

#[test]
fn test_unlocatable_fix_fails_the_whole_file() {
    let dir = TempDir::new().unwrap();
    let path = write_build_file(&dir, APP_BUILD_FILE);

    let findings = [
        finding(
            FindingName::UnusedDependency,
            FixAction::Remove {
                dependency: dep("implementation", ":lib2"),
            },
        ),
        finding(
            FindingName::UnusedDependency,
            FixAction::Remove {
                dependency: dep("implementation", ":gone"),
            },
        ),
    ];
    let result = FixPass::load(&path)
        .unwrap()
        .plan(&findings, &FixOptions::default())
        .apply();

    assert!(matches!(result, Err(Error::FixSpanMismatch { .. })));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), APP_BUILD_FILE);
}

#[test]
fn test_planned_fixes_are_ordered_and_deduplicated() {
    let remove = FixAction::Remove {
        dependency: dep("implementation", ":lib2"),
    };
    let findings = [
        finding(FindingName::UnusedDependency, remove.clone()),
        finding(
            FindingName::MustBeApi,
            FixAction::Retarget {
                dependency: dep("implementation", ":lib1"),
                configuration: "api".into(),
            },
        ),
        finding(FindingName::UnusedDependency, remove),
        finding(
            FindingName::InheritedDependency,
            FixAction::Add {
                dependency: dep("implementation", ":lib3"),
                anchor: None,
            },
        ),
    ];
    let pass = FixPass::from_text("app/build.gradle.kts", APP_BUILD_FILE).plan(&findings, &FixOptions::default());
    let names: Vec<FindingName> = pass.fixes().iter().map(|f| f.name).collect();
    assert_eq!(
        names,
        vec![
            FindingName::InheritedDependency,
            FindingName::MustBeApi,
            FindingName::UnusedDependency
        ]
    );
}

#[test]
fn test_sort_dependencies_fix() {
    let text = r#"dependencies {
  testImplementation(project(":z"))
  implementation(project(":b"))
  // the a library
  implementation(project(":a")) // inline
  api("com.squareup:okio:3.0.0")
  implementation("com.example:ext:1.0")
}
"#;
    let expected = r#"dependencies {
  api("com.squareup:okio:3.0.0")

  implementation("com.example:ext:1.0")
  // the a library
  implementation(project(":a")) // inline
  implementation(project(":b"))

  testImplementation(project(":z"))
}
"#;
    let out = apply(
        text,
        &[finding(FindingName::SortDependencies, FixAction::SortDependencies)],
        &FixOptions::default(),
    )
    .unwrap();
    assert_eq!(out, expected);
}

#[test]
fn test_sort_plugins_fix() {
    let text = "plugins {\n  id(\"io.gitlab.arturbosch.detekt\")\n  kotlin(\"jvm\")\n\n  id(\"com.android.library\")\n}\n";
    let out = apply(
        text,
        &[finding(FindingName::SortPlugins, FixAction::SortPlugins)],
        &FixOptions::default(),
    )
    .unwrap();
    assert_eq!(
        out,
        "plugins {\n  id(\"com.android.library\")\n  kotlin(\"jvm\")\n  id(\"io.gitlab.arturbosch.detekt\")\n}\n"
    );
}

#[test]
fn test_groovy_retarget() {
    let text = "dependencies {\n    implementation project(':core')\n}\n";
    let out = FixPass::from_text("app/build.gradle", text)
        .plan(
            &[finding(
                FindingName::MustBeApi,
                FixAction::Retarget {
                    dependency: dep("implementation", ":core"),
                    configuration: "api".into(),
                },
            )],
            &FixOptions::default(),
        )
        .apply()
        .unwrap();
    assert_eq!(out.text(), "dependencies {\n    api project(':core')\n}\n");
}
