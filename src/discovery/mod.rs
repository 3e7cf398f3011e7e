//! Workspace snapshot loading.
//!
//! Source scanning is a collaborator's job. It hands us a JSON or YAML
//! snapshot describing every project, and this module turns it into the
//! [`ModuleGraph`] plus a [`SnapshotOracle`] answering reference queries.
//!
//! ```yaml
//! root: .
//! projects:
//!   - path: ":lib1"
//!     build_file: lib1/build.gradle.kts
//!     exports:
//!       main: [com.example.lib1.Lib1Class]
//!   - path: ":app"
//!     platform: android-application
//!     build_file: app/build.gradle.kts
//!     source_sets:
//!       - name: main
//!         source_dirs: [app/src/main/kotlin]
//!     references:
//!       main:
//!         - com.example.lib1.Lib1Class
//!         - { symbol: com.example.lib2.Lib2Class, visibility: public }
//!     unavailable: [androidTest]
//! external_exports:
//!   "com.squareup.okio:okio": [okio.Buffer]
//! ```
//!
//! Projects without a `dependencies` list have their declarations read from
//! the build file. Source sets without an explicit file count are counted
//! on disk, either from `source_dirs` or from `src/<name>` next to the
//! build file.

use crate::error::{Error, Result};
use crate::graph::{
    ConfiguredDependency, DependencyTarget, MavenCoordinates, ModuleGraph, PlatformKind, Project, ProjectPath, SourceSet,
    SourceSetName,
};
use crate::oracle::{SnapshotOracle, SymbolUsage, Visibility};
use crate::parser::BuildFile;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const SOURCE_EXTENSIONS: [&str; 2] = ["kt", "java"];

/// A loaded workspace: the graph to analyze and the oracle to analyze it with.
#[derive(Debug)]
pub struct Workspace {
    pub root: PathBuf,
    pub graph: ModuleGraph,
    pub oracle: SnapshotOracle,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Snapshot {
    #[serde(default)]
    root: Option<PathBuf>,
    projects: Vec<ProjectEntry>,
    #[serde(default)]
    external_exports: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectEntry {
    path: String,
    #[serde(default)]
    platform: PlatformKind,
    build_file: PathBuf,
    #[serde(default)]
    source_sets: Vec<SourceSetEntry>,
    #[serde(default)]
    dependencies: Option<Vec<DependencyEntry>>,
    #[serde(default)]
    references: BTreeMap<String, Vec<ReferenceEntry>>,
    #[serde(default)]
    exports: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    unavailable: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceSetEntry {
    name: String,
    #[serde(default)]
    extends: Option<Vec<String>>,
    #[serde(default)]
    source_files: Option<usize>,
    #[serde(default)]
    source_dirs: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DependencyEntry {
    configuration: String,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    coordinates: Option<String>,
    #[serde(default)]
    test_fixtures: bool,
}

/// A bare symbol is a private reference.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReferenceEntry {
    Symbol(String),
    Usage(SymbolUsage),
}

impl ReferenceEntry {
    fn into_usage(self) -> SymbolUsage {
        match self {
            ReferenceEntry::Symbol(symbol) => SymbolUsage::new(symbol, Visibility::Private),
            ReferenceEntry::Usage(usage) => usage,
        }
    }
}

impl Workspace {
    /// Load a snapshot file. `.yml`/`.yaml` are YAML, everything else JSON.
    /// A relative `root` is resolved against the snapshot's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let snapshot: Snapshot = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content).map_err(|e| snapshot_error(path, e))?,
            _ => serde_json::from_str(&content).map_err(|e| snapshot_error(path, e))?,
        };
        let base = path.parent().unwrap_or(Path::new("."));
        let root = match &snapshot.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => base.join(root),
            None => base.to_path_buf(),
        };
        Self::build(path, root, snapshot)
    }

    fn build(snapshot_path: &Path, root: PathBuf, snapshot: Snapshot) -> Result<Self> {
        info!("Loading {} projects from {}", snapshot.projects.len(), snapshot_path.display());

        let accessors: HashMap<String, ProjectPath> = snapshot
            .projects
            .iter()
            .map(|entry| {
                let path = ProjectPath::new(entry.path.as_str());
                (path.typesafe_accessor(), path)
            })
            .collect();

        let mut graph = ModuleGraph::new();
        let mut oracle = SnapshotOracle::new();

        for entry in snapshot.projects {
            let path = ProjectPath::new(entry.path.as_str());
            let build_file = root.join(&entry.build_file);
            let project_dir = build_file.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone());

            let mut project = Project::new(path.as_str(), entry.platform, build_file.clone());
            for source_set in &entry.source_sets {
                project = project.with_source_set(source_set_from(source_set, &root, &project_dir));
            }
            count_conventional_sources(&mut project, &entry.source_sets, &project_dir);

            let dependencies = match entry.dependencies {
                Some(declared) => declared
                    .into_iter()
                    .map(|dependency| dependency_from(snapshot_path, &path, dependency))
                    .collect::<Result<Vec<_>>>()?,
                None => {
                    let parsed = BuildFile::read(&build_file)?;
                    parsed.dependencies(|accessor| accessors.get(accessor).cloned())
                }
            };
            for dependency in dependencies {
                project.add_dependency(dependency);
            }
            debug!(
                "{}: {} source sets, {} declarations",
                path,
                project.source_sets.len(),
                project.dependencies.len()
            );

            for (source_set, references) in entry.references {
                oracle.record_usages(
                    path.clone(),
                    SourceSetName::new(source_set),
                    references.into_iter().map(ReferenceEntry::into_usage),
                );
            }
            for (source_set, symbols) in entry.exports {
                oracle.record_exports(path.clone(), SourceSetName::new(source_set), symbols);
            }
            for source_set in entry.unavailable {
                oracle.record_unavailable(path.clone(), SourceSetName::new(source_set));
            }

            graph.insert(project)?;
        }

        for (coordinates, symbols) in snapshot.external_exports {
            oracle.record_external(MavenCoordinates::parse(&coordinates).identifier(), symbols);
        }

        Ok(Self { root, graph, oracle })
    }
}

fn source_set_from(entry: &SourceSetEntry, root: &Path, project_dir: &Path) -> SourceSet {
    let name = SourceSetName::new(entry.name.as_str());
    let upstream: Vec<SourceSetName> = match &entry.extends {
        Some(extends) => extends.iter().map(|s| SourceSetName::new(s.as_str())).collect(),
        None if name.is_main() => Vec::new(),
        None => vec![SourceSetName::main()],
    };
    let count = match entry.source_files {
        Some(count) => count,
        None if entry.source_dirs.is_empty() => count_source_files(&[project_dir.join("src").join(&entry.name)]),
        None => {
            let dirs: Vec<PathBuf> = entry.source_dirs.iter().map(|dir| root.join(dir)).collect();
            count_source_files(&dirs)
        }
    };
    SourceSet::new(name).extending(upstream).with_source_files(count)
}

/// Default source sets the snapshot didn't describe are counted from
/// `src/<name>`.
fn count_conventional_sources(project: &mut Project, described: &[SourceSetEntry], project_dir: &Path) {
    for source_set in project.source_sets.values_mut() {
        if described.iter().any(|entry| entry.name == source_set.name.as_str()) {
            continue;
        }
        source_set.source_file_count = count_source_files(&[project_dir.join("src").join(source_set.name.as_str())]);
    }
}

fn count_source_files(dirs: &[PathBuf]) -> usize {
    dirs.iter()
        .filter(|dir| dir.is_dir())
        .map(|dir| {
            WalkDir::new(dir)
                .follow_links(false)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file() && is_source_file(entry.path()))
                .count()
        })
        .sum()
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e))
}

fn dependency_from(snapshot: &Path, project: &ProjectPath, entry: DependencyEntry) -> Result<ConfiguredDependency> {
    let target = match (entry.project, entry.coordinates) {
        (Some(path), None) => DependencyTarget::project(path),
        (None, Some(coordinates)) => DependencyTarget::external(&coordinates),
        _ => {
            return Err(Error::Snapshot {
                path: snapshot.to_path_buf(),
                message: format!(
                    "{project}: `{}` needs exactly one of `project` or `coordinates`",
                    entry.configuration
                ),
            })
        }
    };
    Ok(ConfiguredDependency::new(entry.configuration.as_str(), target).with_test_fixtures(entry.test_fixtures))
}

fn snapshot_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Snapshot {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ReferenceOracle;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_yaml_with_explicit_dependencies() {
        let dir = TempDir::new().unwrap();
        let snapshot = write(
            &dir,
            "snapshot.yaml",
            r#"
projects:
  - path: ":lib1"
    build_file: lib1/build.gradle.kts
    exports:
      main: [com.example.Lib1Class]
  - path: ":app"
    build_file: app/build.gradle.kts
    dependencies:
      - { configuration: implementation, project: ":lib1" }
      - { configuration: testImplementation, coordinates: "junit:junit:4.13" }
    references:
      main:
        - com.example.Lib1Class
        - { symbol: com.example.Other, visibility: public }
"#,
        );

        let workspace = Workspace::load(&snapshot).unwrap();
        assert_eq!(workspace.graph.len(), 2);

        let app = workspace.graph.project(&ProjectPath::new(":app")).unwrap();
        assert_eq!(app.dependencies.len(), 2);
        assert_eq!(app.build_file, dir.path().join("app/build.gradle.kts"));

        let usages = workspace
            .oracle
            .usages(&ProjectPath::new(":app"), &SourceSetName::main())
            .unwrap();
        assert_eq!(usages.len(), 2);
        assert_eq!(usages[1].visibility, Visibility::Public);
    }

    #[test]
    fn test_dependencies_read_from_build_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lib-core/build.gradle.kts", "plugins {\n  kotlin(\"jvm\")\n}\n");
        write(
            &dir,
            "app/build.gradle.kts",
            "dependencies {\n  api(projects.libCore)\n  implementation(project(\":other\"))\n}\n",
        );
        let snapshot = write(
            &dir,
            "snapshot.json",
            r#"{"projects": [
                {"path": ":lib-core", "build_file": "lib-core/build.gradle.kts"},
                {"path": ":app", "build_file": "app/build.gradle.kts"}
            ]}"#,
        );

        let workspace = Workspace::load(&snapshot).unwrap();
        let app = workspace.graph.project(&ProjectPath::new(":app")).unwrap();
        let targets: Vec<String> = app.dependencies.iter().map(|d| d.target.identifier()).collect();
        assert_eq!(targets, vec![":lib-core", ":other"]);
        assert!(app.dependencies[0].configuration.is_api());
    }

    #[test]
    fn test_source_files_are_counted() {
        let dir = TempDir::new().unwrap();
        write(&dir, "lib/build.gradle.kts", "");
        write(&dir, "lib/src/main/kotlin/A.kt", "class A");
        write(&dir, "lib/src/main/java/B.java", "class B {}");
        write(&dir, "lib/src/main/resources/c.txt", "");
        write(&dir, "lib/src/integration/D.kt", "class D");
        let snapshot = write(
            &dir,
            "snapshot.json",
            r#"{"projects": [{
                "path": ":lib",
                "build_file": "lib/build.gradle.kts",
                "dependencies": [],
                "source_sets": [{"name": "integration", "source_dirs": ["lib/src/integration"]}]
            }]}"#,
        );

        let workspace = Workspace::load(&snapshot).unwrap();
        let lib = workspace.graph.project(&ProjectPath::new(":lib")).unwrap();
        assert_eq!(lib.source_set(&SourceSetName::main()).unwrap().source_file_count, 2);
        assert!(!lib.source_set(&SourceSetName::test()).unwrap().has_sources());

        let integration = lib.source_set(&SourceSetName::new("integration")).unwrap();
        assert_eq!(integration.source_file_count, 1);
        assert_eq!(integration.upstream, vec![SourceSetName::main()]);
    }

    #[test]
    fn test_unavailable_and_external_exports() {
        let dir = TempDir::new().unwrap();
        let snapshot = write(
            &dir,
            "snapshot.json",
            r#"{
                "projects": [{"path": ":app", "build_file": "app/build.gradle.kts", "dependencies": [], "unavailable": ["test"]}],
                "external_exports": {"com.squareup.okio:okio": ["okio.Buffer"]}
            }"#,
        );

        let workspace = Workspace::load(&snapshot).unwrap();
        assert!(workspace
            .oracle
            .usages(&ProjectPath::new(":app"), &SourceSetName::test())
            .is_err());
        let exports = workspace
            .oracle
            .external_exports(&MavenCoordinates::parse("com.squareup.okio:okio:3.0"))
            .unwrap()
            .unwrap();
        assert!(exports.contains("okio.Buffer"));
    }

    #[test]
    fn test_ambiguous_dependency_is_rejected() {
        let dir = TempDir::new().unwrap();
        let snapshot = write(
            &dir,
            "snapshot.json",
            r#"{"projects": [{
                "path": ":app",
                "build_file": "app/build.gradle.kts",
                "dependencies": [{"configuration": "api", "project": ":a", "coordinates": "g:a:1"}]
            }]}"#,
        );
        let err = Workspace::load(&snapshot).unwrap_err();
        assert!(matches!(err, Error::Snapshot { .. }));
    }

    #[test]
    fn test_source_set_cycle_is_rejected() {
        let dir = TempDir::new().unwrap();
        let snapshot = write(
            &dir,
            "snapshot.json",
            r#"{"projects": [{
                "path": ":app",
                "build_file": "app/build.gradle.kts",
                "dependencies": [],
                "source_sets": [
                    {"name": "a", "extends": ["b"], "source_files": 1},
                    {"name": "b", "extends": ["a"], "source_files": 1}
                ]
            }]}"#,
        );
        let err = Workspace::load(&snapshot).unwrap_err();
        assert!(matches!(err, Error::SourceSetCycle { .. }));
    }

    #[test]
    fn test_malformed_snapshot() {
        let dir = TempDir::new().unwrap();
        let snapshot = write(&dir, "snapshot.json", "{\"projects\": 3}");
        assert!(matches!(Workspace::load(&snapshot), Err(Error::Snapshot { .. })));
    }
}
