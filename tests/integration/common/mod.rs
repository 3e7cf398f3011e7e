//! Scratch workspaces for integration tests
//!
//! Writes build files into a temp directory and a snapshot describing them,
//! the same way the source scanner would.

#![allow(dead_code)]

use moduleaudit::analysis::{RunOutcome, Runner};
use moduleaudit::config::Settings;
use moduleaudit::discovery::Workspace;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const SNAPSHOT: &str = "moduleaudit-snapshot.json";

pub struct TestWorkspace {
    pub dir: TempDir,
    projects: BTreeMap<String, Map<String, Value>>,
    external_exports: Map<String, Value>,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            projects: BTreeMap::new(),
            external_exports: Map::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// A Kotlin DSL project at `<name>/build.gradle.kts`.
    pub fn project(self, path: &str, build_file: &str) -> Self {
        self.project_with_file(path, "build.gradle.kts", build_file)
    }

    /// A Groovy DSL project at `<name>/build.gradle`.
    pub fn groovy_project(self, path: &str, build_file: &str) -> Self {
        self.project_with_file(path, "build.gradle", build_file)
    }

    fn project_with_file(mut self, path: &str, file_name: &str, text: &str) -> Self {
        let relative = format!("{}/{}", dir_name(path), file_name);
        self.write(&relative, text);
        let mut entry = Map::new();
        entry.insert("path".into(), json!(path));
        entry.insert("build_file".into(), json!(relative));
        self.projects.insert(path.to_string(), entry);
        self
    }

    pub fn platform(self, path: &str, platform: &str) -> Self {
        self.set(path, "platform", json!(platform))
    }

    /// Declarations the snapshot lists explicitly, bypassing the build file.
    pub fn declared(self, path: &str, dependencies: Value) -> Self {
        self.set(path, "dependencies", dependencies)
    }

    pub fn exports(self, path: &str, source_set: &str, symbols: &[&str]) -> Self {
        self.insert_into(path, "exports", source_set, json!(symbols))
    }

    pub fn references(self, path: &str, source_set: &str, symbols: &[&str]) -> Self {
        self.insert_into(path, "references", source_set, json!(symbols))
    }

    pub fn public_references(self, path: &str, source_set: &str, symbols: &[&str]) -> Self {
        let usages: Vec<Value> = symbols
            .iter()
            .map(|s| json!({ "symbol": s, "visibility": "public" }))
            .collect();
        self.insert_into(path, "references", source_set, Value::Array(usages))
    }

    pub fn unavailable(mut self, path: &str, source_set: &str) -> Self {
        let entry = self.projects.get_mut(path).unwrap();
        let list = entry.entry("unavailable").or_insert_with(|| json!([]));
        list.as_array_mut().unwrap().push(json!(source_set));
        self
    }

    pub fn external_exports(mut self, coordinates: &str, symbols: &[&str]) -> Self {
        self.external_exports.insert(coordinates.into(), json!(symbols));
        self
    }

    /// Source files under `<name>/src/<source_set>/kotlin`.
    pub fn sources(self, path: &str, source_set: &str, count: usize) -> Self {
        for i in 0..count {
            self.write(
                &format!("{}/src/{}/kotlin/Source{}.kt", dir_name(path), source_set, i),
                &format!("class Source{i}\n"),
            );
        }
        self
    }

    pub fn write(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, text).unwrap();
        path
    }

    pub fn write_snapshot(&self) -> PathBuf {
        let projects: Vec<Value> = self.projects.values().cloned().map(Value::Object).collect();
        let snapshot = json!({
            "projects": projects,
            "external_exports": Value::Object(self.external_exports.clone()),
        });
        self.write(SNAPSHOT, &serde_json::to_string_pretty(&snapshot).unwrap())
    }

    pub fn load(&self) -> Workspace {
        Workspace::load(&self.write_snapshot()).unwrap()
    }

    pub fn run(&self, settings: &Settings) -> (Workspace, RunOutcome) {
        let mut workspace = self.load();
        let outcome = Runner::new(settings, &workspace.oracle)
            .unwrap()
            .run(&mut workspace.graph)
            .unwrap();
        (workspace, outcome)
    }

    pub fn build_file(&self, path: &str) -> String {
        let dir = self.dir.path().join(dir_name(path));
        let kts = dir.join("build.gradle.kts");
        let file = if kts.exists() { kts } else { dir.join("build.gradle") };
        std::fs::read_to_string(file).unwrap()
    }

    fn set(mut self, path: &str, key: &str, value: Value) -> Self {
        self.projects.get_mut(path).unwrap().insert(key.into(), value);
        self
    }

    fn insert_into(mut self, path: &str, key: &str, source_set: &str, value: Value) -> Self {
        let entry = self.projects.get_mut(path).unwrap();
        let map = entry.entry(key).or_insert_with(|| json!({}));
        map.as_object_mut().unwrap().insert(source_set.into(), value);
        self
    }
}

/// `:feature:login` lives in `feature/login`.
fn dir_name(path: &str) -> String {
    path.trim_start_matches(':').replace(':', "/")
}

pub fn settings() -> Settings {
    Settings::default()
}

pub fn report_only() -> Settings {
    Settings {
        auto_correct: false,
        ..Settings::default()
    }
}
