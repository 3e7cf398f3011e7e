//! Run settings.
//!
//! Loaded from `moduleaudit.toml`, `.moduleaudit.toml`, `moduleaudit.yml`
//! or `moduleaudit.yaml` in the workspace root, or from an explicit path.
//!
//! ```toml
//! # moduleaudit.toml
//! auto_correct = true
//! delete_unused = false
//! ignore_unused_finding = [":app"]
//! do_not_check = [":benchmarks"]
//!
//! [checks]
//! redundant = true
//! sort_dependencies = true
//!
//! [sort]
//! dependency_comparators = ["api.*", "implementation.*"]
//!
//! [[additional_code_generators]]
//! name = "Custom processor"
//! generator_coordinates = "com.example:processor"
//! annotations = ["com.example.Generate"]
//!
//! [reports]
//! json = "build/moduleaudit/report.json"
//! depths = "build/moduleaudit/depths.txt"
//! ```

mod generators;

pub use generators::{default_code_generators, CodeGeneratorBinding};

use crate::error::{Error, Result};
use crate::graph::ProjectPath;
use crate::refactor::{DependencyOrdering, FixOptions, PluginOrdering};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_LOCATIONS: [&str; 4] = [
    "moduleaudit.toml",
    ".moduleaudit.toml",
    "moduleaudit.yml",
    "moduleaudit.yaml",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Apply fixes to build files.
    pub auto_correct: bool,
    /// Delete removed declarations instead of commenting them out.
    pub delete_unused: bool,
    /// Fail the run when any project fails.
    pub strict: bool,
    /// Projects whose dependencies are never reported unused.
    pub ignore_unused_finding: Vec<String>,
    /// Projects skipped by every check.
    pub do_not_check: Vec<String>,
    pub checks: ChecksSettings,
    pub sort: SortSettings,
    pub additional_code_generators: Vec<CodeGeneratorBinding>,
    pub reports: ReportsSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_correct: true,
            delete_unused: false,
            strict: false,
            ignore_unused_finding: Vec::new(),
            do_not_check: Vec::new(),
            checks: ChecksSettings::default(),
            sort: SortSettings::default(),
            additional_code_generators: Vec::new(),
            reports: ReportsSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksSettings {
    pub unused: bool,
    pub overshot: bool,
    pub must_be_api: bool,
    pub inherited: bool,
    pub redundant: bool,
    pub sort_dependencies: bool,
    pub sort_plugins: bool,
    pub unused_annotation_processor: bool,
    pub unused_kapt_plugin: bool,
    pub depths: bool,
}

impl Default for ChecksSettings {
    fn default() -> Self {
        Self {
            unused: true,
            overshot: true,
            must_be_api: true,
            inherited: true,
            redundant: false,
            sort_dependencies: false,
            sort_plugins: false,
            unused_annotation_processor: true,
            unused_kapt_plugin: true,
            depths: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSettings {
    /// Plugin ordering, first match wins.
    pub plugin_comparators: Vec<String>,
    /// Dependency ordering; empty means the built-in category order.
    pub dependency_comparators: Vec<String>,
}

impl Default for SortSettings {
    fn default() -> Self {
        Self {
            plugin_comparators: PluginOrdering::DEFAULT_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            dependency_comparators: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsSettings {
    pub json: Option<PathBuf>,
    pub depths: Option<PathBuf>,
}

impl Settings {
    /// Loads settings by extension: `.toml`, `.yml`/`.yaml` or `.json`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        let settings: Settings = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content).map_err(|e| config_error(path, e))?,
            "json" => serde_json::from_str(&content).map_err(|e| config_error(path, e))?,
            _ => toml::from_str(&content).map_err(|e| config_error(path, e))?,
        };
        settings.validate()?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// The first settings file found in `root`, or the defaults.
    pub fn from_default_locations(root: &Path) -> Result<Self> {
        for name in DEFAULT_LOCATIONS {
            let candidate = root.join(name);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }
        Ok(Self::default())
    }

    /// Comparator patterns must compile.
    pub fn validate(&self) -> Result<()> {
        self.dependency_ordering()?;
        self.plugin_ordering()?;
        Ok(())
    }

    pub fn dependency_ordering(&self) -> Result<DependencyOrdering> {
        DependencyOrdering::new(&self.sort.dependency_comparators)
    }

    pub fn plugin_ordering(&self) -> Result<PluginOrdering> {
        PluginOrdering::new(&self.sort.plugin_comparators)
    }

    pub fn fix_options(&self) -> Result<FixOptions> {
        Ok(FixOptions {
            delete_unused: self.delete_unused,
            dependency_ordering: self.dependency_ordering()?,
            plugin_ordering: self.plugin_ordering()?,
        })
    }

    pub fn is_ignored_for_unused(&self, project: &ProjectPath) -> bool {
        contains_path(&self.ignore_unused_finding, project)
    }

    pub fn is_excluded(&self, project: &ProjectPath) -> bool {
        contains_path(&self.do_not_check, project)
    }

    /// Built-in bindings followed by the configured ones.
    pub fn code_generators(&self) -> Vec<CodeGeneratorBinding> {
        let mut bindings = default_code_generators();
        bindings.extend(self.additional_code_generators.iter().cloned());
        bindings
    }
}

fn contains_path(paths: &[String], project: &ProjectPath) -> bool {
    paths.iter().any(|p| ProjectPath::new(p.as_str()) == *project)
}

fn config_error(path: &Path, error: impl std::fmt::Display) -> Error {
    Error::Config(format!("{}: {}", path.display(), error))
}
