use super::dependency::{ConfiguredDependency, DependencyTarget, ProjectPath};
use super::names::SourceSetName;
use crate::error::{Error, Result};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::PathBuf;

/// Affects which source sets exist by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformKind {
    #[default]
    Jvm,
    AndroidLibrary,
    AndroidApplication,
    AndroidTest,
}

impl PlatformKind {
    pub fn is_android(&self) -> bool {
        !matches!(self, PlatformKind::Jvm)
    }

    /// Source sets a project of this kind has when nothing else is known,
    /// as `(name, upstream)` pairs.
    pub fn default_source_sets(&self) -> Vec<(&'static str, Vec<&'static str>)> {
        let mut sets = vec![
            ("main", vec![]),
            ("test", vec!["main"]),
            ("testFixtures", vec!["main"]),
        ];
        if self.is_android() {
            sets.extend([
                ("debug", vec!["main"]),
                ("release", vec!["main"]),
                ("androidTest", vec!["main"]),
                ("testDebug", vec!["test", "debug"]),
                ("testRelease", vec!["test", "release"]),
                ("androidTestDebug", vec!["androidTest", "debug"]),
            ]);
        }
        sets
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    pub name: SourceSetName,
    /// Source sets this one extends (`test` extends `main`).
    pub upstream: Vec<SourceSetName>,
    pub source_file_count: usize,
}

impl SourceSet {
    pub fn new(name: impl Into<SourceSetName>) -> Self {
        Self {
            name: name.into(),
            upstream: Vec::new(),
            source_file_count: 0,
        }
    }

    pub fn extending(mut self, upstream: impl IntoIterator<Item = SourceSetName>) -> Self {
        self.upstream = upstream.into_iter().collect();
        self
    }

    pub fn with_source_files(mut self, count: usize) -> Self {
        self.source_file_count = count;
        self
    }

    pub fn has_sources(&self) -> bool {
        self.source_file_count > 0
    }
}

/// A node of the module graph.
#[derive(Debug, Clone)]
pub struct Project {
    pub path: ProjectPath,
    pub platform: PlatformKind,
    pub build_file: PathBuf,
    pub source_sets: BTreeMap<SourceSetName, SourceSet>,
    pub dependencies: Vec<ConfiguredDependency>,
}

impl Project {
    pub fn new(path: impl Into<String>, platform: PlatformKind, build_file: impl Into<PathBuf>) -> Self {
        let mut source_sets = BTreeMap::new();
        for (name, upstream) in platform.default_source_sets() {
            let source_set = SourceSet::new(name)
                .extending(upstream.into_iter().map(SourceSetName::from));
            source_sets.insert(source_set.name.clone(), source_set);
        }
        Self {
            path: ProjectPath::new(path),
            platform,
            build_file: build_file.into(),
            source_sets,
            dependencies: Vec::new(),
        }
    }

    pub fn with_source_set(mut self, source_set: SourceSet) -> Self {
        self.source_sets.insert(source_set.name.clone(), source_set);
        self
    }

    pub fn with_dependency(mut self, dependency: ConfiguredDependency) -> Self {
        self.add_dependency(dependency);
        self
    }

    /// Declarations on a source set this project doesn't know yet create it,
    /// extending `main`.
    pub fn add_dependency(&mut self, dependency: ConfiguredDependency) {
        self.ensure_source_set(&dependency.source_set());
        if !self.dependencies.iter().any(|d| d.matches(&dependency)) {
            self.dependencies.push(dependency);
        }
    }

    pub fn remove_dependency(&mut self, dependency: &ConfiguredDependency) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|d| !d.matches(dependency));
        before != self.dependencies.len()
    }

    fn ensure_source_set(&mut self, name: &SourceSetName) {
        if !self.source_sets.contains_key(name) {
            let upstream = if name.is_main() {
                vec![]
            } else {
                vec![SourceSetName::main()]
            };
            self.source_sets
                .insert(name.clone(), SourceSet::new(name.clone()).extending(upstream));
        }
    }

    pub fn source_set(&self, name: &SourceSetName) -> Option<&SourceSet> {
        self.source_sets.get(name)
    }

    /// `name` followed by every source set it extends, nearest first.
    pub fn source_set_closure(&self, name: &SourceSetName) -> Vec<SourceSetName> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([name.clone()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(source_set) = self.source_sets.get(&current) {
                queue.extend(source_set.upstream.iter().cloned());
            }
            order.push(current);
        }
        order
    }

    /// Source sets that extend `name`, directly or transitively.
    pub fn downstream_of(&self, name: &SourceSetName) -> Vec<SourceSetName> {
        self.source_sets
            .keys()
            .filter(|candidate| *candidate != name)
            .filter(|candidate| self.source_set_closure(candidate).contains(name))
            .cloned()
            .collect()
    }

    /// Every source set, upstream before downstream. Falls back to name order
    /// if the hierarchy is cyclic, which [`Project::validate_source_sets`] reports.
    pub fn source_sets_in_inheritance_order(&self) -> Vec<SourceSetName> {
        let graph = self.hierarchy_graph();
        match toposort(&graph, None) {
            Ok(order) => order.into_iter().map(|idx| graph[idx].clone()).collect(),
            Err(_) => self.source_sets.keys().cloned().collect(),
        }
    }

    /// Edges point from a source set to the ones extending it.
    fn hierarchy_graph(&self) -> DiGraph<SourceSetName, ()> {
        let mut graph = DiGraph::new();
        let mut indices: HashMap<SourceSetName, NodeIndex> = HashMap::new();
        for name in self.source_sets.keys() {
            indices.insert(name.clone(), graph.add_node(name.clone()));
        }
        for source_set in self.source_sets.values() {
            for parent in &source_set.upstream {
                if let (Some(&from), Some(&to)) = (indices.get(parent), indices.get(&source_set.name)) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        graph
    }

    /// The hierarchy must be a DAG rooted at `main`.
    pub fn validate_source_sets(&self) -> Result<()> {
        if let Some(main) = self.source_sets.get(&SourceSetName::main()) {
            if !main.upstream.is_empty() {
                return Err(Error::SourceSetCycle {
                    project: self.path.to_string(),
                    source_set: main.name.to_string(),
                    reason: "main cannot extend another source set".to_string(),
                });
            }
        }
        for source_set in self.source_sets.values() {
            if let Some(missing) = source_set
                .upstream
                .iter()
                .find(|parent| !self.source_sets.contains_key(*parent))
            {
                return Err(Error::SourceSetCycle {
                    project: self.path.to_string(),
                    source_set: source_set.name.to_string(),
                    reason: format!("extends unknown source set `{missing}`"),
                });
            }
        }
        let graph = self.hierarchy_graph();
        if let Err(cycle) = toposort(&graph, None) {
            return Err(Error::SourceSetCycle {
                project: self.path.to_string(),
                source_set: graph[cycle.node_id()].to_string(),
                reason: "extends chain forms a cycle".to_string(),
            });
        }
        Ok(())
    }

    /// Declarations made directly on `source_set` or anything it extends.
    pub fn declarations_visible_in(&self, source_set: &SourceSetName) -> Vec<&ConfiguredDependency> {
        let closure = self.source_set_closure(source_set);
        self.dependencies
            .iter()
            .filter(|d| closure.contains(&d.source_set()))
            .collect()
    }

    /// Declarations made directly on `source_set`.
    pub fn declarations_in(&self, source_set: &SourceSetName) -> Vec<&ConfiguredDependency> {
        self.dependencies
            .iter()
            .filter(|d| &d.source_set() == source_set)
            .collect()
    }

    /// Whether `target` is already declared on `source_set` or upstream,
    /// optionally ignoring one declaration.
    pub fn declares_in_closure(
        &self,
        source_set: &SourceSetName,
        target: &DependencyTarget,
        test_fixtures: bool,
        except: Option<&ConfiguredDependency>,
    ) -> bool {
        self.declarations_visible_in(source_set).into_iter().any(|d| {
            d.test_fixtures == test_fixtures
                && d.target.same_artifact(target)
                && !d.configuration.is_annotation_processor()
                && except.map_or(true, |e| !e.matches(d))
        })
    }
}
