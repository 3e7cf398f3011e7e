//! Visibility & inheritance resolution.
//!
//! ## Traversal
//!
//! 1. Collect the direct declarations of a source set and of every source
//!    set it extends.
//! 2. Each declaration contributes its own target.
//! 3. Project targets additionally contribute their api-like declarations
//!    of `main` (or `testFixtures` for test-fixture edges), recursively,
//!    tagged with the direct dependency they came through.
//!
//! A visited set keyed by `(project, source set)` ends each branch, so
//! cyclic project graphs terminate without special handling.
//!
//! Edges registered with [`Resolver::with_promoted`] propagate as if they
//! were already api-like. The runner registers the `implementation` edges
//! must-be-api retargets, so other rules judge the same run against the
//! corrected visibility.

use crate::graph::{
    ConfigurationName, ConfiguredDependency, DependencyTarget, ModuleGraph, ProjectPath, Role,
    SourceSetName,
};
use dashmap::DashMap;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::warn;

/// One entry of a project's effective dependency set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisibleDependency {
    pub target: DependencyTarget,
    pub test_fixtures: bool,
    /// Configuration of the declaration that made the target visible: the
    /// origin's own declaration, or the api-like one further down the chain.
    pub configuration: ConfigurationName,
    pub via_api: bool,
    /// The direct dependency of the origin this entry was inherited through.
    /// `None` for the origin's own declarations.
    pub source: Option<ConfiguredDependency>,
}

impl VisibleDependency {
    pub fn is_inherited(&self) -> bool {
        self.source.is_some()
    }

    pub fn source_path(&self) -> Option<&ProjectPath> {
        self.source.as_ref().and_then(|s| s.target.project_path())
    }
}

pub type VisibleSet = Arc<Vec<VisibleDependency>>;

/// Computes and caches effective visible sets for one graph state.
///
/// Build a new resolver whenever the graph changes.
pub struct Resolver<'g> {
    graph: &'g ModuleGraph,
    cache: DashMap<(ProjectPath, SourceSetName), VisibleSet>,
    promoted: HashMap<ProjectPath, Vec<ConfiguredDependency>>,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g ModuleGraph) -> Self {
        Self {
            graph,
            cache: DashMap::new(),
            promoted: HashMap::new(),
        }
    }

    /// Treats each `(project, declaration)` edge as api-like.
    pub fn with_promoted(mut self, edges: impl IntoIterator<Item = (ProjectPath, ConfiguredDependency)>) -> Self {
        for (project, dependency) in edges {
            self.promoted.entry(project).or_default().push(dependency);
        }
        self.cache.clear();
        self
    }

    fn is_promoted(&self, project: &ProjectPath, dependency: &ConfiguredDependency) -> bool {
        self.promoted
            .get(project)
            .is_some_and(|edges| edges.iter().any(|edge| edge.matches(dependency)))
    }

    fn is_api_like(&self, project: &ProjectPath, dependency: &ConfiguredDependency) -> bool {
        dependency.role() == Role::ApiLike || self.is_promoted(project, dependency)
    }

    pub fn graph(&self) -> &'g ModuleGraph {
        self.graph
    }

    pub fn effective_visible(&self, project: &ProjectPath, source_set: &SourceSetName) -> VisibleSet {
        let key = (project.clone(), source_set.clone());
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(&hit);
        }
        let computed = Arc::new(self.compute(project, source_set));
        self.cache.entry(key).or_insert(computed).clone()
    }

    fn compute(&self, origin: &ProjectPath, source_set: &SourceSetName) -> Vec<VisibleDependency> {
        let Some(project) = self.graph.project(origin) else {
            return Vec::new();
        };

        let mut visible = Vec::new();
        let mut seen_entries = HashSet::new();
        let mut push = |entry: VisibleDependency, visible: &mut Vec<VisibleDependency>| {
            if entry.target.project_path() == Some(origin) {
                return;
            }
            if seen_entries.insert(entry.clone()) {
                visible.push(entry);
            }
        };

        for declared in project.declarations_visible_in(source_set) {
            if declared.configuration.is_annotation_processor() {
                continue;
            }
            push(
                VisibleDependency {
                    target: declared.target.clone(),
                    test_fixtures: declared.test_fixtures,
                    configuration: declared.configuration.clone(),
                    via_api: self.is_api_like(origin, declared),
                    source: None,
                },
                &mut visible,
            );

            let DependencyTarget::Project(target) = &declared.target else {
                continue;
            };

            let mut visited = HashSet::new();
            let mut queue = VecDeque::from([(target.clone(), declared.target_source_set())]);
            while let Some((current, current_source_set)) = queue.pop_front() {
                if !visited.insert((current.clone(), current_source_set.clone())) {
                    continue;
                }
                let Some(current_project) = self.graph.project(&current) else {
                    warn!(
                        "{} declares {} which is not part of the graph; skipping",
                        project.path, current
                    );
                    continue;
                };
                for transitive in current_project.declarations_visible_in(&current_source_set) {
                    let configuration = if transitive.role() == Role::ApiLike {
                        transitive.configuration.clone()
                    } else if self.is_promoted(&current, transitive) {
                        transitive.configuration.api_variant()
                    } else {
                        continue;
                    };
                    push(
                        VisibleDependency {
                            target: transitive.target.clone(),
                            test_fixtures: transitive.test_fixtures,
                            configuration,
                            via_api: true,
                            source: Some(declared.clone()),
                        },
                        &mut visible,
                    );
                    if let DependencyTarget::Project(next) = &transitive.target {
                        queue.push_back((next.clone(), transitive.target_source_set()));
                    }
                }
            }
        }

        visible
    }
}
