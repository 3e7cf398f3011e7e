//! Project depth: the longest chain of project dependencies below a source set.
//!
//! `main` depths come from the project graph of `main` declarations. Other
//! source sets reuse their targets' `main` depth. Cyclic project graphs are
//! collapsed with Tarjan's SCC algorithm; edges inside one component don't
//! add depth.

use super::{Finding, FindingName};
use crate::graph::{DependencyTarget, ModuleGraph, Project, ProjectPath, SourceSetName};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDepth {
    pub project: ProjectPath,
    pub source_set: SourceSetName,
    pub depth: usize,
    /// Direct project targets that reach `depth - 1`.
    pub most_expensive: Vec<ProjectPath>,
}

impl ProjectDepth {
    pub fn to_finding(&self, project: &Project) -> Finding {
        let message = if self.most_expensive.is_empty() {
            format!("The `{}` source set has depth {}.", self.source_set, self.depth)
        } else {
            let via: Vec<&str> = self.most_expensive.iter().map(ProjectPath::as_str).collect();
            format!(
                "The `{}` source set has depth {} (most expensive: {}).",
                self.source_set,
                self.depth,
                via.join(", ")
            )
        };
        let mut finding = Finding::new(FindingName::ProjectDepth, project).with_message(message);
        finding.dependency_identifier = self.depth.to_string();
        finding
    }
}

/// Depths for one graph state. Build it after fixes are applied.
pub struct DepthCalculator<'g> {
    graph: &'g ModuleGraph,
    main: HashMap<ProjectPath, ProjectDepth>,
}

impl<'g> DepthCalculator<'g> {
    pub fn new(graph: &'g ModuleGraph) -> Self {
        Self {
            graph,
            main: main_depths(graph),
        }
    }

    /// Depth of `source_set` in `project`. `None` for unknown projects.
    pub fn depth(&self, project: &ProjectPath, source_set: &SourceSetName) -> Option<ProjectDepth> {
        if source_set.is_main() {
            return self.main.get(project).cloned();
        }
        let project = self.graph.project(project)?;
        let targets = direct_project_targets(self.graph, project, source_set);
        Some(depth_from(
            &project.path,
            source_set,
            &targets,
            |target| self.main.get(target).map(|d| d.depth),
            |_| false,
        ))
    }

    /// Every source set with sources, in project then source-set order.
    pub fn report(&self) -> Vec<ProjectDepth> {
        let mut depths = Vec::new();
        for project in self.graph.projects() {
            for source_set in project.source_sets.values().filter(|s| s.has_sources()) {
                if let Some(depth) = self.depth(&project.path, &source_set.name) {
                    depths.push(depth);
                }
            }
        }
        debug!("Computed {} source set depths", depths.len());
        depths
    }

    /// `main` depths by depth value, for the summary table.
    pub fn modules_by_depth(depths: &[ProjectDepth]) -> BTreeMap<usize, Vec<ProjectPath>> {
        let mut by_depth: BTreeMap<usize, Vec<ProjectPath>> = BTreeMap::new();
        for depth in depths.iter().filter(|d| d.source_set.is_main()) {
            by_depth.entry(depth.depth).or_default().push(depth.project.clone());
        }
        by_depth
    }
}

/// Project targets declared on `source_set` or anything it extends, in
/// declaration order. Targets outside the graph are skipped.
fn direct_project_targets(graph: &ModuleGraph, project: &Project, source_set: &SourceSetName) -> Vec<ProjectPath> {
    let mut targets: Vec<ProjectPath> = Vec::new();
    for dependency in project.declarations_visible_in(source_set) {
        if dependency.configuration.is_annotation_processor() {
            continue;
        }
        if let DependencyTarget::Project(path) = &dependency.target {
            if path != &project.path && graph.contains(path) && !targets.contains(path) {
                targets.push(path.clone());
            }
        }
    }
    targets
}

fn depth_from(
    project: &ProjectPath,
    source_set: &SourceSetName,
    targets: &[ProjectPath],
    main_depth: impl Fn(&ProjectPath) -> Option<usize>,
    same_component: impl Fn(&ProjectPath) -> bool,
) -> ProjectDepth {
    if targets.is_empty() {
        return ProjectDepth {
            project: project.clone(),
            source_set: source_set.clone(),
            depth: 0,
            most_expensive: Vec::new(),
        };
    }
    let scored: Vec<(&ProjectPath, usize)> = targets
        .iter()
        .filter(|target| !same_component(target))
        .filter_map(|target| main_depth(target).map(|depth| (target, depth)))
        .collect();
    let max = scored.iter().map(|(_, depth)| *depth).max().unwrap_or(0);
    let mut most_expensive: Vec<ProjectPath> = scored
        .into_iter()
        .filter(|(_, depth)| *depth == max)
        .map(|(target, _)| target.clone())
        .collect();
    most_expensive.sort();
    ProjectDepth {
        project: project.clone(),
        source_set: source_set.clone(),
        depth: max + 1,
        most_expensive,
    }
}

fn main_depths(graph: &ModuleGraph) -> HashMap<ProjectPath, ProjectDepth> {
    let main = SourceSetName::main();
    let mut dag: DiGraph<ProjectPath, ()> = DiGraph::new();
    let mut indices: HashMap<ProjectPath, NodeIndex> = HashMap::new();
    for project in graph.projects() {
        indices.insert(project.path.clone(), dag.add_node(project.path.clone()));
    }
    let mut targets: HashMap<ProjectPath, Vec<ProjectPath>> = HashMap::new();
    for project in graph.projects() {
        let direct = direct_project_targets(graph, project, &main);
        for target in &direct {
            if let (Some(&from), Some(&to)) = (indices.get(&project.path), indices.get(target)) {
                dag.add_edge(from, to, ());
            }
        }
        targets.insert(project.path.clone(), direct);
    }

    // Components come out dependencies-first.
    let components = tarjan_scc(&dag);
    let mut component_of: HashMap<ProjectPath, usize> = HashMap::new();
    for (id, component) in components.iter().enumerate() {
        for index in component {
            component_of.insert(dag[*index].clone(), id);
        }
    }

    let mut depths: HashMap<ProjectPath, ProjectDepth> = HashMap::new();
    for component in &components {
        for index in component {
            let path = &dag[*index];
            let own = component_of.get(path).copied();
            let direct = targets.get(path).map(Vec::as_slice).unwrap_or(&[]);
            let depth = depth_from(
                path,
                &main,
                direct,
                |target| depths.get(target).map(|d| d.depth),
                |target| component_of.get(target).copied() == own,
            );
            depths.insert(path.clone(), depth);
        }
    }
    depths
}
