//! Module graph: projects, their source sets and declared dependency edges.
//!
//! The graph is immutable while rules run. Fix application mutates it
//! between rule phases so that later phases see the corrected state.

mod dependency;
mod names;
mod project;

pub use dependency::{ConfiguredDependency, DependencyTarget, MavenCoordinates, ProjectPath};
pub use names::{ConfigurationKind, ConfigurationName, Role, SourceSetName};
pub use project::{PlatformKind, Project, SourceSet};

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    projects: BTreeMap<ProjectPath, Project>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_projects(projects: impl IntoIterator<Item = Project>) -> Result<Self> {
        let mut graph = Self::new();
        for project in projects {
            graph.insert(project)?;
        }
        Ok(graph)
    }

    /// Adds a project after checking its source-set hierarchy.
    pub fn insert(&mut self, project: Project) -> Result<()> {
        project.validate_source_sets()?;
        self.projects.insert(project.path.clone(), project);
        Ok(())
    }

    pub fn project(&self, path: &ProjectPath) -> Option<&Project> {
        self.projects.get(path)
    }

    pub fn project_mut(&mut self, path: &ProjectPath) -> Option<&mut Project> {
        self.projects.get_mut(path)
    }

    pub fn contains(&self, path: &ProjectPath) -> bool {
        self.projects.contains_key(path)
    }

    /// Projects in path order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn add_dependency(&mut self, project: &ProjectPath, dependency: ConfiguredDependency) -> bool {
        match self.projects.get_mut(project) {
            Some(p) => {
                p.add_dependency(dependency);
                true
            }
            None => false,
        }
    }

    pub fn remove_dependency(&mut self, project: &ProjectPath, dependency: &ConfiguredDependency) -> bool {
        self.projects
            .get_mut(project)
            .map(|p| p.remove_dependency(dependency))
            .unwrap_or(false)
    }

    /// Moves an existing declaration to another configuration.
    pub fn reconfigure(
        &mut self,
        project: &ProjectPath,
        dependency: &ConfiguredDependency,
        configuration: ConfigurationName,
    ) -> bool {
        let Some(p) = self.projects.get_mut(project) else {
            return false;
        };
        if !p.remove_dependency(dependency) {
            return false;
        }
        let mut moved = dependency.clone();
        moved.configuration = configuration;
        p.add_dependency(moved);
        true
    }

    /// Every `(dependent, declaration)` pair whose declaration targets `path`.
    pub fn dependents_of(&self, path: &ProjectPath) -> Vec<(&Project, &ConfiguredDependency)> {
        self.projects
            .values()
            .flat_map(|project| {
                project
                    .dependencies
                    .iter()
                    .filter(|d| d.target.project_path() == Some(path))
                    .map(move |d| (project, d))
            })
            .collect()
    }

    /// Project edges whose target isn't part of the graph.
    pub fn inconsistencies(&self) -> Vec<Error> {
        let mut errors = Vec::new();
        for project in self.projects.values() {
            for dependency in &project.dependencies {
                if let Some(target) = dependency.target.project_path() {
                    if !self.projects.contains_key(target) {
                        errors.push(Error::GraphInconsistency {
                            dependent: project.path.to_string(),
                            configuration: dependency.configuration.to_string(),
                            target: target.to_string(),
                        });
                    }
                }
            }
        }
        for error in &errors {
            warn!("{}", error);
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> ModuleGraph {
        ModuleGraph::from_projects([
            Project::new(":lib1", PlatformKind::Jvm, "lib1/build.gradle.kts"),
            Project::new(":lib2", PlatformKind::Jvm, "lib2/build.gradle.kts").with_dependency(
                ConfiguredDependency::new("implementation", DependencyTarget::project(":lib1")),
            ),
            Project::new(":app", PlatformKind::Jvm, "app/build.gradle.kts").with_dependency(
                ConfiguredDependency::new("api", DependencyTarget::project(":missing")),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_dependents_of() {
        let graph = graph();
        let dependents = graph.dependents_of(&ProjectPath::new(":lib1"));
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].0.path.as_str(), ":lib2");
    }

    #[test]
    fn test_reconfigure_moves_declaration() {
        let mut graph = graph();
        let lib2 = ProjectPath::new(":lib2");
        let dep = ConfiguredDependency::new("implementation", DependencyTarget::project(":lib1"));
        assert!(graph.reconfigure(&lib2, &dep, ConfigurationName::api()));
        let project = graph.project(&lib2).unwrap();
        assert_eq!(project.dependencies.len(), 1);
        assert_eq!(project.dependencies[0].configuration.as_str(), "api");
    }

    #[test]
    fn test_inconsistencies_report_unknown_targets() {
        let errors = graph().inconsistencies();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains(":missing"));
    }
}
