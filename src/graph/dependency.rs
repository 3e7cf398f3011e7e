use super::names::{ConfigurationName, Role, SourceSetName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gradle project path such as `:lib1` or `:feature:login`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectPath(String);

impl ProjectPath {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        if path.starts_with(':') {
            Self(path)
        } else {
            Self(format!(":{path}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The type-safe accessor Gradle generates for this path:
    /// `:feature:user-profile` -> `projects.feature.userProfile`.
    pub fn typesafe_accessor(&self) -> String {
        let segments: Vec<String> = self
            .0
            .split(':')
            .filter(|segment| !segment.is_empty())
            .map(camel_case_segment)
            .collect();
        format!("projects.{}", segments.join("."))
    }
}

fn camel_case_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut upper_next = false;
    for c in segment.chars() {
        if c == '-' || c == '_' || c == '.' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// `group:name:version` coordinates of an external artifact.
///
/// Version catalog aliases and other non-Maven notations are kept verbatim
/// in `name` with no group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MavenCoordinates {
    pub group: Option<String>,
    pub name: String,
    pub version: Option<String>,
}

impl MavenCoordinates {
    pub fn parse(notation: &str) -> Self {
        let notation = notation.trim();
        let mut parts = notation.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(name), version) if !group.is_empty() && !name.is_empty() => Self {
                group: Some(group.to_string()),
                name: name.to_string(),
                version: version.filter(|v| !v.is_empty()).map(str::to_string),
            },
            _ => Self {
                group: None,
                name: notation.to_string(),
                version: None,
            },
        }
    }

    /// `group:name`, the version-independent identity used for matching.
    pub fn identifier(&self) -> String {
        match &self.group {
            Some(group) => format!("{}:{}", group, self.name),
            None => self.name.clone(),
        }
    }

    pub fn notation(&self) -> String {
        match &self.version {
            Some(version) => format!("{}:{}", self.identifier(), version),
            None => self.identifier(),
        }
    }
}

/// What a dependency declaration points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyTarget {
    Project(ProjectPath),
    External(MavenCoordinates),
}

impl DependencyTarget {
    pub fn project(path: impl Into<String>) -> Self {
        DependencyTarget::Project(ProjectPath::new(path))
    }

    pub fn external(notation: &str) -> Self {
        DependencyTarget::External(MavenCoordinates::parse(notation))
    }

    pub fn project_path(&self) -> Option<&ProjectPath> {
        match self {
            DependencyTarget::Project(path) => Some(path),
            DependencyTarget::External(_) => None,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, DependencyTarget::External(_))
    }

    /// Stable identity for reports and matching: the project path, or
    /// `group:name` for external coordinates.
    pub fn identifier(&self) -> String {
        match self {
            DependencyTarget::Project(path) => path.to_string(),
            DependencyTarget::External(coordinates) => coordinates.identifier(),
        }
    }

    /// Same artifact, ignoring external versions.
    pub fn same_artifact(&self, other: &DependencyTarget) -> bool {
        match (self, other) {
            (DependencyTarget::Project(a), DependencyTarget::Project(b)) => a == b,
            (DependencyTarget::External(a), DependencyTarget::External(b)) => {
                a.identifier() == b.identifier()
            }
            _ => false,
        }
    }
}

impl fmt::Display for DependencyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}

/// One dependency edge declared by a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfiguredDependency {
    pub configuration: ConfigurationName,
    pub target: DependencyTarget,
    #[serde(default)]
    pub test_fixtures: bool,
}

impl ConfiguredDependency {
    pub fn new(configuration: impl Into<ConfigurationName>, target: DependencyTarget) -> Self {
        Self {
            configuration: configuration.into(),
            target,
            test_fixtures: false,
        }
    }

    pub fn with_test_fixtures(mut self, test_fixtures: bool) -> Self {
        self.test_fixtures = test_fixtures;
        self
    }

    pub fn source_set(&self) -> SourceSetName {
        self.configuration.source_set()
    }

    pub fn role(&self) -> Role {
        self.configuration.role()
    }

    /// Same target and variant, regardless of configuration.
    pub fn same_target(&self, other: &ConfiguredDependency) -> bool {
        self.test_fixtures == other.test_fixtures && self.target.same_artifact(&other.target)
    }

    /// Same configuration, target and variant.
    pub fn matches(&self, other: &ConfiguredDependency) -> bool {
        self.configuration == other.configuration && self.same_target(other)
    }

    /// The source set of the target this edge exposes: `testFixtures` for
    /// test-fixture edges, `main` otherwise.
    pub fn target_source_set(&self) -> SourceSetName {
        if self.test_fixtures {
            SourceSetName::test_fixtures()
        } else {
            SourceSetName::main()
        }
    }
}

impl fmt::Display for ConfiguredDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.test_fixtures {
            write!(f, "{}(testFixtures({}))", self.configuration, self.target)
        } else {
            write!(f, "{}({})", self.configuration, self.target)
        }
    }
}
