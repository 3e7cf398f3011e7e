use crate::graph::{ConfigurationName, ConfiguredDependency, Project, ProjectPath};
use crate::parser::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Stable identity of a finding kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingName {
    UnusedDependency,
    OvershotDependency,
    MustBeApi,
    InheritedDependency,
    RedundantDependency,
    SortDependencies,
    SortPlugins,
    UnusedAnnotationProcessor,
    UnusedKaptPlugin,
    ProjectDepth,
}

impl FindingName {
    pub const ALL: [FindingName; 10] = [
        FindingName::UnusedDependency,
        FindingName::OvershotDependency,
        FindingName::MustBeApi,
        FindingName::InheritedDependency,
        FindingName::RedundantDependency,
        FindingName::SortDependencies,
        FindingName::SortPlugins,
        FindingName::UnusedAnnotationProcessor,
        FindingName::UnusedKaptPlugin,
        FindingName::ProjectDepth,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            FindingName::UnusedDependency => "unused-dependency",
            FindingName::OvershotDependency => "overshot-dependency",
            FindingName::MustBeApi => "must-be-api",
            FindingName::InheritedDependency => "inherited-dependency",
            FindingName::RedundantDependency => "redundant-dependency",
            FindingName::SortDependencies => "sort-dependencies",
            FindingName::SortPlugins => "sort-plugins",
            FindingName::UnusedAnnotationProcessor => "unused-annotation-processor",
            FindingName::UnusedKaptPlugin => "unused-kapt-plugin",
            FindingName::ProjectDepth => "project-depth",
        }
    }

    /// Names older configurations and suppressions may still use.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            FindingName::UnusedDependency => &["unused", "unusedDependency"],
            FindingName::OvershotDependency => &["overshot", "overshotDependency", "overShot"],
            FindingName::MustBeApi => &["mustBeApi"],
            FindingName::InheritedDependency => &["inherited", "inheritedDependency", "inheritedImplementation"],
            FindingName::RedundantDependency => &["redundant", "redundantDependency"],
            FindingName::SortDependencies => &["unsortedDependencies", "sortDependencies"],
            FindingName::SortPlugins => &["unsortedPlugins", "sortPlugins"],
            FindingName::UnusedAnnotationProcessor => &["unusedKapt", "unusedKaptProcessor"],
            FindingName::UnusedKaptPlugin => &["unusedKaptPlugin"],
            FindingName::ProjectDepth => &["depth", "depths"],
        }
    }

    /// True when `name` is this finding's id or one of its aliases, ignoring
    /// case and `-`, `_` or space separators.
    pub fn matches(&self, name: &str) -> bool {
        let wanted = normalize(name);
        normalize(self.id()) == wanted || self.aliases().iter().any(|alias| normalize(alias) == wanted)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|finding| finding.matches(name))
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            FindingName::ProjectDepth => Severity::Info,
            FindingName::SortDependencies | FindingName::SortPlugins => Severity::Info,
            _ => Severity::Warning,
        }
    }

    /// Findings that describe the graph rather than a defect.
    pub fn is_report_only(&self) -> bool {
        matches!(self, FindingName::ProjectDepth)
    }

    pub fn code(&self) -> &'static str {
        match self {
            FindingName::UnusedDependency => "MA001",
            FindingName::OvershotDependency => "MA002",
            FindingName::MustBeApi => "MA003",
            FindingName::InheritedDependency => "MA004",
            FindingName::RedundantDependency => "MA005",
            FindingName::SortDependencies => "MA006",
            FindingName::SortPlugins => "MA007",
            FindingName::UnusedAnnotationProcessor => "MA008",
            FindingName::ProjectDepth => "MA009",
            FindingName::UnusedKaptPlugin => "MA010",
        }
    }

    pub fn default_message(&self, dependency: Option<&ConfiguredDependency>) -> String {
        let subject = dependency.map(|d| d.target.identifier()).unwrap_or_default();
        match self {
            FindingName::UnusedDependency => {
                format!("The declared dependency '{subject}' is not used in this module.")
            }
            FindingName::OvershotDependency => format!(
                "The dependency '{subject}' is not used in the configuration it is declared in, \
                 but it is used in a more specific one."
            ),
            FindingName::MustBeApi => format!(
                "The dependency '{subject}' is declared as an implementation dependency, \
                 but its types are exposed in this module's public API."
            ),
            FindingName::InheritedDependency => format!(
                "Transitive dependency '{subject}' is used directly but is only available \
                 through another dependency."
            ),
            FindingName::RedundantDependency => format!(
                "The dependency '{subject}' is already provided by another api dependency."
            ),
            FindingName::SortDependencies => {
                "Project/external dependency declarations are not sorted according to the defined pattern."
                    .to_string()
            }
            FindingName::SortPlugins => {
                "Plugin declarations are not sorted according to the defined pattern.".to_string()
            }
            FindingName::UnusedAnnotationProcessor => format!(
                "The annotation processor '{subject}' is declared but none of its annotations are used."
            ),
            FindingName::UnusedKaptPlugin => {
                "The `kapt` plugin is applied, but this module has no annotation processor left for it to run."
                    .to_string()
            }
            FindingName::ProjectDepth => "The dependency depth of this source set.".to_string(),
        }
    }
}

impl fmt::Display for FindingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The mechanical change that resolves a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum FixAction {
    /// Delete or comment out a declaration.
    Remove { dependency: ConfiguredDependency },
    /// Declare a dependency. `anchor` is the declaration whose formatting
    /// the new statement copies.
    Add {
        dependency: ConfiguredDependency,
        anchor: Option<ConfiguredDependency>,
    },
    /// Swap the configuration of a declaration in place.
    Retarget {
        dependency: ConfiguredDependency,
        configuration: ConfigurationName,
    },
    SortDependencies,
    SortPlugins,
    /// Delete or comment out the `plugins { }` statement applying the
    /// plugin with this canonical id.
    RemovePlugin { plugin: String },
}

impl FixAction {
    /// Additions first, then in-place modifications, then removals.
    pub fn group_rank(&self) -> u8 {
        match self {
            FixAction::Add { .. } => 0,
            FixAction::Retarget { .. } | FixAction::SortDependencies | FixAction::SortPlugins => 1,
            FixAction::Remove { .. } | FixAction::RemovePlugin { .. } => 2,
        }
    }

    /// The declaration whose statement carries suppressions for this fix.
    pub fn subject(&self) -> Option<&ConfiguredDependency> {
        match self {
            FixAction::Remove { dependency } | FixAction::Retarget { dependency, .. } => Some(dependency),
            FixAction::Add { anchor, .. } => anchor.as_ref(),
            FixAction::SortDependencies | FixAction::SortPlugins | FixAction::RemovePlugin { .. } => None,
        }
    }

    pub fn identifier(&self) -> String {
        match self {
            FixAction::Remove { dependency }
            | FixAction::Add { dependency, .. }
            | FixAction::Retarget { dependency, .. } => dependency.target.identifier(),
            FixAction::RemovePlugin { plugin } => plugin.clone(),
            FixAction::SortDependencies | FixAction::SortPlugins => String::new(),
        }
    }
}

/// One detected correctness issue.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub name: FindingName,
    pub severity: Severity,
    pub project: ProjectPath,
    pub build_file: PathBuf,
    /// Configuration of the offending (or proposed) declaration.
    pub configuration: Option<ConfigurationName>,
    pub dependency: Option<ConfiguredDependency>,
    /// Project path or `group:name` of the dependency, empty for
    /// block-level findings.
    pub dependency_identifier: String,
    /// Evidence, e.g. the dependency an inherited target came through.
    pub source: Option<String>,
    pub position: Option<Position>,
    pub message: String,
    pub fix: Option<FixAction>,
    pub fixed: bool,
}

impl Finding {
    pub fn new(name: FindingName, project: &Project) -> Self {
        Self {
            name,
            severity: name.default_severity(),
            project: project.path.clone(),
            build_file: project.build_file.clone(),
            configuration: None,
            dependency: None,
            dependency_identifier: String::new(),
            source: None,
            position: None,
            message: name.default_message(None),
            fix: None,
            fixed: false,
        }
    }

    pub fn for_dependency(name: FindingName, project: &Project, dependency: &ConfiguredDependency) -> Self {
        Self {
            configuration: Some(dependency.configuration.clone()),
            dependency: Some(dependency.clone()),
            dependency_identifier: dependency.target.identifier(),
            message: name.default_message(Some(dependency)),
            ..Self::new(name, project)
        }
    }

    /// A finding about an applied plugin rather than a declaration.
    pub fn for_plugin(name: FindingName, project: &Project, plugin: &str) -> Self {
        Self {
            dependency_identifier: plugin.to_string(),
            ..Self::new(name, project)
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    pub fn with_fix(mut self, fix: FixAction) -> Self {
        self.fix = Some(fix);
        self
    }

    pub fn is_report_only(&self) -> bool {
        self.name.is_report_only()
    }

    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }

    /// Whether any of `names` suppresses this finding.
    pub fn is_suppressed_by<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        names.into_iter().any(|name| self.name.matches(name))
    }
}
