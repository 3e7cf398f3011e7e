//! Finding rules.
//!
//! Each rule looks at one project against an immutable graph state and
//! returns findings. The enabled rules are fixed up front from
//! [`Settings`]; there is no runtime discovery.

mod annotation_processor;
mod inherited;
mod kapt_plugin;
mod must_be_api;
mod overshot;
mod redundant;
mod sort;
mod unused;

pub use annotation_processor::UnusedAnnotationProcessorRule;
pub use inherited::InheritedDependencyRule;
pub use kapt_plugin::UnusedKaptPluginRule;
pub use must_be_api::MustBeApiRule;
pub use overshot::OvershotDependencyRule;
pub use redundant::RedundantDependencyRule;
pub use sort::{SortDependenciesRule, SortPluginsRule};
pub use unused::UnusedDependencyRule;

use super::{Finding, FindingName, UsageAnalyzer};
use crate::config::Settings;
use crate::error::Result;
use crate::graph::{ConfiguredDependency, ModuleGraph, Project};
use crate::parser::BuildFile;
use crate::resolve::Resolver;

/// Rules of one phase see the graph as the previous phase's fixes left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RulePhase {
    /// Declarations that shouldn't exist or have the wrong visibility.
    Declarations,
    /// Declarations that are missing.
    Inheritance,
    /// Block ordering.
    Formatting,
}

impl RulePhase {
    pub const ALL: [RulePhase; 3] = [RulePhase::Declarations, RulePhase::Inheritance, RulePhase::Formatting];
}

/// Everything a rule may look at for one project.
pub struct RuleContext<'a> {
    pub project: &'a Project,
    pub graph: &'a ModuleGraph,
    pub resolver: &'a Resolver<'a>,
    pub usages: &'a UsageAnalyzer<'a>,
    pub settings: &'a Settings,
    /// `None` when the build file couldn't be read.
    pub build_file: Option<&'a BuildFile>,
}

impl<'a> RuleContext<'a> {
    /// A finding about `dependency`, positioned at its declaration.
    pub fn finding(&self, name: FindingName, dependency: &ConfiguredDependency) -> Finding {
        Finding::for_dependency(name, self.project, dependency)
            .with_position(self.build_file.and_then(|f| f.position_of(dependency)))
    }
}

pub trait Rule: Send + Sync {
    fn name(&self) -> FindingName;

    fn phase(&self) -> RulePhase;

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding>;
}

/// The closed set of rules.
pub enum RuleKind {
    Unused(UnusedDependencyRule),
    Overshot(OvershotDependencyRule),
    MustBeApi(MustBeApiRule),
    Inherited(InheritedDependencyRule),
    Redundant(RedundantDependencyRule),
    SortDependencies(SortDependenciesRule),
    SortPlugins(SortPluginsRule),
    UnusedAnnotationProcessor(UnusedAnnotationProcessorRule),
    UnusedKaptPlugin(UnusedKaptPluginRule),
}

impl RuleKind {
    fn rule(&self) -> &dyn Rule {
        match self {
            RuleKind::Unused(rule) => rule,
            RuleKind::Overshot(rule) => rule,
            RuleKind::MustBeApi(rule) => rule,
            RuleKind::Inherited(rule) => rule,
            RuleKind::Redundant(rule) => rule,
            RuleKind::SortDependencies(rule) => rule,
            RuleKind::SortPlugins(rule) => rule,
            RuleKind::UnusedAnnotationProcessor(rule) => rule,
            RuleKind::UnusedKaptPlugin(rule) => rule,
        }
    }
}

impl Rule for RuleKind {
    fn name(&self) -> FindingName {
        self.rule().name()
    }

    fn phase(&self) -> RulePhase {
        self.rule().phase()
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        self.rule().check(ctx)
    }
}

pub struct RuleSet {
    rules: Vec<RuleKind>,
}

impl RuleSet {
    /// The rules enabled in `settings`, in evaluation order.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let checks = &settings.checks;
        let mut rules = Vec::new();
        if checks.must_be_api {
            rules.push(RuleKind::MustBeApi(MustBeApiRule));
        }
        if checks.unused {
            rules.push(RuleKind::Unused(UnusedDependencyRule));
        }
        if checks.overshot {
            rules.push(RuleKind::Overshot(OvershotDependencyRule));
        }
        if checks.redundant {
            rules.push(RuleKind::Redundant(RedundantDependencyRule));
        }
        if checks.unused_annotation_processor {
            rules.push(RuleKind::UnusedAnnotationProcessor(UnusedAnnotationProcessorRule::new(
                settings.code_generators(),
            )));
        }
        if checks.unused_kapt_plugin {
            let processors = checks
                .unused_annotation_processor
                .then(|| UnusedAnnotationProcessorRule::new(settings.code_generators()));
            rules.push(RuleKind::UnusedKaptPlugin(UnusedKaptPluginRule::new(processors)));
        }
        if checks.inherited {
            rules.push(RuleKind::Inherited(InheritedDependencyRule));
        }
        if checks.sort_dependencies {
            rules.push(RuleKind::SortDependencies(SortDependenciesRule::new(
                settings.dependency_ordering()?,
                settings.plugin_ordering()?,
            )));
        }
        if checks.sort_plugins {
            rules.push(RuleKind::SortPlugins(SortPluginsRule::new(
                settings.dependency_ordering()?,
                settings.plugin_ordering()?,
            )));
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[RuleKind] {
        &self.rules
    }

    pub fn in_phase(&self, phase: RulePhase) -> impl Iterator<Item = &RuleKind> {
        self.rules.iter().filter(move |rule| rule.phase() == phase)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule of `phase` against one project.
    pub fn check(&self, phase: RulePhase, ctx: &RuleContext<'_>) -> Vec<Finding> {
        self.in_phase(phase).flat_map(|rule| rule.check(ctx)).collect()
    }
}

/// Declarations rules about usage skip: runtime-only edges and annotation
/// processors have no compile-time references, `Other` buckets are unknown.
pub(crate) fn is_usage_checked(dependency: &ConfiguredDependency) -> bool {
    use crate::graph::ConfigurationKind;
    !matches!(
        dependency.configuration.kind(),
        ConfigurationKind::RuntimeOnly
            | ConfigurationKind::Runtime
            | ConfigurationKind::AnnotationProcessor
            | ConfigurationKind::Kapt
            | ConfigurationKind::Ksp
            | ConfigurationKind::Other
    )
}
