//! Unused Kapt Plugin Rule
//!
//! The `kapt` plugin applied to a module that has no `kapt` processor left
//! once unused ones are gone. The plugin adds stub generation to every
//! compilation whether or not a processor runs.
//!
//! ## Example
//!
//! ```kotlin
//! plugins {
//!     kotlin("jvm")
//!     kotlin("kapt")  // no kapt(...) declaration uses it
//! }
//! ```
//!
//! ## Kept anyway
//!
//! - a `kapt` declaration of a generator without a binding
//! - an unused processor whose own finding is suppressed, or whose check
//!   is off
//!
//! ## Fix
//!
//! The plugin statement is commented out in place, or deleted with
//! `delete_unused`.

use super::{Rule, RuleContext, RulePhase, UnusedAnnotationProcessorRule};
use crate::analysis::{Finding, FindingName, FixAction};
use crate::graph::{ConfigurationKind, ConfiguredDependency};
use crate::parser::KOTLIN_PLUGIN_PREFIX;

pub struct UnusedKaptPluginRule {
    /// Present when unused processors are being removed in the same run.
    processors: Option<UnusedAnnotationProcessorRule>,
}

impl UnusedKaptPluginRule {
    pub fn new(processors: Option<UnusedAnnotationProcessorRule>) -> Self {
        Self { processors }
    }

    pub fn plugin_id() -> String {
        format!("{KOTLIN_PLUGIN_PREFIX}kapt")
    }

    /// Whether `dependency` will still be declared after this run.
    fn remains(&self, ctx: &RuleContext<'_>, dependency: &ConfiguredDependency) -> bool {
        let Some(processors) = &self.processors else {
            return true;
        };
        if processors.unused_binding(ctx, dependency).is_none() {
            return true;
        }
        ctx.build_file.is_some_and(|file| {
            file.suppressions_for(dependency)
                .into_iter()
                .any(|name| FindingName::UnusedAnnotationProcessor.matches(name))
        })
    }
}

impl Rule for UnusedKaptPluginRule {
    fn name(&self) -> FindingName {
        FindingName::UnusedKaptPlugin
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Declarations
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let plugin = Self::plugin_id();
        let Some(file) = ctx.build_file else {
            return Vec::new();
        };
        let Some((_, statement)) = file.find_plugin(&plugin).into_iter().next() else {
            return Vec::new();
        };
        let processor_remains = ctx
            .project
            .dependencies
            .iter()
            .filter(|dependency| dependency.configuration.kind() == ConfigurationKind::Kapt)
            .any(|dependency| self.remains(ctx, dependency));
        if processor_remains {
            return Vec::new();
        }

        vec![Finding::for_plugin(FindingName::UnusedKaptPlugin, ctx.project, &plugin)
            .with_position(Some(statement.position))
            .with_fix(FixAction::RemovePlugin { plugin })]
    }
}
