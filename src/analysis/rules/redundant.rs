//! Redundant Dependency Rule
//!
//! An `api` declaration whose target another direct `api` dependency
//! already exposes, while the declaring source set never uses it.
//!
//! ## Example
//!
//! ```kotlin
//! dependencies {
//!     api(project(":lib1"))
//!     api(project(":lib2"))  // :lib2 declares api(project(":lib1"))
//! }
//! ```

use super::{is_usage_checked, Rule, RuleContext, RulePhase};
use crate::analysis::{Finding, FindingName, FixAction, Usage};
use crate::graph::ConfiguredDependency;

pub struct RedundantDependencyRule;

impl Rule for RedundantDependencyRule {
    fn name(&self) -> FindingName {
        FindingName::RedundantDependency
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Declarations
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let project = ctx.project;
        let mut findings = Vec::new();
        for dependency in &project.dependencies {
            if !dependency.configuration.is_api() || !is_usage_checked(dependency) {
                continue;
            }
            let Some(provider) = provider_of(ctx, dependency) else {
                continue;
            };
            let usage = ctx.usages.usage(
                &project.path,
                &dependency.source_set(),
                &dependency.target,
                dependency.test_fixtures,
            );
            if usage != Usage::NotReferenced {
                continue;
            }
            findings.push(
                ctx.finding(FindingName::RedundantDependency, dependency)
                    .with_source(provider.target.identifier())
                    .with_fix(FixAction::Remove {
                        dependency: dependency.clone(),
                    }),
            );
        }
        findings
    }
}

/// Another direct api declaration that also exposes the target.
fn provider_of(ctx: &RuleContext<'_>, dependency: &ConfiguredDependency) -> Option<ConfiguredDependency> {
    let visible = ctx
        .resolver
        .effective_visible(&ctx.project.path, &dependency.source_set());
    visible
        .iter()
        .filter(|entry| entry.target.same_artifact(&dependency.target) && entry.test_fixtures == dependency.test_fixtures)
        .filter_map(|entry| entry.source.as_ref())
        .find(|source| !source.matches(dependency) && source.configuration.is_api())
        .cloned()
}
