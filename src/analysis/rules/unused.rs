//! Unused Dependency Rule
//!
//! Reports declarations whose target nothing in the declaring source set,
//! or in any source set extending it, references.
//!
//! ## Example
//!
//! ```kotlin
//! dependencies {
//!     implementation(project(":lib1"))  // no source set of this project uses :lib1
//! }
//! ```
//!
//! ## Kept anyway
//!
//! - the oracle can't answer for the declaring side or for the target
//! - the project uses something the target only re-exports through its own
//!   api dependencies
//! - the declaration is api-like and a dependent project uses the target
//!   without declaring it
//!
//! ## Fix
//!
//! The statement is commented out in place, or deleted with `delete_unused`.

use super::{is_usage_checked, Rule, RuleContext, RulePhase};
use crate::analysis::{Finding, FindingName, FixAction, Usage};
use crate::graph::{ConfiguredDependency, DependencyTarget, SourceSetName};
use std::iter;

pub struct UnusedDependencyRule;

impl Rule for UnusedDependencyRule {
    fn name(&self) -> FindingName {
        FindingName::UnusedDependency
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Declarations
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        if ctx.settings.is_ignored_for_unused(&ctx.project.path) {
            return Vec::new();
        }
        ctx.project
            .dependencies
            .iter()
            .filter(|dependency| is_usage_checked(dependency))
            .filter(|dependency| is_unused(ctx, dependency))
            .map(|dependency| {
                ctx.finding(FindingName::UnusedDependency, dependency)
                    .with_fix(FixAction::Remove {
                        dependency: dependency.clone(),
                    })
            })
            .collect()
    }
}

/// Whether `dependency` can go. References from extending source sets
/// count as unused when overshot fixes will redeclare it there, which
/// needs the overshot check on and not suppressed for this declaration.
pub(crate) fn is_unused(ctx: &RuleContext<'_>, dependency: &ConfiguredDependency) -> bool {
    let project = ctx.project;
    let declaring = dependency.source_set();
    let usage = |source_set: &SourceSetName| {
        ctx.usages
            .usage(&project.path, source_set, &dependency.target, dependency.test_fixtures)
    };

    if usage(&declaring) != Usage::NotReferenced {
        return false;
    }
    let downstream = project.downstream_of(&declaring);
    let moves_downstream = ctx.settings.checks.overshot && !overshot_suppressed(ctx, dependency);
    for source_set in &downstream {
        match usage(source_set) {
            Usage::NotReferenced => {}
            Usage::Referenced if moves_downstream => {}
            _ => return false,
        }
    }

    let consumers: Vec<SourceSetName> = iter::once(declaring).chain(downstream).collect();
    !provides_used_api(ctx, dependency, &consumers) && !needed_by_dependents(ctx, dependency)
}

fn overshot_suppressed(ctx: &RuleContext<'_>, dependency: &ConfiguredDependency) -> bool {
    ctx.build_file.is_some_and(|file| {
        file.suppressions_for(dependency)
            .into_iter()
            .any(|name| FindingName::OvershotDependency.matches(name))
    })
}

/// The project uses a target's api dependency that it only sees through
/// this declaration.
fn provides_used_api(ctx: &RuleContext<'_>, dependency: &ConfiguredDependency, consumers: &[SourceSetName]) -> bool {
    if !matches!(dependency.target, DependencyTarget::Project(_)) {
        return false;
    }
    let project = ctx.project;
    let visible = ctx.resolver.effective_visible(&project.path, &dependency.source_set());
    visible
        .iter()
        .filter(|entry| entry.source.as_ref().is_some_and(|source| source.matches(dependency)))
        .any(|entry| {
            consumers.iter().any(|source_set| {
                !project.declares_in_closure(source_set, &entry.target, entry.test_fixtures, Some(dependency))
                    && ctx
                        .usages
                        .usage(&project.path, source_set, &entry.target, entry.test_fixtures)
                        == Usage::Referenced
            })
        })
}

/// A dependent relies on this api declaration for the target.
fn needed_by_dependents(ctx: &RuleContext<'_>, dependency: &ConfiguredDependency) -> bool {
    if !dependency.configuration.is_api() {
        return false;
    }
    ctx.graph
        .dependents_of(&ctx.project.path)
        .into_iter()
        .any(|(dependent, edge)| {
            let edge_source_set = edge.source_set();
            iter::once(edge_source_set.clone())
                .chain(dependent.downstream_of(&edge_source_set))
                .any(|source_set| {
                    !dependent.declares_in_closure(&source_set, &dependency.target, dependency.test_fixtures, None)
                        && ctx.usages.usage(
                            &dependent.path,
                            &source_set,
                            &dependency.target,
                            dependency.test_fixtures,
                        ) == Usage::Referenced
                })
        })
}
