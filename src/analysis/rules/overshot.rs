//! Overshot Dependency Rule
//!
//! A declaration whose declaring source set doesn't use the target, while a
//! more specific source set does. The declaration is moved there.
//!
//! ## Example
//!
//! ```kotlin
//! dependencies {
//!     testImplementation(project(":lib1"))  // only `debug` sources use :lib1
//! }
//! ```
//!
//! ## Fix
//!
//! `debugImplementation(project(":lib1"))` is added next to the original,
//! copying its style. Removing the original is left to the unused rule.

use super::unused::is_unused;
use super::{is_usage_checked, Rule, RuleContext, RulePhase};
use crate::analysis::{Finding, FindingName, FixAction, Usage};
use crate::graph::{ConfigurationKind, ConfiguredDependency, SourceSetName};

pub struct OvershotDependencyRule;

impl Rule for OvershotDependencyRule {
    fn name(&self) -> FindingName {
        FindingName::OvershotDependency
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Declarations
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        if ctx.settings.is_ignored_for_unused(&ctx.project.path) {
            return Vec::new();
        }
        let mut findings = Vec::new();
        for dependency in &ctx.project.dependencies {
            if !is_usage_checked(dependency) || !is_unused(ctx, dependency) {
                continue;
            }
            for source_set in using_source_sets(ctx, dependency) {
                let moved = moved_dependency(ctx, dependency, &source_set);
                let message = format!(
                    "The dependency '{}' is not used in `{}`, but it is used in `{}`. Declare it as `{}` instead.",
                    dependency.target.identifier(),
                    dependency.configuration,
                    source_set,
                    moved.configuration,
                );
                findings.push(
                    Finding::for_dependency(FindingName::OvershotDependency, ctx.project, &moved)
                        .with_message(message)
                        .with_position(ctx.build_file.and_then(|f| f.position_of(dependency)))
                        .with_fix(FixAction::Add {
                            dependency: moved,
                            anchor: Some(dependency.clone()),
                        }),
                );
            }
        }
        findings
    }
}

/// Source sets that reference the target without already seeing another
/// declaration of it. Only the top-most ones are kept, since everything
/// extending them inherits the new declaration.
fn using_source_sets(ctx: &RuleContext<'_>, dependency: &ConfiguredDependency) -> Vec<SourceSetName> {
    let project = ctx.project;
    let declaring = dependency.source_set();
    let candidates: Vec<SourceSetName> = project
        .source_sets
        .keys()
        .filter(|source_set| **source_set != declaring)
        .filter(|source_set| {
            !project.declares_in_closure(source_set, &dependency.target, dependency.test_fixtures, Some(dependency))
        })
        .filter(|source_set| {
            ctx.usages
                .usage(&project.path, source_set, &dependency.target, dependency.test_fixtures)
                == Usage::Referenced
        })
        .cloned()
        .collect();

    candidates
        .iter()
        .filter(|candidate| {
            !project
                .source_set_closure(candidate)
                .iter()
                .skip(1)
                .any(|upstream| candidates.contains(upstream))
        })
        .cloned()
        .collect()
}

fn moved_dependency(
    ctx: &RuleContext<'_>,
    dependency: &ConfiguredDependency,
    source_set: &SourceSetName,
) -> ConfiguredDependency {
    let mut configuration = dependency.configuration.switch_source_set(source_set);
    if configuration.kind() == ConfigurationKind::Api {
        let exposed = !source_set.is_testing_only()
            && ctx.usages.public_usage(
                &ctx.project.path,
                source_set,
                &dependency.target,
                dependency.test_fixtures,
            ) == Usage::Referenced;
        configuration = if exposed {
            configuration.api_variant()
        } else {
            configuration.implementation_variant()
        };
    }
    let mut moved = dependency.clone();
    moved.configuration = configuration;
    moved
}
