//! Must Be Api Rule
//!
//! An `implementation` declaration whose target's types appear in the
//! declaring project's public API. Consumers then fail to compile against
//! that API unless they happen to declare the target themselves.
//!
//! ## Example
//!
//! ```kotlin
//! // :lib2
//! dependencies {
//!     implementation(project(":lib1"))
//! }
//! // class Lib2Class : Lib1Class()
//! ```
//!
//! ## Fix
//!
//! The configuration is swapped for its api variant in place:
//! `implementation` becomes `api`, `debugImplementation` becomes `debugApi`.
//! Test-only source sets publish nothing and are skipped.

use super::{Rule, RuleContext, RulePhase};
use crate::analysis::{Finding, FindingName, FixAction, Usage};
use crate::graph::{ConfigurationKind, ConfiguredDependency};

pub struct MustBeApiRule;

impl Rule for MustBeApiRule {
    fn name(&self) -> FindingName {
        FindingName::MustBeApi
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Declarations
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let project = ctx.project;
        project
            .dependencies
            .iter()
            .filter(|dependency| dependency.configuration.kind() == ConfigurationKind::Implementation)
            .filter(|dependency| !dependency.source_set().is_testing_only())
            .filter(|dependency| !has_api_declaration(ctx, dependency))
            .filter(|dependency| {
                ctx.usages.public_usage(
                    &project.path,
                    &dependency.source_set(),
                    &dependency.target,
                    dependency.test_fixtures,
                ) == Usage::Referenced
            })
            .map(|dependency| {
                ctx.finding(FindingName::MustBeApi, dependency)
                    .with_fix(FixAction::Retarget {
                        dependency: dependency.clone(),
                        configuration: dependency.configuration.api_variant(),
                    })
            })
            .collect()
    }
}

fn has_api_declaration(ctx: &RuleContext<'_>, dependency: &ConfiguredDependency) -> bool {
    let api = dependency.configuration.api_variant();
    ctx.project
        .dependencies
        .iter()
        .any(|other| other.configuration == api && other.same_target(dependency))
}
