//! Inherited Dependency Rule
//!
//! A target the project uses directly but only sees through another
//! project's `api` declaration. The project compiles today, and breaks as
//! soon as the other project stops exposing it.
//!
//! ## Example
//!
//! ```kotlin
//! // :lib2 declares api(project(":lib1"))
//! // :app
//! dependencies {
//!     implementation(project(":lib2"))  // :app also uses Lib1Class
//! }
//! ```
//!
//! ## Fix
//!
//! `implementation(project(":lib1"))` is added next to the declaration it
//! was inherited through. The configuration is api-like when the project
//! exposes the target publicly.

use super::{Rule, RuleContext, RulePhase};
use crate::analysis::{Finding, FindingName, FixAction, Usage};
use crate::graph::{ConfigurationKind, ConfigurationName, ConfiguredDependency, DependencyTarget, SourceSetName};

pub struct InheritedDependencyRule;

impl Rule for InheritedDependencyRule {
    fn name(&self) -> FindingName {
        FindingName::InheritedDependency
    }

    fn phase(&self) -> RulePhase {
        RulePhase::Inheritance
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let project = ctx.project;
        let mut reported: Vec<(SourceSetName, DependencyTarget, bool)> = Vec::new();
        let mut findings = Vec::new();

        for source_set in project.source_sets_in_inheritance_order() {
            let closure = project.source_set_closure(&source_set);
            let visible = ctx.resolver.effective_visible(&project.path, &source_set);

            for entry in visible.iter() {
                let Some(source) = &entry.source else {
                    continue;
                };
                if project.declares_in_closure(&source_set, &entry.target, entry.test_fixtures, None) {
                    continue;
                }
                let already_reported = reported.iter().any(|(reported_in, target, test_fixtures)| {
                    closure.contains(reported_in)
                        && target.same_artifact(&entry.target)
                        && *test_fixtures == entry.test_fixtures
                });
                if already_reported {
                    continue;
                }
                let usage = ctx
                    .usages
                    .usage(&project.path, &source_set, &entry.target, entry.test_fixtures);
                if usage != Usage::Referenced {
                    continue;
                }

                let added = ConfiguredDependency::new(
                    configuration_for(ctx, &source_set, &entry.target, entry.test_fixtures),
                    entry.target.clone(),
                )
                .with_test_fixtures(entry.test_fixtures);

                findings.push(
                    Finding::for_dependency(FindingName::InheritedDependency, project, &added)
                        .with_source(source.target.identifier())
                        .with_position(ctx.build_file.and_then(|f| f.position_of(source)))
                        .with_fix(FixAction::Add {
                            dependency: added.clone(),
                            anchor: Some(source.clone()),
                        }),
                );
                reported.push((source_set.clone(), entry.target.clone(), entry.test_fixtures));
            }
        }
        findings
    }
}

fn configuration_for(
    ctx: &RuleContext<'_>,
    source_set: &SourceSetName,
    target: &DependencyTarget,
    test_fixtures: bool,
) -> ConfigurationName {
    let exposed = !source_set.is_testing_only()
        && ctx
            .usages
            .public_usage(&ctx.project.path, source_set, target, test_fixtures)
            == Usage::Referenced;
    let kind = if exposed {
        ConfigurationKind::Api
    } else {
        ConfigurationKind::Implementation
    };
    ConfigurationName::for_source_set(source_set, kind)
}
